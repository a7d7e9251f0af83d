//! Per-component access to the simulation: emitting events and reading
//! the clock.

use std::cell::RefCell;
use std::rc::Rc;

use crate::component::Id;
use crate::error::InvalidDeadlineError;
use crate::event::{EventData, EventId};
use crate::state::SimulationState;
use crate::time::Instant;
use crate::timer::Receipt;

/// A component's handle onto the simulation it lives in.
///
/// Created by [`Simulation::create_context`](crate::Simulation::create_context);
/// cheap to use, single-threaded. The `emit_*` family returns the assigned
/// [`EventId`]; the `schedule_*` family additionally returns a [`Receipt`]
/// for querying and cancelling the timer.
pub struct SimulationContext {
    id: Id,
    name: String,
    state: Rc<RefCell<SimulationState>>,
}

impl SimulationContext {
    pub(crate) fn new(id: Id, name: &str, state: Rc<RefCell<SimulationState>>) -> Self {
        Self {
            id,
            name: name.to_owned(),
            state,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current simulated time. Never decreases.
    pub fn time(&self) -> Instant {
        self.state.borrow().time()
    }

    /// Deliver `data` to component `dst` after `delay` nanoseconds.
    pub fn emit<T: EventData>(&self, data: T, dst: Id, delay: u64) -> EventId {
        self.schedule(data, dst, delay).id()
    }

    /// Deliver `data` to component `dst` at the current instant, after
    /// all already-queued same-instant events.
    pub fn emit_now<T: EventData>(&self, data: T, dst: Id) -> EventId {
        self.emit(data, dst, 0)
    }

    pub fn emit_self<T: EventData>(&self, data: T, delay: u64) -> EventId {
        self.emit(data, self.id, delay)
    }

    pub fn emit_self_now<T: EventData>(&self, data: T) -> EventId {
        self.emit(data, self.id, 0)
    }

    /// Deliver `data` to `dst` at the absolute instant `deadline`.
    /// Fails if `deadline` is already in the past.
    pub fn emit_at<T: EventData>(
        &self,
        data: T,
        dst: Id,
        deadline: Instant,
    ) -> Result<EventId, InvalidDeadlineError> {
        self.schedule_at(data, dst, deadline).map(|r| r.id())
    }

    /// Like [`emit`](Self::emit), returning a cancellable [`Receipt`].
    pub fn schedule<T: EventData>(&self, data: T, dst: Id, delay: u64) -> Receipt {
        self.state
            .borrow_mut()
            .add_event(Box::new(data), self.id, dst, delay)
    }

    pub fn schedule_self<T: EventData>(&self, data: T, delay: u64) -> Receipt {
        self.schedule(data, self.id, delay)
    }

    /// Like [`emit_at`](Self::emit_at), returning a cancellable
    /// [`Receipt`].
    pub fn schedule_at<T: EventData>(
        &self,
        data: T,
        dst: Id,
        deadline: Instant,
    ) -> Result<Receipt, InvalidDeadlineError> {
        self.state
            .borrow_mut()
            .add_event_at(Box::new(data), self.id, dst, deadline)
    }
}
