//! Shared mutable state behind a simulation and its contexts.

use crate::component::Id;
use crate::error::InvalidDeadlineError;
use crate::event::{Event, EventData, EventId};
use crate::time::Instant;
use crate::timer::{Receipt, TimerQueue};

/// Tolerance for floating-point rate and work comparisons.
pub const EPSILON: f64 = 1e-9;

pub(crate) struct SimulationState {
    clock: Instant,
    queue: TimerQueue,
    next_event_id: EventId,
    event_count: u64,
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            clock: Instant::ZERO,
            queue: TimerQueue::default(),
            next_event_id: 0,
            event_count: 0,
        }
    }

    pub fn time(&self) -> Instant {
        self.clock
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn add_event(
        &mut self,
        data: Box<dyn EventData>,
        src: Id,
        dst: Id,
        delay: u64,
    ) -> Receipt {
        let time = self.clock.advance(delay);
        self.push(data, src, dst, time)
    }

    pub fn add_event_at(
        &mut self,
        data: Box<dyn EventData>,
        src: Id,
        dst: Id,
        deadline: Instant,
    ) -> Result<Receipt, InvalidDeadlineError> {
        if deadline < self.clock {
            return Err(InvalidDeadlineError {
                deadline,
                now: self.clock,
            });
        }
        Ok(self.push(data, src, dst, deadline))
    }

    fn push(&mut self, data: Box<dyn EventData>, src: Id, dst: Id, time: Instant) -> Receipt {
        let id = self.next_event_id;
        self.next_event_id += 1;
        self.queue.push(Event {
            id,
            time,
            src,
            dst,
            data,
        })
    }

    /// Pop the next live event and advance the clock to its deadline.
    pub fn next_event(&mut self) -> Option<Event> {
        let event = self.queue.pop()?;
        debug_assert!(self.clock <= event.time, "event from the past in queue");
        self.clock = event.time;
        self.event_count += 1;
        Some(event)
    }

    pub fn peek_next_time(&mut self) -> Option<Instant> {
        self.queue.next_time()
    }

    /// Move the clock forward to `time` without delivering anything.
    /// A `time` at or before the current clock is a no-op.
    pub fn advance_time_to(&mut self, time: Instant) {
        if time > self.clock {
            self.clock = time;
        }
    }
}
