//! The drain loop: owns the clock, the timer queue and the handler
//! registry, and delivers events in deterministic order.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::component::Id;
use crate::context::SimulationContext;
use crate::handler::EventHandler;
use crate::log::log_unhandled_event;
use crate::state::SimulationState;
use crate::time::Instant;

/// A single deterministic simulation instance.
///
/// All components of one simulation are driven by the same loop: the
/// earliest pending event is popped, the clock jumps to its deadline and
/// the destination handler runs to completion before the next pop.
/// Events with equal deadlines fire in insertion order, which makes
/// repeated runs with identical inputs bit-for-bit reproducible.
pub struct Simulation {
    state: Rc<RefCell<SimulationState>>,
    handlers: Vec<Option<Rc<RefCell<dyn EventHandler>>>>,
    names: Vec<String>,
    name_to_id: HashMap<String, Id>,
}

impl Simulation {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SimulationState::new())),
            handlers: Vec::new(),
            names: Vec::new(),
            name_to_id: HashMap::new(),
        }
    }

    /// Register a component name and hand back its context. Each name may
    /// be registered once per simulation.
    pub fn create_context<S: AsRef<str>>(&mut self, name: S) -> SimulationContext {
        let id = self.register(name.as_ref());
        SimulationContext::new(id, name.as_ref(), self.state.clone())
    }

    /// Attach the event handler for a component created earlier with
    /// [`create_context`](Self::create_context).
    pub fn add_handler<S: AsRef<str>>(
        &mut self,
        name: S,
        handler: Rc<RefCell<dyn EventHandler>>,
    ) -> Id {
        let id = self.register(name.as_ref());
        self.handlers[id as usize] = Some(handler);
        id
    }

    fn register(&mut self, name: &str) -> Id {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.names.len() as Id;
        self.names.push(name.to_owned());
        self.name_to_id.insert(name.to_owned(), id);
        self.handlers.push(None);
        id
    }

    pub fn lookup_id(&self, name: &str) -> Option<Id> {
        self.name_to_id.get(name).copied()
    }

    pub fn time(&self) -> Instant {
        self.state.borrow().time()
    }

    /// Number of events delivered so far.
    pub fn event_count(&self) -> u64 {
        self.state.borrow().event_count()
    }

    /// Deliver the single earliest pending event. Returns `false` when
    /// the queue is empty.
    pub fn step(&mut self) -> bool {
        let event = self.state.borrow_mut().next_event();
        match event {
            Some(event) => {
                let handler = self
                    .handlers
                    .get(event.dst as usize)
                    .and_then(|h| h.clone());
                match handler {
                    Some(handler) => handler.borrow_mut().on(event),
                    None => log_unhandled_event(&event),
                }
                true
            }
            None => false,
        }
    }

    /// Drain the queue completely.
    pub fn step_until_no_events(&mut self) {
        while self.step() {}
    }

    /// Deliver every event with deadline at or before `limit`, then set
    /// the clock to `limit` even if no event exists exactly there. The
    /// next pending event (if any) stays queued for a later call.
    pub fn step_until_time(&mut self, limit: Instant) {
        loop {
            let next = self.state.borrow_mut().peek_next_time();
            match next {
                Some(time) if time <= limit => {
                    self.step();
                }
                _ => break,
            }
        }
        self.state.borrow_mut().advance_time_to(limit);
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
