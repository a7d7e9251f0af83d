//! The actor runtime component.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::Serialize;

use flowsim_core::{
    cast, log_debug, log_warn, Event, EventData, EventHandler, Instant, Receipt,
    SimulationContext,
};

use crate::actor::{ActorId, Behavior, MailboxItem, Transition};

#[derive(Debug, Serialize)]
pub struct ActorMessage {
    pub dst: ActorId,
    pub payload: Box<dyn EventData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorSignal {
    pub dst: ActorId,
    pub token: u64,
}

#[derive(Debug, Clone, Serialize)]
struct ProcessMailbox {
    dst: ActorId,
}

struct ActorCell {
    behavior: Box<dyn Behavior>,
    mailbox: VecDeque<MailboxItem>,
    parent: Option<ActorId>,
    children: Vec<ActorId>,
    /// Token of the signal this actor is currently waiting for, if any.
    /// Signals with another token are stale timeouts and are discarded.
    awaiting_signal: Option<u64>,
}

/// Deferred actions collected while a behavior runs, applied once it
/// returns so behaviors never re-enter the runtime.
enum Command {
    Spawn {
        id: ActorId,
        parent: ActorId,
        behavior: Box<dyn Behavior>,
    },
    StopChild {
        id: ActorId,
    },
}

/// Single event-handling component hosting every actor of a simulation.
///
/// All sends go through the event queue, so messages from different
/// actors delivered at the same instant keep their emission order.
pub struct ActorRuntime {
    ctx: SimulationContext,
    actors: FxHashMap<ActorId, ActorCell>,
    next_actor_id: ActorId,
}

impl ActorRuntime {
    pub fn new(ctx: SimulationContext) -> Self {
        Self {
            ctx,
            actors: FxHashMap::default(),
            next_actor_id: 0,
        }
    }

    /// Spawn a root actor.
    pub fn spawn(&mut self, behavior: Box<dyn Behavior>) -> ActorId {
        let id = self.next_actor_id;
        self.next_actor_id += 1;
        self.insert_cell(id, None, behavior);
        id
    }

    fn insert_cell(&mut self, id: ActorId, parent: Option<ActorId>, behavior: Box<dyn Behavior>) {
        self.actors.insert(
            id,
            ActorCell {
                behavior,
                mailbox: VecDeque::new(),
                parent,
                children: Vec::new(),
                awaiting_signal: None,
            },
        );
        if let Some(parent) = parent {
            if let Some(cell) = self.actors.get_mut(&parent) {
                cell.children.push(id);
            }
        }
    }

    /// Send a message to an actor. Delivery happens at the current
    /// instant, after events that are already queued.
    pub fn send<T: EventData>(&self, dst: ActorId, payload: T) {
        self.ctx.emit_self_now(ActorMessage {
            dst,
            payload: Box::new(payload),
        });
    }

    /// Stop an actor and all of its descendants immediately. Pending
    /// mailbox items are discarded.
    pub fn stop(&mut self, id: ActorId) {
        let Some(cell) = self.actors.remove(&id) else {
            return;
        };
        log_debug!(self.ctx, "actor {} stopped", id);
        if let Some(parent) = cell.parent {
            if let Some(parent_cell) = self.actors.get_mut(&parent) {
                parent_cell.children.retain(|&c| c != id);
            }
        }
        for child in cell.children {
            self.stop(child);
        }
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    fn enqueue(&mut self, dst: ActorId, item: MailboxItem) {
        match self.actors.get_mut(&dst) {
            Some(cell) => {
                cell.mailbox.push_back(item);
                self.ctx.emit_self_now(ProcessMailbox { dst });
            }
            None => {
                log_debug!(self.ctx, "dropping item for stopped actor {}", dst);
            }
        }
    }

    /// Run one activation: pop a single mailbox item and feed it to the
    /// actor's behavior.
    fn activate(&mut self, dst: ActorId) {
        let (transition, commands, next_id, awaiting) = {
            let Some(cell) = self.actors.get_mut(&dst) else {
                // stopped between enqueue and activation
                return;
            };
            let Some(item) = cell.mailbox.pop_front() else {
                return;
            };
            if let MailboxItem::Signal { token } = &item {
                if let Some(expected) = cell.awaiting_signal {
                    if expected != *token {
                        log_debug!(self.ctx, "actor {} discarding stale signal {}", dst, token);
                        return;
                    }
                    cell.awaiting_signal = None;
                }
            }
            let mut actor_ctx = ActorContext {
                self_id: dst,
                sim: &self.ctx,
                next_actor_id: self.next_actor_id,
                awaiting: None,
                commands: Vec::new(),
            };
            let transition = cell.behavior.receive(item, &mut actor_ctx);
            (
                transition,
                actor_ctx.commands,
                actor_ctx.next_actor_id,
                actor_ctx.awaiting,
            )
        };

        self.next_actor_id = next_id;
        if let Some(token) = awaiting {
            if let Some(cell) = self.actors.get_mut(&dst) {
                cell.awaiting_signal = Some(token);
            }
        }
        for command in commands {
            match command {
                Command::Spawn {
                    id,
                    parent,
                    behavior,
                } => self.insert_cell(id, Some(parent), behavior),
                Command::StopChild { id } => self.stop(id),
            }
        }
        match transition {
            Transition::Same => {}
            Transition::Become(behavior) => {
                if let Some(cell) = self.actors.get_mut(&dst) {
                    cell.behavior = behavior;
                }
            }
            Transition::Stop => self.stop(dst),
            Transition::Unhandled => {
                log_warn!(self.ctx, "actor {} dropped an unhandled item", dst);
            }
        }
    }
}

impl EventHandler for ActorRuntime {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            ActorMessage { dst, payload } => {
                self.enqueue(dst, MailboxItem::Message(payload));
            }
            ActorSignal { dst, token } => {
                self.enqueue(dst, MailboxItem::Signal { token });
            }
            ProcessMailbox { dst } => {
                self.activate(dst);
            }
        });
    }
}

/// The view an actor gets of the runtime while handling one item.
pub struct ActorContext<'a> {
    self_id: ActorId,
    sim: &'a SimulationContext,
    next_actor_id: ActorId,
    awaiting: Option<u64>,
    commands: Vec<Command>,
}

impl ActorContext<'_> {
    pub fn self_id(&self) -> ActorId {
        self.self_id
    }

    pub fn time(&self) -> Instant {
        self.sim.time()
    }

    pub fn send<T: EventData>(&self, dst: ActorId, payload: T) {
        self.sim.emit_self_now(ActorMessage {
            dst,
            payload: Box::new(payload),
        });
    }

    /// Spawn a child of the current actor. The child is live once this
    /// activation finishes.
    pub fn spawn(&mut self, behavior: Box<dyn Behavior>) -> ActorId {
        let id = self.next_actor_id;
        self.next_actor_id += 1;
        self.commands.push(Command::Spawn {
            id,
            parent: self.self_id,
            behavior,
        });
        id
    }

    pub fn stop_child(&mut self, id: ActorId) {
        self.commands.push(Command::StopChild { id });
    }

    /// Schedule a signal to self after `delay` nanoseconds. Cancelling
    /// the receipt before delivery suppresses the signal entirely.
    pub fn schedule_signal(&self, delay: u64, token: u64) -> Receipt {
        self.sim.schedule_self(
            ActorSignal {
                dst: self.self_id,
                token,
            },
            delay,
        )
    }

    /// Declare that the actor now waits for the signal carrying `token`;
    /// signals with other tokens are treated as stale timeouts and
    /// silently discarded until this one arrives.
    pub fn await_signal(&mut self, token: u64) {
        self.awaiting = Some(token);
    }
}
