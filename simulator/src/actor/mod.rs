//! Cooperative actors on top of the event kernel.
//!
//! Each actor owns a mailbox and a behavior; one mailbox item is
//! consumed per activation, and activations of all actors interleave on
//! the single simulation thread, so actor-local state needs no locking.
//! Suspension is plain data — a queued mailbox and an optionally awaited
//! signal token — resumed only by the event engine.

pub mod runtime;

use flowsim_core::EventData;

pub use runtime::{ActorContext, ActorRuntime, ActorSignal};

/// Runtime-local actor identifier.
pub type ActorId = u64;

/// One unit of mailbox work.
#[derive(Debug)]
pub enum MailboxItem {
    /// A message sent by another actor or by the embedding application.
    Message(Box<dyn EventData>),
    /// A scheduled signal, e.g. a timeout. The token identifies which
    /// wait it belongs to.
    Signal { token: u64 },
}

/// What the actor does after handling one item.
pub enum Transition {
    /// Keep the current behavior.
    Same,
    /// Swap in a new behavior for subsequent items.
    Become(Box<dyn Behavior>),
    /// Terminate this actor and, recursively, its children.
    Stop,
    /// The item was not understood: it is dropped with a warning and the
    /// behavior stays unchanged.
    Unhandled,
}

/// An actor's message-handling state. `become`-style state machines are
/// expressed by returning [`Transition::Become`].
pub trait Behavior {
    fn receive(&mut self, item: MailboxItem, ctx: &mut ActorContext) -> Transition;
}
