//! Pending-timer queue and the caller-visible [`Receipt`] handle.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use crate::event::{Event, EventId};
use crate::time::Instant;

/// Lifecycle of a queued timer. `Cancelled` and `Delivered` are terminal
/// and mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Pending,
    Cancelled,
    Delivered,
}

/// Caller-visible handle to a scheduled event.
///
/// The queue keeps exclusive ownership of the timer itself; the receipt
/// only observes its state and can cancel it before delivery.
#[derive(Debug, Clone)]
pub struct Receipt {
    id: EventId,
    state: Rc<Cell<TimerState>>,
}

impl Receipt {
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Cancel the timer. Returns `true` exactly once, and only if the
    /// timer has not fired yet; cancelling an already-cancelled or
    /// already-delivered timer returns `false`.
    pub fn cancel(&self) -> bool {
        if self.state.get() == TimerState::Pending {
            self.state.set(TimerState::Cancelled);
            true
        } else {
            false
        }
    }

    pub fn cancelled(&self) -> bool {
        self.state.get() == TimerState::Cancelled
    }

    pub fn delivered(&self) -> bool {
        self.state.get() == TimerState::Delivered
    }
}

struct TimerEntry {
    event: Event,
    state: Rc<Cell<TimerState>>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.event == other.event
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.event.cmp(&other.event)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending timers ordered by `(time, id)`.
///
/// Cancellation is lazy: cancelled entries stay in the heap and are
/// discarded when they reach the top, without being delivered and
/// without advancing the clock.
#[derive(Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<TimerEntry>,
}

impl TimerQueue {
    pub fn push(&mut self, event: Event) -> Receipt {
        let receipt = Receipt {
            id: event.id,
            state: Rc::new(Cell::new(TimerState::Pending)),
        };
        self.heap.push(TimerEntry {
            event,
            state: receipt.state.clone(),
        });
        receipt
    }

    /// Pop the earliest live timer, marking it delivered.
    pub fn pop(&mut self) -> Option<Event> {
        while let Some(entry) = self.heap.pop() {
            if entry.state.get() == TimerState::Cancelled {
                continue;
            }
            entry.state.set(TimerState::Delivered);
            return Some(entry.event);
        }
        None
    }

    /// Deadline of the earliest live timer, discarding cancelled entries
    /// on the way.
    pub fn next_time(&mut self) -> Option<Instant> {
        while let Some(entry) = self.heap.peek() {
            if entry.state.get() == TimerState::Cancelled {
                self.heap.pop();
                continue;
            }
            return Some(entry.event.time);
        }
        None
    }

}
