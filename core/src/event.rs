//! Events and event payloads.

use std::cmp::Ordering;

use downcast_rs::{impl_downcast, Downcast};
use serde::Serialize;

use crate::component::Id;
use crate::time::Instant;

/// Unique, strictly increasing event identifier.
///
/// Assigned at insertion time, it doubles as the FIFO tie-break for
/// events scheduled at the same instant.
pub type EventId = u64;

/// Trait implemented by all event payload types.
///
/// Any `'static` type that is `Debug + Serialize` qualifies; payloads are
/// plain structs with `#[derive(Clone, Serialize)]` and are recovered by
/// the [`cast!`](crate::cast) macro in an event handler.
pub trait EventData: Downcast + erased_serde::Serialize + std::fmt::Debug {}

impl_downcast!(EventData);
erased_serde::serialize_trait_object!(EventData);

impl<T: Serialize + std::fmt::Debug + 'static> EventData for T {}

/// A scheduled occurrence: a payload delivered to component `dst` at
/// `time`, on behalf of component `src`.
#[derive(Debug, Serialize)]
pub struct Event {
    pub id: EventId,
    pub time: Instant,
    pub src: Id,
    pub dst: Id,
    pub data: Box<dyn EventData>,
}

impl Eq for Event {}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Reversed `(time, id)` ordering so that a `BinaryHeap` pops the
/// earliest event, with insertion order breaking ties.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct Ping {}

    fn event(id: EventId, time: u64) -> Event {
        Event {
            id,
            time: Instant::from_nanos(time),
            src: 0,
            dst: 0,
            data: Box::new(Ping {}),
        }
    }

    #[test]
    fn earlier_time_wins() {
        // reversed ordering: the earlier event is the greater one
        assert!(event(1, 10) > event(0, 20));
    }

    #[test]
    fn same_time_lower_id_wins() {
        assert!(event(0, 10) > event(1, 10));
    }

    #[test]
    fn payload_downcast() {
        let e = event(0, 0);
        assert!(e.data.is::<Ping>());
        assert!(e.data.downcast::<Ping>().is_ok());
    }
}
