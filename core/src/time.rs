//! Virtual time for the simulation.
//!
//! Time is a logical nanosecond counter with no connection to the wall
//! clock. It advances only when the simulation delivers an event.

use serde::Serialize;

/// A point in simulated time, in nanoseconds since simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Instant(u64);

pub const NANOS_PER_MILLI: u64 = 1_000_000;
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

impl Instant {
    /// The start of simulated time.
    pub const ZERO: Instant = Instant(0);

    #[inline]
    pub fn from_nanos(nanos: u64) -> Self {
        Instant(nanos)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        Instant(millis * NANOS_PER_MILLI)
    }

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        Instant(secs * NANOS_PER_SEC)
    }

    #[inline]
    pub fn nanos(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// The instant `delta` nanoseconds after `self`, saturating at the
    /// end of representable time.
    #[inline]
    pub fn advance(self, delta: u64) -> Instant {
        Instant(self.0.saturating_add(delta))
    }

    /// Nanoseconds elapsed since `earlier`, or `None` if `earlier` is in
    /// the future.
    #[inline]
    pub fn duration_since(self, earlier: Instant) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }

    #[inline]
    pub fn is_before(self, other: Instant) -> bool {
        self.0 < other.0
    }
}

impl std::fmt::Display for Instant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
