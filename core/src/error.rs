//! Kernel error types.

use thiserror::Error;

use crate::time::Instant;

/// Returned when a caller asks the engine to schedule an event at an
/// instant that is already in the past. The request is rejected as a
/// whole; the deadline is never clamped to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline {deadline} is before current time {now}")]
pub struct InvalidDeadlineError {
    pub deadline: Instant,
    pub now: Instant,
}
