//! Component-scoped logging macros.
//!
//! Each macro takes a [`SimulationContext`](crate::SimulationContext)
//! first and prefixes the message with the simulated time and the
//! component name, so interleaved component logs stay attributable.

use colored::{ColoredString, Colorize};

use crate::event::Event;
use crate::time::Instant;

pub fn time_str(time: Instant) -> ColoredString {
    format!("{:.6}", time.as_secs_f64()).blue()
}

/// Fallback for events that reached a handler with no matching `cast!`
/// arm, or a destination with no registered handler.
pub fn log_unhandled_event(event: &Event) {
    log::warn!(
        target: "simulation",
        "{} [{}] unhandled event: {:?}",
        time_str(event.time),
        event.dst,
        event.data,
    );
}

#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => {
        log::info!(
            target: "simulation",
            "{} [{}] {}",
            $crate::log::time_str($ctx.time()),
            $ctx.name(),
            format!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => {
        log::debug!(
            target: "simulation",
            "{} [{}] {}",
            $crate::log::time_str($ctx.time()),
            $ctx.name(),
            format!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)+) => {
        log::trace!(
            target: "simulation",
            "{} [{}] {}",
            $crate::log::time_str($ctx.time()),
            $ctx.name(),
            format!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => {
        log::warn!(
            target: "simulation",
            "{} [{}] {}",
            $crate::log::time_str($ctx.time()),
            $ctx.name(),
            format!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => {
        log::error!(
            target: "simulation",
            "{} [{}] {}",
            $crate::log::time_str($ctx.time()),
            $ctx.name(),
            format!($($arg)+),
        )
    };
}
