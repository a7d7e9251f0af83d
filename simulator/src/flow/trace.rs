//! Workload fragments driving sink demand.
//!
//! A fragment demands `rate` resource units per second and carries
//! `rate * duration` units of bounded work. Work is consumed at the
//! *allocated* rate, so an under-served fragment takes proportionally
//! longer than its nominal duration. Zero-rate fragments model idle
//! gaps: they demand nothing and elapse in wall time.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use flowsim_core::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowFragment {
    pub duration_ms: i64,
    pub rate: f64,
}

impl FlowFragment {
    pub fn new(duration_ms: i64, rate: f64) -> Self {
        Self { duration_ms, rate }
    }

    fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1_000.0
    }

    /// Bounded work of a busy fragment, in resource units.
    fn work(&self) -> f64 {
        self.rate * self.duration_secs()
    }

    fn is_idle(&self) -> bool {
        self.rate <= EPSILON
    }
}

/// FIFO of fragments plus the progress of the head fragment.
///
/// `head_remaining` is work units while the head is busy and seconds
/// while it is idle.
#[derive(Debug, Default)]
pub struct FragmentQueue {
    fragments: VecDeque<FlowFragment>,
    head_remaining: f64,
}

impl FragmentQueue {
    pub fn new<I: IntoIterator<Item = FlowFragment>>(fragments: I) -> Self {
        let mut queue = Self::default();
        for fragment in fragments {
            queue.push(fragment);
        }
        queue
    }

    pub fn push(&mut self, fragment: FlowFragment) {
        if fragment.duration_ms <= 0 {
            return;
        }
        self.fragments.push_back(fragment);
        if self.fragments.len() == 1 {
            self.reset_head();
        }
    }

    fn reset_head(&mut self) {
        self.head_remaining = match self.fragments.front() {
            Some(f) if f.is_idle() => f.duration_secs(),
            Some(f) => f.work(),
            None => 0.0,
        };
    }

    fn pop_head(&mut self) {
        self.fragments.pop_front();
        self.reset_head();
    }

    /// Rate the head fragment currently asks for.
    pub fn demand(&self) -> f64 {
        match self.fragments.front() {
            Some(f) if !f.is_idle() => f.rate,
            _ => 0.0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Account `elapsed` seconds of progress at the given allocated
    /// rate, popping every fragment boundary crossed on the way.
    pub(crate) fn advance(&mut self, mut elapsed: f64, allocated: f64) {
        while elapsed > EPSILON {
            let Some(head) = self.fragments.front().copied() else {
                return;
            };
            if head.is_idle() {
                if self.head_remaining <= elapsed + EPSILON {
                    elapsed -= self.head_remaining;
                    self.pop_head();
                } else {
                    self.head_remaining -= elapsed;
                    return;
                }
            } else {
                if allocated <= EPSILON {
                    // starved: bounded work makes no progress
                    return;
                }
                let time_to_finish = self.head_remaining / allocated;
                if time_to_finish <= elapsed + EPSILON {
                    elapsed -= time_to_finish;
                    self.pop_head();
                } else {
                    self.head_remaining -= allocated * elapsed;
                    return;
                }
            }
        }
    }

    /// Seconds until the head fragment is exhausted at the given
    /// allocated rate. `None` while starved, or when nothing is queued.
    pub(crate) fn next_boundary(&self, allocated: f64) -> Option<f64> {
        let head = self.fragments.front()?;
        if head.is_idle() {
            Some(self.head_remaining)
        } else if allocated <= EPSILON {
            None
        } else {
            Some(self.head_remaining / allocated)
        }
    }
}
