//! Power draw models.
//!
//! A power model is a pure function from CPU utilization in `[0, 1]` to
//! watts, monotonic non-decreasing and continuous. The engine samples it
//! once per recomputation cycle; samples are handed to monitoring and
//! never stored by the engine itself.

pub mod models;

use serde::Serialize;

pub use models::{
    AsymptoticPowerModel, ConstantPowerModel, CubicPowerModel, LinearPowerModel, SqrtPowerModel,
    SquarePowerModel, ZeroIdlePowerModel,
};

pub trait PowerModel {
    /// Power draw in watts at the given utilization. Implementations
    /// clamp `utilization` to `[0, 1]`.
    fn power(&self, utilization: f64) -> f64;
}

impl PowerModel for Box<dyn PowerModel> {
    fn power(&self, utilization: f64) -> f64 {
        self.as_ref().power(utilization)
    }
}

/// One observation of a resource: realized utilization and the power
/// draw its model reports for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerSample {
    pub utilization: f64,
    pub power: f64,
}
