//! Scaling driver: binds a governor and a power model to one resource.

use serde::Serialize;

use crate::cpufreq::governor::Governor;
use crate::power::{PowerModel, PowerSample};

/// Per-resource scaling state, refreshed once per recomputation cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScalingContext {
    /// Capacity bound the governor currently asks for.
    pub target: f64,
    /// Utilization observed in the last completed cycle.
    pub last_utilization: f64,
}

pub struct ScalingDriver {
    governor: Box<dyn Governor>,
    power_model: Box<dyn PowerModel>,
    context: ScalingContext,
}

impl ScalingDriver {
    pub fn new(governor: Box<dyn Governor>, power_model: Box<dyn PowerModel>) -> Self {
        Self {
            governor,
            power_model,
            context: ScalingContext {
                target: f64::INFINITY,
                last_utilization: 0.0,
            },
        }
    }

    pub fn governor_name(&self) -> &str {
        self.governor.name()
    }

    pub fn context(&self) -> ScalingContext {
        self.context
    }

    /// Feed one realized utilization sample through the governor.
    ///
    /// Returns the capacity bound to apply to the resource from the next
    /// recomputation on, together with the power draw at this sample.
    pub fn update(&mut self, utilization: f64, max_capacity: f64) -> (f64, PowerSample) {
        let target = self
            .governor
            .target(utilization, max_capacity)
            .clamp(0.0, max_capacity);
        self.context = ScalingContext {
            target,
            last_utilization: utilization,
        };
        let sample = PowerSample {
            utilization,
            power: self.power_model.power(utilization),
        };
        (target, sample)
    }

    /// Power draw at a given utilization, without touching the governor.
    pub fn probe_power(&self, utilization: f64) -> f64 {
        self.power_model.power(utilization)
    }
}
