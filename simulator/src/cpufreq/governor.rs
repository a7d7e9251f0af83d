//! Scaling governors.

/// Policy deciding the capacity (frequency) target of a resource.
///
/// Invoked once per recomputation cycle with the utilization realized in
/// the cycle that just completed.
pub trait Governor {
    fn name(&self) -> &str;

    /// New capacity target given the observed utilization and the
    /// hardware ceiling. The driver clamps the result to `[0, max]`.
    fn target(&mut self, utilization: f64, max: f64) -> f64;
}

/// Always runs the resource at its hardware ceiling.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerformanceGovernor;

impl Governor for PerformanceGovernor {
    fn name(&self) -> &str {
        "performance"
    }

    fn target(&mut self, _utilization: f64, max: f64) -> f64 {
        max
    }
}

/// Steps the target up or down by a fixed increment when utilization
/// crosses a threshold, keeping the previous sample to only react to a
/// sustained move in that direction.
#[derive(Debug, Clone, Copy)]
pub struct ConservativeGovernor {
    step: f64,
    up_threshold: f64,
    down_threshold: f64,
    last_utilization: Option<f64>,
    target: Option<f64>,
}

impl ConservativeGovernor {
    pub const DEFAULT_UP_THRESHOLD: f64 = 0.8;
    pub const DEFAULT_DOWN_THRESHOLD: f64 = 0.2;

    pub fn new(step: f64, up_threshold: f64, down_threshold: f64) -> Self {
        Self {
            step,
            up_threshold,
            down_threshold,
            last_utilization: None,
            target: None,
        }
    }

    pub fn with_step(step: f64) -> Self {
        Self::new(step, Self::DEFAULT_UP_THRESHOLD, Self::DEFAULT_DOWN_THRESHOLD)
    }
}

impl Governor for ConservativeGovernor {
    fn name(&self) -> &str {
        "conservative"
    }

    fn target(&mut self, utilization: f64, max: f64) -> f64 {
        let previous = self.last_utilization.replace(utilization);
        let mut target = self.target.unwrap_or(max);

        if utilization > self.up_threshold && previous.map_or(true, |p| utilization >= p) {
            target += self.step;
        } else if utilization < self.down_threshold && previous.map_or(false, |p| utilization <= p)
        {
            target -= self.step;
        }

        // never scale below one step, never above the hardware ceiling
        target = target.clamp(self.step.min(max), max);
        self.target = Some(target);
        target
    }
}
