use flowsim_core::EPSILON;

use super::PowerModel;

fn clamp_utilization(utilization: f64) -> f64 {
    utilization.clamp(0.0, 1.0)
}

/// Fixed draw regardless of load, e.g. a PSU floor measurement.
#[derive(Debug, Clone, Copy)]
pub struct ConstantPowerModel {
    power: f64,
}

impl ConstantPowerModel {
    pub fn new(power: f64) -> Self {
        Self { power }
    }
}

impl PowerModel for ConstantPowerModel {
    fn power(&self, _utilization: f64) -> f64 {
        self.power
    }
}

/// `idle + u * (max - idle)`.
#[derive(Debug, Clone, Copy)]
pub struct LinearPowerModel {
    max: f64,
    idle: f64,
}

impl LinearPowerModel {
    pub fn new(max: f64, idle: f64) -> Self {
        Self { max, idle }
    }
}

impl PowerModel for LinearPowerModel {
    fn power(&self, utilization: f64) -> f64 {
        self.idle + clamp_utilization(utilization) * (self.max - self.idle)
    }
}

/// `idle + u^2 * (max - idle)`.
#[derive(Debug, Clone, Copy)]
pub struct SquarePowerModel {
    max: f64,
    idle: f64,
}

impl SquarePowerModel {
    pub fn new(max: f64, idle: f64) -> Self {
        Self { max, idle }
    }
}

impl PowerModel for SquarePowerModel {
    fn power(&self, utilization: f64) -> f64 {
        self.idle + clamp_utilization(utilization).powi(2) * (self.max - self.idle)
    }
}

/// `idle + u^3 * (max - idle)`.
#[derive(Debug, Clone, Copy)]
pub struct CubicPowerModel {
    max: f64,
    idle: f64,
}

impl CubicPowerModel {
    pub fn new(max: f64, idle: f64) -> Self {
        Self { max, idle }
    }
}

impl PowerModel for CubicPowerModel {
    fn power(&self, utilization: f64) -> f64 {
        self.idle + clamp_utilization(utilization).powi(3) * (self.max - self.idle)
    }
}

/// `idle + sqrt(u) * (max - idle)`.
#[derive(Debug, Clone, Copy)]
pub struct SqrtPowerModel {
    max: f64,
    idle: f64,
}

impl SqrtPowerModel {
    pub fn new(max: f64, idle: f64) -> Self {
        Self { max, idle }
    }
}

impl PowerModel for SqrtPowerModel {
    fn power(&self, utilization: f64) -> f64 {
        self.idle + clamp_utilization(utilization).sqrt() * (self.max - self.idle)
    }
}

/// Saturating curve that approaches `max` as utilization grows; `param`
/// controls how quickly the knee is reached. With `dvfs` the idle
/// component scales with the operating point as well, modeling cores
/// whose static draw drops at lower frequencies.
#[derive(Debug, Clone, Copy)]
pub struct AsymptoticPowerModel {
    max: f64,
    idle: f64,
    param: f64,
    dvfs: bool,
}

impl AsymptoticPowerModel {
    pub fn new(max: f64, idle: f64, param: f64, dvfs: bool) -> Self {
        Self {
            max,
            idle,
            param,
            dvfs,
        }
    }
}

impl PowerModel for AsymptoticPowerModel {
    fn power(&self, utilization: f64) -> f64 {
        let u = clamp_utilization(utilization);
        let idle = if self.dvfs { self.idle * u } else { self.idle };
        idle + (self.max - self.idle) / 2.0 * (1.0 + u - (-u / self.param).exp())
    }
}

/// Decorator forcing `power(0) = 0` while leaving every other sample of
/// the inner model unchanged, for hardware assumed to be fully powered
/// off when unused.
#[derive(Debug, Clone, Copy)]
pub struct ZeroIdlePowerModel<M> {
    inner: M,
}

impl<M: PowerModel> ZeroIdlePowerModel<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M: PowerModel> PowerModel for ZeroIdlePowerModel<M> {
    fn power(&self, utilization: f64) -> f64 {
        if clamp_utilization(utilization) <= EPSILON {
            0.0
        } else {
            self.inner.power(utilization)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_ignores_utilization() {
        let model = ConstantPowerModel::new(200.0);
        for u in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(model.power(u), 200.0);
        }
    }

    #[test]
    fn linear_interpolates_between_idle_and_max() {
        let model = LinearPowerModel::new(350.0, 200.0);
        assert_eq!(model.power(0.0), 200.0);
        assert_eq!(model.power(0.5), 275.0);
        assert_eq!(model.power(1.0), 350.0);
    }

    #[test]
    fn curves_are_clamped_and_hit_endpoints() {
        let square = SquarePowerModel::new(350.0, 200.0);
        let cubic = CubicPowerModel::new(350.0, 200.0);
        let sqrt = SqrtPowerModel::new(350.0, 200.0);

        for model in [&square as &dyn PowerModel, &cubic, &sqrt] {
            assert_eq!(model.power(-1.0), model.power(0.0));
            assert_eq!(model.power(0.0), 200.0);
            assert_eq!(model.power(2.0), model.power(1.0));
            assert_eq!(model.power(1.0), 350.0);
        }
        assert!(square.power(0.5) < LinearPowerModel::new(350.0, 200.0).power(0.5));
        assert!(sqrt.power(0.5) > LinearPowerModel::new(350.0, 200.0).power(0.5));
    }

    #[test]
    fn asymptotic_is_monotonic() {
        for dvfs in [false, true] {
            let model = AsymptoticPowerModel::new(350.0, 200.0, 0.3, dvfs);
            let mut last = f64::MIN;
            for step in 0..=100 {
                let p = model.power(step as f64 / 100.0);
                assert!(p >= last, "asymptotic model decreased at step {}", step);
                last = p;
            }
            assert!(last <= 350.0);
        }
    }

    #[test]
    fn zero_idle_overrides_only_the_origin() {
        let model = ZeroIdlePowerModel::new(LinearPowerModel::new(350.0, 200.0));
        assert_eq!(model.power(0.0), 0.0);
        assert_eq!(model.power(0.5), 275.0);
        assert_eq!(model.power(1.0), 350.0);
    }
}
