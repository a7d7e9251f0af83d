//! In-memory per-node load and power series.
//!
//! The flow engine appends a point for every recomputation cycle; the
//! embedding application decides what to export and where. Nothing is
//! written to disk here.

use rustc_hash::FxHashMap;

use flowsim_core::Instant;

use crate::power::PowerSample;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourcePoint {
    pub time: f64,
    pub allocated: f64,
    pub utilization: f64,
    pub power: Option<f64>,
}

/// Time-ordered samples of one node plus a running time-weighted
/// utilization integral.
#[derive(Debug, Default)]
pub struct ResourceSeries {
    points: Vec<ResourcePoint>,
    consumed: f64,
    last_utilization: f64,
    last_time: f64,
}

impl ResourceSeries {
    fn record(&mut self, time: f64, point: ResourcePoint) {
        self.consumed += self.last_utilization * (time - self.last_time);
        self.last_utilization = point.utilization;
        self.last_time = time;
        self.points.push(point);
    }

    pub fn points(&self) -> &[ResourcePoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&ResourcePoint> {
        self.points.last()
    }

    /// Time-weighted mean utilization from the start of the series up to
    /// `horizon` seconds.
    pub fn mean_utilization(&self, horizon: f64) -> f64 {
        if horizon <= 0.0 {
            return 0.0;
        }
        let tail = self.last_utilization * (horizon - self.last_time).max(0.0);
        (self.consumed + tail) / horizon
    }
}

#[derive(Default)]
pub struct Monitoring {
    series: FxHashMap<String, ResourceSeries>,
}

impl Monitoring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        time: Instant,
        name: &str,
        allocated: f64,
        utilization: f64,
        power: Option<PowerSample>,
    ) {
        let time = time.as_secs_f64();
        self.series.entry(name.to_owned()).or_default().record(
            time,
            ResourcePoint {
                time,
                allocated,
                utilization,
                power: power.map(|s| s.power),
            },
        );
    }

    pub fn series(&self, name: &str) -> Option<&ResourceSeries> {
        self.series.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.series.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_utilization_is_time_weighted() {
        let mut monitoring = Monitoring::new();
        monitoring.record(Instant::ZERO, "cpu", 50.0, 0.5, None);
        monitoring.record(Instant::from_secs(5), "cpu", 0.0, 0.0, None);

        let series = monitoring.series("cpu").unwrap();
        // 0.5 for five seconds, then idle for five
        assert!((series.mean_utilization(10.0) - 0.25).abs() < 1e-9);
        assert_eq!(series.points().len(), 2);
    }

    #[test]
    fn last_point_keeps_power() {
        let mut monitoring = Monitoring::new();
        monitoring.record(
            Instant::ZERO,
            "cpu",
            100.0,
            1.0,
            Some(PowerSample {
                utilization: 1.0,
                power: 350.0,
            }),
        );
        assert_eq!(
            monitoring.series("cpu").unwrap().last().unwrap().power,
            Some(350.0)
        );
    }
}
