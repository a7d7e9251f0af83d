//! Frequency scaling: governors decide a target capacity from observed
//! load, drivers apply it and report power draw.

pub mod driver;
pub mod governor;

pub use driver::{ScalingContext, ScalingDriver};
pub use governor::{ConservativeGovernor, Governor, PerformanceGovernor};
