#![doc = include_str!("../readme.md")]

pub mod actor;
pub mod config;
pub mod cpufreq;
pub mod error;
pub mod flow;
pub mod machine;
pub mod monitoring;
pub mod portfolio;
pub mod power;
pub mod simulation;

pub use config::sim_config::{
    CpuConfig, GovernorConfig, GroupMachineConfig, PowerModelConfig, SimulationConfig,
};
pub use cpufreq::{ConservativeGovernor, Governor, PerformanceGovernor, ScalingDriver};
pub use error::{ConfigError, FlowError};
pub use flow::{FlowEngine, FlowFragment, NodeId, NodeView, SharingDiscipline};
pub use machine::{build_machine, Machine, MachineConfig};
pub use monitoring::Monitoring;
pub use portfolio::PortfolioLauncher;
pub use power::{PowerModel, PowerSample};
pub use simulation::FlowSimulation;
