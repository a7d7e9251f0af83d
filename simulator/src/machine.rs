//! Building simulated machines out of flow nodes.

use crate::config::sim_config::{CpuConfig, GroupMachineConfig};
use crate::cpufreq::{PerformanceGovernor, ScalingDriver};
use crate::error::FlowError;
use crate::flow::{FlowEngine, NodeId};
use crate::power::ConstantPowerModel;

/// One built machine: a CPU source feeding a multiplexer workloads
/// attach to.
#[derive(Debug, Clone)]
pub struct Machine {
    pub name: String,
    pub source: NodeId,
    pub mux: NodeId,
}

#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub name: String,
    pub cpu: CpuConfig,
}

impl MachineConfig {
    pub fn from_group_config(group: &GroupMachineConfig, index: Option<u64>) -> Self {
        let name = match index {
            Some(index) => format!("{}-{}", group.name, index),
            None => group.name.clone(),
        };
        Self {
            name,
            cpu: group.cpu.clone(),
        }
    }
}

/// Wire one machine into the engine: a source (scaled if the config
/// names a governor or power model) connected to a fresh multiplexer.
pub fn build_machine(engine: &mut FlowEngine, config: &MachineConfig) -> Result<Machine, FlowError> {
    let source_name = format!("cpu-{}", config.name);
    let source = if config.cpu.governor.is_some() || config.cpu.power.is_some() {
        let governor = config
            .cpu
            .governor
            .as_ref()
            .map(|g| g.build())
            .unwrap_or_else(|| Box::new(PerformanceGovernor));
        let power_model = config
            .cpu
            .power
            .as_ref()
            .map(|p| p.build())
            .unwrap_or_else(|| Box::new(ConstantPowerModel::new(0.0)));
        engine.add_scaled_source(
            &source_name,
            config.cpu.capacity,
            ScalingDriver::new(governor, power_model),
        )
    } else {
        engine.add_source(&source_name, config.cpu.capacity)
    };

    let mux = engine.add_multiplexer(&format!("mux-{}", config.name), config.cpu.sharing);
    engine.connect(source, mux)?;

    Ok(Machine {
        name: config.name.clone(),
        source,
        mux,
    })
}
