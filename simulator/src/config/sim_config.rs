//! Declarative simulation configuration.

use serde::{Deserialize, Serialize};

use crate::cpufreq::{ConservativeGovernor, Governor, PerformanceGovernor};
use crate::error::ConfigError;
use crate::flow::SharingDiscipline;
use crate::power::{
    AsymptoticPowerModel, ConstantPowerModel, CubicPowerModel, LinearPowerModel, PowerModel,
    SqrtPowerModel, SquarePowerModel, ZeroIdlePowerModel,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub machines: Vec<GroupMachineConfig>,
}

impl SimulationConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for group in &self.machines {
            if group.name.is_empty() {
                return Err(ConfigError::Validation("machine name is empty".to_owned()));
            }
            if group.cpu.capacity <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "machine {}: cpu capacity must be positive",
                    group.name,
                )));
            }
            if let Some(GovernorConfig::Conservative { step, .. }) = &group.cpu.governor {
                if *step <= 0.0 {
                    return Err(ConfigError::Validation(format!(
                        "machine {}: governor step must be positive",
                        group.name,
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A group of identical machines, expanded `count` times at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMachineConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    pub cpu: CpuConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuConfig {
    /// Hardware ceiling in resource units per second (e.g. MHz).
    pub capacity: f64,
    #[serde(default)]
    pub sharing: SharingDiscipline,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governor: Option<GovernorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<PowerModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GovernorConfig {
    Performance,
    Conservative {
        step: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        up_threshold: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        down_threshold: Option<f64>,
    },
}

impl GovernorConfig {
    pub fn build(&self) -> Box<dyn Governor> {
        match self {
            GovernorConfig::Performance => Box::new(PerformanceGovernor),
            GovernorConfig::Conservative {
                step,
                up_threshold,
                down_threshold,
            } => Box::new(ConservativeGovernor::new(
                *step,
                up_threshold.unwrap_or(ConservativeGovernor::DEFAULT_UP_THRESHOLD),
                down_threshold.unwrap_or(ConservativeGovernor::DEFAULT_DOWN_THRESHOLD),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PowerModelConfig {
    Constant {
        power: f64,
    },
    Linear {
        max: f64,
        idle: f64,
    },
    Square {
        max: f64,
        idle: f64,
    },
    Cubic {
        max: f64,
        idle: f64,
    },
    Sqrt {
        max: f64,
        idle: f64,
    },
    Asymptotic {
        max: f64,
        idle: f64,
        param: f64,
        #[serde(default)]
        dvfs: bool,
    },
    ZeroIdle {
        inner: Box<PowerModelConfig>,
    },
}

impl PowerModelConfig {
    pub fn build(&self) -> Box<dyn PowerModel> {
        match self {
            PowerModelConfig::Constant { power } => Box::new(ConstantPowerModel::new(*power)),
            PowerModelConfig::Linear { max, idle } => Box::new(LinearPowerModel::new(*max, *idle)),
            PowerModelConfig::Square { max, idle } => Box::new(SquarePowerModel::new(*max, *idle)),
            PowerModelConfig::Cubic { max, idle } => Box::new(CubicPowerModel::new(*max, *idle)),
            PowerModelConfig::Sqrt { max, idle } => Box::new(SqrtPowerModel::new(*max, *idle)),
            PowerModelConfig::Asymptotic {
                max,
                idle,
                param,
                dvfs,
            } => Box::new(AsymptoticPowerModel::new(*max, *idle, *param, *dvfs)),
            PowerModelConfig::ZeroIdle { inner } => {
                Box::new(ZeroIdlePowerModel::new(inner.build()))
            }
        }
    }
}
