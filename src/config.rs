//! # Configuration
//!
//! Hyperparameters for the agent (`ReinforceConfig`) and for the multi-head
//! value model (`NetworkConfig`). Both load from JSON and check themselves
//! with `validate()` before an agent or model is built from them.
//!
//! ```rust
//! use hydra::config::NetworkConfig;
//!
//! let config = NetworkConfig::from_json_str(r#"{
//!     "input_shape": 4,
//!     "output_shape": 2,
//!     "networks": [
//!         { "name": "survive", "layers": [32] },
//!         { "name": "collect", "layers": [32] }
//!     ]
//! }"#).unwrap();
//! assert_eq!(config.reward_types(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::activations::Activation;
use crate::error::{HydraError, Result};
use crate::optimizer::LearningRateScheduler;

/// How the replay buffer draws a batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    #[default]
    WithoutReplacement,
    WithReplacement,
}

/// Agent-side hyperparameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinforceConfig {
    pub memory_size: usize,
    pub batch_size: usize,
    pub discount_factor: f32,
    pub starting_epsilon: f32,
    pub decay_rate: f32,
    pub decay_steps: usize,
    /// Target network is replaced every `update_frequency` decision steps
    pub update_frequency: usize,
    pub sampling: SamplingPolicy,
    /// Seed for exploration and replay sampling; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for ReinforceConfig {
    fn default() -> Self {
        ReinforceConfig {
            memory_size: 10_000,
            batch_size: 32,
            discount_factor: 0.99,
            starting_epsilon: 1.0,
            decay_rate: 0.96,
            decay_steps: 250,
            update_frequency: 100,
            sampling: SamplingPolicy::WithoutReplacement,
            seed: None,
        }
    }
}

impl ReinforceConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory_size == 0 {
            return Err(HydraError::invalid_parameter("memory_size", "must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(HydraError::invalid_parameter("batch_size", "must be greater than 0"));
        }
        if self.batch_size > self.memory_size {
            return Err(HydraError::invalid_parameter(
                "batch_size",
                "must not exceed memory_size",
            ));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(HydraError::invalid_parameter("discount_factor", "must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.starting_epsilon) {
            return Err(HydraError::invalid_parameter("starting_epsilon", "must be in [0, 1]"));
        }
        if !(self.decay_rate > 0.0 && self.decay_rate <= 1.0) {
            return Err(HydraError::invalid_parameter("decay_rate", "must be in (0, 1]"));
        }
        if self.decay_steps == 0 {
            return Err(HydraError::invalid_parameter("decay_steps", "must be greater than 0"));
        }
        if self.update_frequency == 0 {
            return Err(HydraError::invalid_parameter(
                "update_frequency",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Optimizer used by every head of the value model
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    #[default]
    Sgd,
    Adam,
}

/// One value head: a name for its reward component, its hidden layer sizes
/// and the activation of those hidden layers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadConfig {
    pub name: String,
    #[serde(default)]
    pub layers: Vec<usize>,
    #[serde(default)]
    pub activation: Activation,
}

/// Model-side hyperparameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub input_shape: usize,
    /// Number of discrete actions
    pub output_shape: usize,
    pub networks: Vec<HeadConfig>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: LearningRateScheduler,
    #[serde(default)]
    pub optimizer: OptimizerKind,
    #[serde(default = "default_network_path")]
    pub network_path: PathBuf,
    #[serde(default)]
    pub restore_network: bool,
    #[serde(default = "default_true")]
    pub save_network: bool,
}

fn default_learning_rate() -> LearningRateScheduler {
    LearningRateScheduler::constant(0.001)
}

fn default_network_path() -> PathBuf {
    PathBuf::from("saved_models")
}

fn default_true() -> bool {
    true
}

impl NetworkConfig {
    /// Config with one head per name, each with the given hidden sizes.
    pub fn new(input_shape: usize, output_shape: usize, heads: &[&str], hidden: &[usize]) -> Self {
        NetworkConfig {
            input_shape,
            output_shape,
            networks: heads
                .iter()
                .map(|name| HeadConfig {
                    name: name.to_string(),
                    layers: hidden.to_vec(),
                    activation: Activation::default(),
                })
                .collect(),
            learning_rate: default_learning_rate(),
            optimizer: OptimizerKind::default(),
            network_path: default_network_path(),
            restore_network: false,
            save_network: true,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Number of reward components, one per configured head.
    pub fn reward_types(&self) -> usize {
        self.networks.len()
    }

    /// Full layer sizes of one head, input and output included.
    pub fn layer_sizes(&self, head: usize) -> Option<Vec<usize>> {
        self.networks.get(head).map(|h| {
            let mut sizes = Vec::with_capacity(h.layers.len() + 2);
            sizes.push(self.input_shape);
            sizes.extend_from_slice(&h.layers);
            sizes.push(self.output_shape);
            sizes
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_shape == 0 {
            return Err(HydraError::invalid_parameter("input_shape", "must be greater than 0"));
        }
        if self.output_shape == 0 {
            return Err(HydraError::invalid_parameter("output_shape", "must be greater than 0"));
        }
        if self.networks.is_empty() {
            return Err(HydraError::invalid_parameter(
                "networks",
                "at least one value head is required",
            ));
        }
        for head in &self.networks {
            if head.layers.iter().any(|&size| size == 0) {
                return Err(HydraError::InvalidParameter {
                    name: format!("networks.{}.layers", head.name),
                    reason: "layer sizes must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }
}
