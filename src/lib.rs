//! # Hydra - Hybrid Reward Architecture for Reinforcement Learning
//!
//! Hydra implements the Hybrid Reward Architecture (HRA): a Q-learning agent
//! whose reward is decomposed into independent components, each learned by
//! its own value head. Actions are picked on the sum of the per-head
//! Q-values, while every head is trained only against its own reward.
//!
//! ## Key Features
//!
//! - **Decomposed rewards**: one value head per reward component
//! - **Experience replay**: bounded FIFO buffer with uniform sampling
//! - **Exploration**: epsilon-greedy with exponential decay and a 0.1 floor
//! - **Target network**: hard synchronization every `update_frequency` steps
//! - **Explanations**: per-head saliency maps for every candidate action
//! - **Pluggable backends**: any [`model::ValueModel`] can drive the agent
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hydra::agent::HraAgent;
//! use hydra::config::{NetworkConfig, ReinforceConfig};
//! use ndarray::array;
//!
//! let network = NetworkConfig::from_json_file("network.json").unwrap();
//! let reinforce = ReinforceConfig::from_json_file("reinforce.json").unwrap();
//! let mut agent = HraAgent::from_configs("pacman", vec!["up", "down"], &network, reinforce).unwrap();
//!
//! let decision = agent.predict(array![0.0, 1.0].view()).unwrap();
//! agent.reward(&[1.0, 0.0]).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions for the dense heads
//! - [`agent`] - The HRA agent and its builder
//! - [`config`] - Agent and model hyperparameters
//! - [`error`] - Error types and result handling
//! - [`exploration`] - Epsilon decay schedule
//! - [`layers`] - Dense layers
//! - [`model`] - Value model contract and the dense multi-head model
//! - [`network`] - Feed-forward networks
//! - [`optimizer`] - Optimizers and learning-rate schedules
//! - [`replay_buffer`] - Experience replay
//! - [`saliency`] - Attribution maps for explanations
//! - [`tensorboard`] - Scalar instrumentation sinks

pub mod activations;
pub mod agent;
pub mod config;
pub mod error;
pub mod exploration;
pub mod layers;
pub mod model;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod saliency;
pub mod tensorboard;

pub use error::{HydraError, Result};

#[cfg(test)]
mod tests;
