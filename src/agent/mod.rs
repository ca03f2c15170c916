//! # Hybrid Reward Architecture Agent
//!
//! The agent decomposes the reward into components and learns one value head
//! per component. Action selection sums the heads' Q-values; each head is
//! trained only on its own reward component.
//!
//! ## Decision loop
//!
//! 1. `predict(state)` stores the previous transition, picks an action
//!    (epsilon-greedy while learning), syncs the target model every
//!    `update_frequency` steps and runs a learning update.
//! 2. `reward(&[r_0, .., r_n])` accumulates the decomposed reward of the step.
//! 3. `end_episode(terminal_state)` stores the terminal transition and
//!    updates once more.
//!
//! ## Learning update
//!
//! Once the replay buffer holds `batch_size` experiences, every decision
//! samples a batch and trains the evaluation model towards
//! `reward[h] + discount * mean_a Q_target[h](next_state, a)` at the action
//! taken, leaving every other entry at the model's own prediction.
//!
//! ```rust
//! use hydra::agent::HraAgentBuilder;
//! use hydra::config::{NetworkConfig, ReinforceConfig};
//! use hydra::model::{HraModel, ModelPair};
//! use ndarray::array;
//!
//! let mut network = NetworkConfig::new(2, 2, &["food", "danger"], &[8]);
//! network.save_network = false;
//! let models = ModelPair::new(
//!     HraModel::new("pacman_eval", &network).unwrap(),
//!     HraModel::new("pacman_target", &network).unwrap(),
//! ).unwrap();
//!
//! let mut agent = HraAgentBuilder::new("pacman")
//!     .choices(vec![0usize, 1])
//!     .models(models)
//!     .config(ReinforceConfig { batch_size: 4, memory_size: 100, ..Default::default() })
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let decision = agent.predict(array![0.3, -0.2].view()).unwrap();
//! assert!(decision.action < 2);
//! agent.reward(&[1.0, 0.0]).unwrap();
//! ```

mod builder;
mod hra;

pub use builder::HraAgentBuilder;
pub use hra::{td_targets, Decision, HraAgent};
