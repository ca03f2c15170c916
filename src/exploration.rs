use rand::Rng;
use rand_distr::{Bernoulli, Distribution};
use serde::{Deserialize, Serialize};

use crate::config::ReinforceConfig;

/// Lower bound of the exploration probability.
pub const MIN_EPSILON: f32 = 0.1;

/// Exponentially decaying epsilon-greedy schedule:
/// `epsilon = max(0.1, starting_epsilon * decay_rate^(step / decay_steps))`.
///
/// The value depends on the step alone, so the schedule can be replayed from
/// any step counter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSchedule {
    pub starting_epsilon: f32,
    pub decay_rate: f32,
    pub decay_steps: usize,
}

impl ExplorationSchedule {
    pub fn new(starting_epsilon: f32, decay_rate: f32, decay_steps: usize) -> Self {
        ExplorationSchedule {
            starting_epsilon,
            decay_rate,
            decay_steps,
        }
    }

    pub fn from_config(config: &ReinforceConfig) -> Self {
        Self::new(config.starting_epsilon, config.decay_rate, config.decay_steps)
    }

    /// Probability of taking a random action at `step`.
    pub fn probability(&self, step: usize) -> f32 {
        let exponent = step as f64 / self.decay_steps.max(1) as f64;
        let decayed = self.starting_epsilon as f64 * (self.decay_rate as f64).powf(exponent);
        (decayed as f32).max(MIN_EPSILON).min(1.0)
    }

    /// Draw whether to explore with probability `epsilon`.
    pub fn should_explore<R: Rng + ?Sized>(&self, epsilon: f32, rng: &mut R) -> bool {
        match Bernoulli::new(epsilon.clamp(0.0, 1.0) as f64) {
            Ok(coin) => coin.sample(rng),
            Err(_) => false,
        }
    }
}
