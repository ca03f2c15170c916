use serde::{Deserialize, Serialize};

/// Step size handed to every head's optimizer, indexed by the decision step
/// at which `fit` runs. Serialized by variant name inside `NetworkConfig`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LearningRateScheduler {
    Constant { lr: f32 },

    /// Multiplied by `decay_rate` once per `step_size` steps.
    StepDecay {
        initial_lr: f32,
        decay_rate: f32,
        step_size: usize,
    },

    /// Multiplied by `decay_rate` on every step.
    ExponentialDecay { initial_lr: f32, decay_rate: f32 },

    /// Interpolates towards `final_lr`, reached at `max_steps` and held after.
    LinearDecay {
        initial_lr: f32,
        final_lr: f32,
        max_steps: usize,
    },
}

impl LearningRateScheduler {
    pub fn rate_at(&self, step: usize) -> f32 {
        match self {
            LearningRateScheduler::Constant { lr } => *lr,

            LearningRateScheduler::StepDecay { initial_lr, decay_rate, step_size } => {
                // a zero step_size decays every step
                let decays = (step / (*step_size).max(1)) as f32;
                initial_lr * decay_rate.powf(decays)
            }

            LearningRateScheduler::ExponentialDecay { initial_lr, decay_rate } => {
                initial_lr * decay_rate.powf(step as f32)
            }

            LearningRateScheduler::LinearDecay { initial_lr, final_lr, max_steps } => {
                if step >= *max_steps {
                    *final_lr
                } else {
                    let progress = step as f32 / *max_steps as f32;
                    initial_lr * (1.0 - progress) + final_lr * progress
                }
            }
        }
    }

    pub fn constant(lr: f32) -> Self {
        LearningRateScheduler::Constant { lr }
    }

    pub fn step_decay(initial_lr: f32, decay_rate: f32, step_size: usize) -> Self {
        LearningRateScheduler::StepDecay {
            initial_lr,
            decay_rate,
            step_size,
        }
    }
}

impl Default for LearningRateScheduler {
    fn default() -> Self {
        Self::constant(0.001)
    }
}
