use ndarray::Array1;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::SamplingPolicy;
use crate::error::{HydraError, Result};

/// One stored transition with its decomposed reward.
///
/// `reward` holds one entry per reward component, each accumulated since the
/// previous decision step. Fields are read-only once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    state: Array1<f32>,
    action: usize,
    reward: Vec<f32>,
    next_state: Array1<f32>,
    is_terminal: bool,
}

impl Experience {
    pub fn new(
        state: Array1<f32>,
        action: usize,
        reward: Vec<f32>,
        next_state: Array1<f32>,
        is_terminal: bool,
    ) -> Self {
        Experience {
            state,
            action,
            reward,
            next_state,
            is_terminal,
        }
    }

    pub fn state(&self) -> &Array1<f32> {
        &self.state
    }

    pub fn action(&self) -> usize {
        self.action
    }

    pub fn reward(&self) -> &[f32] {
        &self.reward
    }

    pub fn next_state(&self) -> &Array1<f32> {
        &self.next_state
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }
}

/// Bounded FIFO store of experiences with uniform random sampling.
///
/// Once `capacity` is reached, every insert evicts the oldest experience.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
    policy: SamplingPolicy,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, SamplingPolicy::default())
    }

    pub fn with_policy(capacity: usize, policy: SamplingPolicy) -> Self {
        ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    pub fn add(&mut self, experience: Experience) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(experience);
    }

    /// Draw `batch_size` experiences uniformly at random. Sampling does not
    /// remove anything from the buffer.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Experience>> {
        let available = self.buffer.len();
        if available < batch_size || available == 0 {
            return Err(HydraError::InsufficientData {
                requested: batch_size,
                available,
            });
        }

        let batch = match self.policy {
            SamplingPolicy::WithoutReplacement => index::sample(rng, available, batch_size)
                .into_iter()
                .map(|i| &self.buffer[i])
                .collect(),
            SamplingPolicy::WithReplacement => (0..batch_size)
                .map(|_| &self.buffer[rng.gen_range(0..available)])
                .collect(),
        };
        Ok(batch)
    }

    pub fn current_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Stored experiences, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.buffer.iter()
    }
}
