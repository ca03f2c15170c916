//! # Value Models
//!
//! The agent talks to its function approximator only through [`ValueModel`]:
//! a multi-head Q-function over a discrete action set, with one head per
//! reward component. [`HraModel`] is the dense-network implementation shipped
//! with the crate; any other backend plugs in by implementing the trait.
//!
//! Tensor layouts:
//! - single state: `(heads, actions)`
//! - batch: `(heads, batch, actions)`

pub mod hra;

use log::warn;
use ndarray::{Array2, Array3, ArrayView1, ArrayView2, ArrayView3};
use std::ops::{Deref, DerefMut};

use crate::error::{HydraError, Result};

pub use hra::HraModel;

/// A trainable multi-head Q-value model.
pub trait ValueModel {
    /// Number of value heads (reward components).
    fn num_heads(&self) -> usize;

    /// Number of discrete actions each head scores.
    fn num_actions(&self) -> usize;

    /// Length of the state vectors the model accepts.
    fn input_size(&self) -> usize;

    /// Best action under the head-summed Q-values, plus the per-head values.
    fn predict(&mut self, state: ArrayView1<f32>) -> Result<(usize, Array2<f32>)>;

    /// Per-head Q-values for a batch of states.
    fn predict_batch(&mut self, states: ArrayView2<f32>) -> Result<Array3<f32>>;

    /// One optimization pass towards `targets`. `step` is the agent's decision
    /// counter, available for internal schedules such as learning-rate decay.
    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView3<f32>, step: usize) -> Result<()>;

    /// Copy every weight of `other` into `self`.
    fn replace(&mut self, other: &Self) -> Result<()>
    where
        Self: Sized;

    /// Persist the weights to durable storage.
    fn save_network(&self) -> Result<()>;

    /// Isolate `head`: stash the current weights and silence every other head.
    fn clear_weights(&mut self, head: usize) -> Result<()>;

    /// Undo `clear_weights`. A no-op when nothing is stashed.
    fn restore_weights(&mut self) -> Result<()>;
}

/// Evaluation model and its periodically synchronized target copy.
#[derive(Clone, Debug)]
pub struct ModelPair<M> {
    pub eval: M,
    pub target: M,
}

impl<M: ValueModel> ModelPair<M> {
    /// Pair two models and hard-sync the target from the evaluation model.
    pub fn new(eval: M, mut target: M) -> Result<Self> {
        let layout = |m: &M| (m.input_size(), m.num_heads(), m.num_actions());
        if layout(&eval) != layout(&target) {
            let describe = |(inputs, heads, actions): (usize, usize, usize)| {
                format!("{} inputs, {} heads x {} actions", inputs, heads, actions)
            };
            return Err(HydraError::shape_mismatch(describe(layout(&eval)), describe(layout(&target))));
        }
        target.replace(&eval)?;
        Ok(ModelPair { eval, target })
    }

    pub fn num_heads(&self) -> usize {
        self.eval.num_heads()
    }

    pub fn num_actions(&self) -> usize {
        self.eval.num_actions()
    }

    pub fn input_size(&self) -> usize {
        self.eval.input_size()
    }

    /// Hard-copy the evaluation weights into the target model.
    pub fn sync_target(&mut self) -> Result<()> {
        self.target.replace(&self.eval)
    }

    pub fn save(&self) -> Result<()> {
        self.eval.save_network()?;
        self.target.save_network()
    }
}

/// Scoped head isolation.
///
/// Creating the guard calls `clear_weights(head)`; dropping it calls
/// `restore_weights()`, on every exit path. The guard holds the model's only
/// mutable borrow, so nothing else can read or write the weights meanwhile.
pub struct IsolatedHead<'a, M: ValueModel + ?Sized> {
    model: &'a mut M,
    head: usize,
}

impl<'a, M: ValueModel + ?Sized> IsolatedHead<'a, M> {
    pub fn new(model: &'a mut M, head: usize) -> Result<Self> {
        if head >= model.num_heads() {
            return Err(HydraError::InvalidParameter {
                name: "head".to_string(),
                reason: format!("{} out of range for {} heads", head, model.num_heads()),
            });
        }
        if let Err(err) = model.clear_weights(head) {
            // clear_weights may have stashed before failing
            let _ = model.restore_weights();
            return Err(err);
        }
        Ok(IsolatedHead { model, head })
    }

    pub fn head(&self) -> usize {
        self.head
    }
}

impl<M: ValueModel + ?Sized> Deref for IsolatedHead<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.model
    }
}

impl<M: ValueModel + ?Sized> DerefMut for IsolatedHead<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        self.model
    }
}

impl<M: ValueModel + ?Sized> Drop for IsolatedHead<'_, M> {
    fn drop(&mut self) {
        if let Err(err) = self.model.restore_weights() {
            warn!("Failed to restore weights after isolating head {}: {}", self.head, err);
        }
    }
}

/// Check a batch tensor against the (heads x batch x actions) layout.
pub fn check_layout(tensor: ArrayView3<f32>, heads: usize, batch: usize, actions: usize) -> Result<()> {
    if tensor.dim() != (heads, batch, actions) {
        return Err(HydraError::shape_mismatch(
            format!("({}, {}, {}) (heads x batch x actions)", heads, batch, actions),
            format!("{:?}", tensor.dim()),
        ));
    }
    Ok(())
}
