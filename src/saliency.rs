//! # Saliency
//!
//! Attribution maps showing which input features drove each candidate action.
//! For every action the agent asks the provider once per isolated head and
//! once for the full model, giving `heads + 1` maps per action.

use ndarray::{Array1, ArrayView1};

use crate::error::Result;
use crate::model::{HraModel, IsolatedHead, ValueModel};

/// Attribution maps for one candidate action.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionSaliency {
    pub action: usize,
    /// One map per head, computed with every other head silenced
    pub per_head: Vec<Array1<f32>>,
    /// Map for the head-summed output
    pub overall: Array1<f32>,
}

/// Computes an input-shaped attribution map for one action.
pub trait SaliencyProvider<M: ValueModel> {
    fn saliency(&self, model: &mut M, state: ArrayView1<f32>, action: usize) -> Result<Array1<f32>>;
}

/// Input-gradient saliency for [`HraModel`].
///
/// With `times_input` the gradient is multiplied element-wise by the state.
#[derive(Clone, Copy, Debug, Default)]
pub struct GradientSaliency {
    pub times_input: bool,
}

impl GradientSaliency {
    pub fn new() -> Self {
        GradientSaliency { times_input: false }
    }

    pub fn times_input() -> Self {
        GradientSaliency { times_input: true }
    }
}

impl SaliencyProvider<HraModel> for GradientSaliency {
    fn saliency(&self, model: &mut HraModel, state: ArrayView1<f32>, action: usize) -> Result<Array1<f32>> {
        let gradient = model.input_gradient(state, action)?;
        if self.times_input {
            Ok(gradient * &state)
        } else {
            Ok(gradient)
        }
    }
}

/// Saliency maps for every action of `model`.
///
/// Each per-head map is computed inside an [`IsolatedHead`] guard, so the
/// model's weights are restored even when the provider fails.
pub fn explain<M, P>(provider: &P, model: &mut M, state: ArrayView1<f32>) -> Result<Vec<ActionSaliency>>
where
    M: ValueModel,
    P: SaliencyProvider<M> + ?Sized,
{
    let mut saliencies = Vec::with_capacity(model.num_actions());
    for action in 0..model.num_actions() {
        let mut per_head = Vec::with_capacity(model.num_heads());
        for head in 0..model.num_heads() {
            let mut isolated = IsolatedHead::new(&mut *model, head)?;
            per_head.push(provider.saliency(&mut *isolated, state, action)?);
        }
        let overall = provider.saliency(model, state, action)?;
        saliencies.push(ActionSaliency {
            action,
            per_head,
            overall,
        });
    }
    Ok(saliencies)
}
