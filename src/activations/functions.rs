use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Element-wise nonlinearity applied after a dense layer's affine map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Relu,
    Linear,
    Sigmoid,
    Tanh,
    LeakyRelu { alpha: f32 },
}

impl Activation {
    /// Apply the activation to a batch in place.
    pub fn apply_batch(&self, inputs: &mut Array2<f32>) {
        match *self {
            Activation::Relu => inputs.mapv_inplace(|v| v.max(0.0)),
            Activation::Linear => {}
            Activation::Sigmoid => inputs.mapv_inplace(sigmoid),
            Activation::Tanh => inputs.mapv_inplace(f32::tanh),
            Activation::LeakyRelu { alpha } => {
                inputs.mapv_inplace(|v| if v > 0.0 { v } else { alpha * v })
            }
        }
    }

    /// Derivative with respect to the pre-activation values.
    pub fn derivative_batch(&self, pre_activation: ArrayView2<f32>) -> Array2<f32> {
        match *self {
            Activation::Relu => pre_activation.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => Array2::ones(pre_activation.dim()),
            Activation::Sigmoid => pre_activation.mapv(|v| {
                let s = sigmoid(v);
                s * (1.0 - s)
            }),
            Activation::Tanh => pre_activation.mapv(|v| 1.0 - v.tanh().powi(2)),
            Activation::LeakyRelu { alpha } => {
                pre_activation.mapv(|v| if v > 0.0 { 1.0 } else { alpha })
            }
        }
    }
}

fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}
