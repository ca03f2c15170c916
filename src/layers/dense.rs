use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Deserialize, Serialize};

use crate::activations::Activation;
use crate::error::{HydraError, Result};

/// Gradients of one dense layer for a batch
pub struct DenseGradients {
    /// Error propagated to the layer's inputs, shape (batch, input_size)
    pub input_error: Array2<f32>,
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// A fully connected layer: `activation(inputs . weights + biases)`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Weights start uniform in [-0.1, 0.1), biases at zero.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Self {
        let weights = Array2::random((input_size, output_size), Uniform::new(-0.1, 0.1));
        let biases = Array1::zeros(output_size);
        DenseLayer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Result<Self> {
        if weights.dim() != self.weights.dim() {
            return Err(HydraError::shape_mismatch(
                format!("{:?}", self.weights.dim()),
                format!("{:?}", weights.dim()),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Result<Self> {
        if biases.dim() != self.biases.dim() {
            return Err(HydraError::shape_mismatch(
                format!("{:?}", self.biases.dim()),
                format!("{:?}", biases.dim()),
            ));
        }
        self.biases = biases;
        Ok(self)
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    /// Forward pass for a batch, caching what `backward_batch` needs.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        self.inputs = Some(inputs.to_owned());
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.pre_activation_output = Some(outputs.clone());
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Backward pass for the batch seen by the last `forward_batch`.
    pub fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<DenseGradients> {
        let (pre_activation, inputs) = match (&self.pre_activation_output, &self.inputs) {
            (Some(pre), Some(inputs)) => (pre, inputs),
            _ => {
                return Err(HydraError::StateMissing(
                    "forward_batch() must be called before backward_batch()".to_string(),
                ))
            }
        };
        if output_errors.dim() != pre_activation.dim() {
            return Err(HydraError::shape_mismatch(
                format!("{:?}", pre_activation.dim()),
                format!("{:?}", output_errors.dim()),
            ));
        }

        let adjusted_error = &output_errors * &self.activation.derivative_batch(pre_activation.view());
        Ok(DenseGradients {
            input_error: adjusted_error.dot(&self.weights.t()),
            weights: inputs.t().dot(&adjusted_error),
            biases: adjusted_error.sum_axis(Axis(0)),
        })
    }

    /// Zero the weights and biases in place.
    pub fn clear(&mut self) {
        self.weights.fill(0.0);
        self.biases.fill(0.0);
    }
}
