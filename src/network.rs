use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::activations::Activation;
use crate::error::{HydraError, Result};
use crate::layers::DenseLayer;
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A feed-forward stack of dense layers trained by mean-squared error.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// Build a network from consecutive layer sizes; `activations` has one
    /// entry per layer, i.e. `layer_sizes.len() - 1` entries.
    pub fn new(layer_sizes: &[usize], activations: &[Activation], optimizer: OptimizerWrapper) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(HydraError::invalid_parameter(
                "layer_sizes",
                "must contain at least input and output sizes",
            ));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(HydraError::InvalidParameter {
                name: "activations".to_string(),
                reason: format!("expected {} activations, got {}", layer_sizes.len() - 1, activations.len()),
            });
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation))
            .collect();

        Ok(NeuralNetwork { layers, optimizer })
    }

    /// ReLU hidden layers and a linear output layer.
    pub fn regression(layer_sizes: &[usize], optimizer: OptimizerWrapper) -> Result<Self> {
        Self::regression_with(layer_sizes, Activation::Relu, optimizer)
    }

    /// `hidden` on every hidden layer and a linear output layer.
    pub fn regression_with(layer_sizes: &[usize], hidden: Activation, optimizer: OptimizerWrapper) -> Result<Self> {
        let mut activations = vec![hidden; layer_sizes.len().saturating_sub(2)];
        activations.push(Activation::Linear);
        Self::new(layer_sizes, &activations, optimizer)
    }

    pub fn with_layers(mut self, layers: Vec<DenseLayer>) -> Self {
        self.layers = layers;
        self
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        if inputs.ncols() != self.input_size() {
            return Err(HydraError::shape_mismatch(
                format!("(batch, {})", self.input_size()),
                format!("{:?}", inputs.dim()),
            ));
        }
        let mut current = inputs.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_batch(current.view());
        }
        Ok(current)
    }

    pub fn forward(&mut self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        let output = self.forward_batch(input.insert_axis(Axis(0)))?;
        Ok(output.index_axis_move(Axis(0), 0))
    }

    /// Backpropagate `output_errors` through the cached forward pass.
    /// Returns per-layer (weight, bias) gradients and the error at the input.
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Vec<(Array2<f32>, Array1<f32>)>, Array2<f32>)> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();
        for layer in self.layers.iter().rev() {
            let grads = layer.backward_batch(current_error.view())?;
            gradients.push((grads.weights, grads.biases));
            current_error = grads.input_error;
        }
        gradients.reverse();
        Ok((gradients, current_error))
    }

    /// One gradient step towards `targets`. Returns the batch MSE before the step.
    pub fn train_batch(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>, learning_rate: f32) -> Result<f32> {
        let outputs = self.forward_batch(inputs)?;
        if outputs.dim() != targets.dim() {
            return Err(HydraError::shape_mismatch(
                format!("{:?}", outputs.dim()),
                format!("{:?}", targets.dim()),
            ));
        }

        let batch_size = inputs.nrows().max(1) as f32;
        let errors = &outputs - &targets;
        let loss = errors.mapv(|e| e * e).mean().unwrap_or(0.0);
        let (gradients, _) = self.backward_batch((errors / batch_size).view())?;

        self.optimizer.begin_step();
        for (slot, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            self.optimizer.update_weights(slot, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(slot, &mut layer.biases, &bias_gradients, learning_rate);
        }
        Ok(loss)
    }

    /// Gradient of `output_weights . forward(input)` with respect to `input`.
    pub fn input_gradient(&mut self, input: ArrayView1<f32>, output_weights: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.forward(input)?;
        if output_weights.len() != self.output_size() {
            return Err(HydraError::shape_mismatch(
                format!("({},)", self.output_size()),
                format!("({},)", output_weights.len()),
            ));
        }
        let (_, input_error) = self.backward_batch(output_weights.insert_axis(Axis(0)))?;
        Ok(input_error.index_axis_move(Axis(0), 0))
    }

    /// Overwrite this network's parameters with `other`'s. Optimizer state is kept.
    pub fn copy_weights_from(&mut self, other: &NeuralNetwork) -> Result<()> {
        if self.layers.len() != other.layers.len() {
            return Err(HydraError::shape_mismatch(
                format!("{} layers", self.layers.len()),
                format!("{} layers", other.layers.len()),
            ));
        }
        for (mine, theirs) in self.layers.iter_mut().zip(&other.layers) {
            if mine.weights.dim() != theirs.weights.dim() {
                return Err(HydraError::shape_mismatch(
                    format!("{:?}", mine.weights.dim()),
                    format!("{:?}", theirs.weights.dim()),
                ));
            }
            mine.weights.assign(&theirs.weights);
            mine.biases.assign(&theirs.biases);
        }
        Ok(())
    }
}
