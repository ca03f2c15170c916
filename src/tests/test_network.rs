use approx::assert_relative_eq;
use ndarray::{array, Array2};

use crate::activations::Activation;
use crate::error::HydraError;
use crate::layers::DenseLayer;
use crate::network::NeuralNetwork;
use crate::optimizer::{Adam, OptimizerWrapper, SGD};

fn sgd() -> OptimizerWrapper {
    OptimizerWrapper::SGD(SGD::new())
}

/// Inputs on a grid over [0, 1]^2 and targets of `x0 + 2 * x1`.
fn linear_data() -> (Array2<f32>, Array2<f32>) {
    let inputs = Array2::from_shape_fn((16, 2), |(i, j)| if j == 0 { (i % 4) as f32 / 3.0 } else { (i / 4) as f32 / 3.0 });
    let targets = Array2::from_shape_fn((16, 1), |(i, _)| inputs[[i, 0]] + 2.0 * inputs[[i, 1]]);
    (inputs, targets)
}

#[test]
fn test_network_shapes() {
    let network = NeuralNetwork::regression(&[4, 8, 3], sgd()).unwrap();
    assert_eq!(network.layers.len(), 2);
    assert_eq!(network.input_size(), 4);
    assert_eq!(network.output_size(), 3);
    assert_eq!(network.layers[0].activation, Activation::Relu);
    assert_eq!(network.layers[1].activation, Activation::Linear);
}

#[test]
fn test_network_rejects_bad_layout() {
    assert!(NeuralNetwork::regression(&[4], sgd()).is_err());
    assert!(NeuralNetwork::new(&[4, 2], &[], sgd()).is_err());
}

#[test]
fn test_forward_with_fixed_weights() {
    let layer = DenseLayer::new(2, 1, Activation::Linear)
        .with_weights(array![[1.0], [2.0]])
        .unwrap()
        .with_biases(array![0.5])
        .unwrap();
    let mut network = NeuralNetwork::regression(&[2, 1], sgd()).unwrap().with_layers(vec![layer]);

    let output = network.forward(array![1.0, 1.0].view()).unwrap();
    assert_relative_eq!(output[0], 3.5);

    let batch = network.forward_batch(array![[0.0, 0.0], [1.0, 0.0]].view()).unwrap();
    assert_eq!(batch.dim(), (2, 1));
    assert_relative_eq!(batch[[1, 0]], 1.5);
}

#[test]
fn test_with_weights_rejects_wrong_shape() {
    let result = DenseLayer::new(2, 1, Activation::Linear).with_weights(array![[1.0, 2.0]]);
    assert!(matches!(result, Err(HydraError::ShapeMismatch { .. })));
}

#[test]
fn test_forward_rejects_wrong_input_width() {
    let mut network = NeuralNetwork::regression(&[2, 3], sgd()).unwrap();
    let result = network.forward(array![1.0, 2.0, 3.0].view());
    assert!(matches!(result, Err(HydraError::ShapeMismatch { .. })));
}

#[test]
fn test_train_batch_reduces_error() {
    let (inputs, targets) = linear_data();
    let mut network = NeuralNetwork::regression(&[2, 1], sgd()).unwrap();

    let first = network.train_batch(inputs.view(), targets.view(), 0.5).unwrap();
    let mut last = first;
    for _ in 0..300 {
        last = network.train_batch(inputs.view(), targets.view(), 0.5).unwrap();
    }
    assert!(last < first * 0.1, "loss went from {} to {}", first, last);
}

#[test]
fn test_train_batch_with_adam() {
    let (inputs, targets) = linear_data();
    let mut network = NeuralNetwork::regression(&[2, 1], OptimizerWrapper::Adam(Adam::default())).unwrap();

    let first = network.train_batch(inputs.view(), targets.view(), 0.05).unwrap();
    let mut last = first;
    for _ in 0..300 {
        last = network.train_batch(inputs.view(), targets.view(), 0.05).unwrap();
    }
    assert!(last < first, "loss went from {} to {}", first, last);
}

#[test]
fn test_train_batch_rejects_mismatched_targets() {
    let (inputs, _) = linear_data();
    let mut network = NeuralNetwork::regression(&[2, 1], sgd()).unwrap();
    let targets: Array2<f32> = Array2::zeros((16, 2));
    let result = network.train_batch(inputs.view(), targets.view(), 0.1);
    assert!(matches!(result, Err(HydraError::ShapeMismatch { .. })));
}

#[test]
fn test_backward_requires_forward() {
    let layer = DenseLayer::new(2, 1, Activation::Linear);
    let result = layer.backward_batch(array![[1.0]].view());
    assert!(matches!(result, Err(HydraError::StateMissing(_))));
}

#[test]
fn test_copy_weights_from() {
    let mut a = NeuralNetwork::regression(&[3, 4, 2], sgd()).unwrap();
    let mut b = NeuralNetwork::regression(&[3, 4, 2], sgd()).unwrap();
    b.copy_weights_from(&a).unwrap();

    let input = array![0.2, -0.4, 0.9];
    assert_eq!(a.forward(input.view()).unwrap(), b.forward(input.view()).unwrap());

    let mut other = NeuralNetwork::regression(&[3, 2], sgd()).unwrap();
    assert!(other.copy_weights_from(&a).is_err());
}

#[test]
fn test_input_gradient_of_linear_network() {
    let layer = DenseLayer::new(2, 2, Activation::Linear)
        .with_weights(array![[1.0, 3.0], [2.0, 4.0]])
        .unwrap();
    let mut network = NeuralNetwork::regression(&[2, 2], sgd()).unwrap().with_layers(vec![layer]);

    let gradient = network.input_gradient(array![5.0, -5.0].view(), array![0.0, 1.0].view()).unwrap();
    assert_eq!(gradient, array![3.0, 4.0]);

    assert!(network.input_gradient(array![5.0, -5.0].view(), array![1.0].view()).is_err());
}

#[test]
fn test_activation_functions() {
    let pre = array![[-2.0f32, 0.0, 3.0]];
    let apply = |activation: Activation| {
        let mut out = pre.clone();
        activation.apply_batch(&mut out);
        out
    };

    assert_eq!(apply(Activation::Relu), array![[0.0, 0.0, 3.0]]);
    assert_eq!(Activation::Relu.derivative_batch(pre.view()), array![[0.0, 0.0, 1.0]]);

    assert_eq!(apply(Activation::Linear), pre);
    assert_eq!(Activation::Linear.derivative_batch(pre.view()), array![[1.0, 1.0, 1.0]]);

    let sigmoid = apply(Activation::Sigmoid);
    assert_relative_eq!(sigmoid[[0, 1]], 0.5);
    assert_relative_eq!(sigmoid[[0, 0]], 1.0 / (1.0 + 2.0f32.exp()), epsilon = 1e-6);
    assert_relative_eq!(Activation::Sigmoid.derivative_batch(pre.view())[[0, 1]], 0.25);

    let tanh = apply(Activation::Tanh);
    assert_relative_eq!(tanh[[0, 2]], 3.0f32.tanh());
    assert_relative_eq!(Activation::Tanh.derivative_batch(pre.view())[[0, 1]], 1.0);

    let leaky = Activation::LeakyRelu { alpha: 0.1 };
    let out = apply(leaky);
    assert_relative_eq!(out[[0, 0]], -0.2, epsilon = 1e-6);
    assert_relative_eq!(out[[0, 2]], 3.0);
    assert_eq!(leaky.derivative_batch(pre.view()), array![[0.1, 0.1, 1.0]]);
}

#[test]
fn test_regression_with_hidden_activation() {
    let network = NeuralNetwork::regression_with(&[2, 3, 3, 1], Activation::Tanh, sgd()).unwrap();
    let activations: Vec<Activation> = network.layers.iter().map(|layer| layer.activation).collect();
    assert_eq!(activations, vec![Activation::Tanh, Activation::Tanh, Activation::Linear]);
}

#[test]
fn test_train_batch_with_sigmoid_hidden_layer() {
    let (inputs, targets) = linear_data();
    let mut network = NeuralNetwork::regression_with(&[2, 8, 1], Activation::Sigmoid, sgd()).unwrap();

    let first = network.train_batch(inputs.view(), targets.view(), 0.1).unwrap();
    let mut last = first;
    for _ in 0..200 {
        last = network.train_batch(inputs.view(), targets.view(), 0.1).unwrap();
    }
    assert!(last < first, "loss went from {} to {}", first, last);
}
