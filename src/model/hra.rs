use log::debug;
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use std::fs;
use std::path::PathBuf;

use super::{check_layout, ValueModel};
use crate::config::{NetworkConfig, OptimizerKind};
use crate::error::{HydraError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::{Adam, OptimizerWrapper, SGD};

/// Multi-head value model: one independent dense network per reward
/// component, all scoring the same action set.
///
/// # Example
///
/// ```rust
/// use hydra::config::NetworkConfig;
/// use hydra::model::{HraModel, ValueModel};
/// use ndarray::array;
///
/// let mut config = NetworkConfig::new(3, 2, &["distance", "safety"], &[16]);
/// config.save_network = false;
/// let mut model = HraModel::new("demo_eval", &config).unwrap();
///
/// let (action, q_values) = model.predict(array![0.1, 0.2, 0.3].view()).unwrap();
/// assert!(action < 2);
/// assert_eq!(q_values.dim(), (2, 2));
/// ```
#[derive(Clone, Debug)]
pub struct HraModel {
    name: String,
    config: NetworkConfig,
    heads: Vec<NeuralNetwork>,
    stash: Option<Vec<NeuralNetwork>>,
    last_losses: Vec<f32>,
}

impl HraModel {
    /// Build the heads described by `config`, restoring saved weights when
    /// `restore_network` is set and a snapshot exists.
    pub fn new(name: &str, config: &NetworkConfig) -> Result<Self> {
        config.validate()?;

        let mut heads = Vec::with_capacity(config.reward_types());
        for head in 0..config.reward_types() {
            let sizes = config
                .layer_sizes(head)
                .ok_or_else(|| HydraError::invalid_parameter("networks", "missing head"))?;
            let activation = config.networks[head].activation;
            heads.push(NeuralNetwork::regression_with(&sizes, activation, Self::optimizer(config.optimizer))?);
        }

        let mut model = HraModel {
            name: name.to_string(),
            config: config.clone(),
            last_losses: vec![0.0; heads.len()],
            heads,
            stash: None,
        };

        if config.restore_network {
            let path = model.snapshot_path();
            if path.exists() {
                model.load_network()?;
            } else {
                debug!("No saved network at {}, starting {} from scratch", path.display(), name);
            }
        }
        Ok(model)
    }

    fn optimizer(kind: OptimizerKind) -> OptimizerWrapper {
        match kind {
            OptimizerKind::Sgd => OptimizerWrapper::SGD(SGD::new()),
            OptimizerKind::Adam => OptimizerWrapper::Adam(Adam::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn heads(&self) -> &[NeuralNetwork] {
        &self.heads
    }

    pub fn heads_mut(&mut self) -> &mut [NeuralNetwork] {
        &mut self.heads
    }

    /// Per-head MSE from the most recent `fit`.
    pub fn last_losses(&self) -> &[f32] {
        &self.last_losses
    }

    pub fn is_isolated(&self) -> bool {
        self.stash.is_some()
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.config.network_path.join(format!("{}.bin", self.name))
    }

    /// Replace the heads with the snapshot at `snapshot_path()`.
    pub fn load_network(&mut self) -> Result<()> {
        let path = self.snapshot_path();
        let data = fs::read(&path)?;
        let heads: Vec<NeuralNetwork> = bincode::deserialize(&data)?;

        if heads.len() != self.heads.len() {
            return Err(HydraError::shape_mismatch(
                format!("{} heads", self.heads.len()),
                format!("{} heads in {}", heads.len(), path.display()),
            ));
        }
        for (mine, saved) in self.heads.iter_mut().zip(&heads) {
            mine.copy_weights_from(saved)?;
        }
        debug!("Restored {} from {}", self.name, path.display());
        Ok(())
    }

    /// Gradient of the head-summed Q-value of `action` with respect to the input.
    pub fn input_gradient(&mut self, state: ArrayView1<f32>, action: usize) -> Result<Array1<f32>> {
        if action >= self.num_actions() {
            return Err(HydraError::InvalidAction {
                action,
                num_actions: self.num_actions(),
            });
        }
        let mut selector = Array1::zeros(self.num_actions());
        selector[action] = 1.0;

        let mut gradient = Array1::zeros(state.len());
        for head in &mut self.heads {
            gradient += &head.input_gradient(state, selector.view())?;
        }
        Ok(gradient)
    }
}

/// Index of the largest value; the first one wins ties, NaN never wins.
pub(crate) fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

impl ValueModel for HraModel {
    fn num_heads(&self) -> usize {
        self.heads.len()
    }

    fn num_actions(&self) -> usize {
        self.config.output_shape
    }

    fn input_size(&self) -> usize {
        self.config.input_shape
    }

    fn predict(&mut self, state: ArrayView1<f32>) -> Result<(usize, Array2<f32>)> {
        let mut q_values = Array2::zeros((self.num_heads(), self.num_actions()));
        for (h, head) in self.heads.iter_mut().enumerate() {
            q_values.row_mut(h).assign(&head.forward(state)?);
        }
        let combined = q_values.sum_axis(Axis(0));
        let action = argmax(combined.view())
            .ok_or_else(|| HydraError::invalid_parameter("q_values", "no finite Q-value to choose from"))?;
        Ok((action, q_values))
    }

    fn predict_batch(&mut self, states: ArrayView2<f32>) -> Result<Array3<f32>> {
        let mut q_values = Array3::zeros((self.num_heads(), states.nrows(), self.num_actions()));
        for (h, head) in self.heads.iter_mut().enumerate() {
            q_values.index_axis_mut(Axis(0), h).assign(&head.forward_batch(states)?);
        }
        Ok(q_values)
    }

    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView3<f32>, step: usize) -> Result<()> {
        check_layout(targets, self.num_heads(), states.nrows(), self.num_actions())?;
        let learning_rate = self.config.learning_rate.rate_at(step);
        for (h, head) in self.heads.iter_mut().enumerate() {
            self.last_losses[h] = head.train_batch(states, targets.index_axis(Axis(0), h), learning_rate)?;
        }
        debug!("{} fit at step {}: lr {}, losses {:?}", self.name, step, learning_rate, self.last_losses);
        Ok(())
    }

    fn replace(&mut self, other: &Self) -> Result<()> {
        if other.heads.len() != self.heads.len() {
            return Err(HydraError::shape_mismatch(
                format!("{} heads", self.heads.len()),
                format!("{} heads", other.heads.len()),
            ));
        }
        for (mine, theirs) in self.heads.iter_mut().zip(&other.heads) {
            mine.copy_weights_from(theirs)?;
        }
        Ok(())
    }

    fn save_network(&self) -> Result<()> {
        if !self.config.save_network {
            return Ok(());
        }
        // Never persist a partially isolated model
        let heads = self.stash.as_ref().unwrap_or(&self.heads);
        fs::create_dir_all(&self.config.network_path)?;
        let path = self.snapshot_path();
        fs::write(&path, bincode::serialize(heads)?)?;
        debug!("Saved {} to {}", self.name, path.display());
        Ok(())
    }

    fn clear_weights(&mut self, head: usize) -> Result<()> {
        if head >= self.heads.len() {
            return Err(HydraError::InvalidParameter {
                name: "head".to_string(),
                reason: format!("{} out of range for {} heads", head, self.heads.len()),
            });
        }
        let original = self.stash.get_or_insert_with(|| self.heads.clone());
        self.heads = original.clone();
        for (h, network) in self.heads.iter_mut().enumerate() {
            if h != head {
                if let Some(output) = network.layers.last_mut() {
                    output.clear();
                }
            }
        }
        Ok(())
    }

    fn restore_weights(&mut self) -> Result<()> {
        if let Some(original) = self.stash.take() {
            self.heads = original;
        }
        Ok(())
    }
}
