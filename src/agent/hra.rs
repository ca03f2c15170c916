use log::{debug, info, warn};
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{NetworkConfig, ReinforceConfig};
use crate::error::{HydraError, Result};
use crate::exploration::ExplorationSchedule;
use crate::model::{check_layout, HraModel, ModelPair, ValueModel};
use crate::replay_buffer::{Experience, ReplayBuffer};
use crate::saliency::{explain, ActionSaliency, SaliencyProvider};
use crate::tensorboard::{NullSink, ScalarSink};

/// Outcome of one decision step
#[derive(Clone, Debug)]
pub struct Decision<C> {
    /// Index of the chosen action
    pub action: usize,
    pub choice: C,
    /// Per-head Q-values `(heads, actions)`; `None` on exploratory steps,
    /// which never query the model
    pub q_values: Option<Array2<f32>>,
    /// One entry per candidate action when explanation is enabled
    pub saliencies: Vec<ActionSaliency>,
}

impl<C> Decision<C> {
    pub fn explored(&self) -> bool {
        self.q_values.is_none()
    }
}

/// Hybrid Reward Architecture agent.
///
/// Q-learning with the reward split into components, one value head per
/// component. Actions are chosen greedily on the head-summed Q-values, with
/// epsilon-greedy exploration while learning.
///
/// Per decision the caller runs `predict`, then feeds the decomposed reward
/// of the resulting environment step through `reward` (any number of times),
/// and finally closes the episode with `end_episode`.
///
/// # Example
///
/// ```rust,no_run
/// use hydra::agent::HraAgent;
/// use hydra::config::{NetworkConfig, ReinforceConfig};
/// use ndarray::array;
///
/// let network = NetworkConfig::new(2, 3, &["progress", "energy"], &[32]);
/// let reinforce = ReinforceConfig { batch_size: 16, memory_size: 1000, ..Default::default() };
/// let mut agent = HraAgent::from_configs("walker", vec!["left", "stay", "right"], &network, reinforce).unwrap();
///
/// let decision = agent.predict(array![0.0, 1.0].view()).unwrap();
/// agent.reward(&[1.0, -0.1]).unwrap();
/// agent.end_episode(array![0.5, 1.0].view()).unwrap();
/// println!("chose {}", decision.choice);
/// ```
pub struct HraAgent<M: ValueModel, C: Clone = usize> {
    name: String,
    choices: Vec<C>,
    config: ReinforceConfig,
    models: ModelPair<M>,
    replay_memory: ReplayBuffer,
    schedule: ExplorationSchedule,
    rng: StdRng,
    sink: Box<dyn ScalarSink>,
    saliency: Option<Box<dyn SaliencyProvider<M>>>,
    explanation: bool,
    learning: bool,
    reward_types: usize,

    steps: usize,
    episode: usize,
    previous_state: Option<Array1<f32>>,
    previous_action: Option<usize>,
    current_reward: Vec<f32>,
    total_reward: f32,
}

impl<M: ValueModel, C: Clone> HraAgent<M, C> {
    /// Create an agent around an existing model pair.
    ///
    /// The number of reward components is the pair's head count, and the pair
    /// must score exactly `choices.len()` actions.
    pub fn new(name: &str, choices: Vec<C>, models: ModelPair<M>, config: ReinforceConfig) -> Result<Self> {
        config.validate()?;
        if choices.is_empty() {
            return Err(HydraError::invalid_parameter("choices", "at least one choice is required"));
        }
        if models.num_actions() != choices.len() {
            return Err(HydraError::shape_mismatch(
                format!("{} actions (one per choice)", choices.len()),
                format!("{} actions from the value model", models.num_actions()),
            ));
        }
        if models.num_heads() == 0 {
            return Err(HydraError::invalid_parameter("models", "at least one value head is required"));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let reward_types = models.num_heads();

        Ok(HraAgent {
            name: name.to_string(),
            choices,
            replay_memory: ReplayBuffer::with_policy(config.memory_size, config.sampling),
            schedule: ExplorationSchedule::from_config(&config),
            config,
            models,
            rng,
            sink: Box::new(NullSink),
            saliency: None,
            explanation: false,
            learning: true,
            reward_types,
            steps: 0,
            episode: 0,
            previous_state: None,
            previous_action: None,
            current_reward: vec![0.0; reward_types],
            total_reward: 0.0,
        })
    }

    pub fn with_sink(mut self, sink: Box<dyn ScalarSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Attach a saliency provider and turn explanation on.
    pub fn with_saliency(mut self, provider: Box<dyn SaliencyProvider<M>>) -> Self {
        self.saliency = Some(provider);
        self.explanation = true;
        self
    }

    /// Toggle explanation mode. Enabling it requires a saliency provider.
    pub fn set_explanation(&mut self, enabled: bool) -> Result<()> {
        if enabled && self.saliency.is_none() {
            return Err(HydraError::invalid_parameter(
                "explanation",
                "no saliency provider attached",
            ));
        }
        self.explanation = enabled;
        Ok(())
    }

    /// Take one decision for `state`.
    ///
    /// Stores the pending transition (if any) with the reward accumulated
    /// since the previous decision, chooses an action, syncs the target model
    /// on schedule and runs a learning update. A state of the wrong width or
    /// a malformed model answer is rejected before anything is stored.
    pub fn predict(&mut self, state: ArrayView1<f32>) -> Result<Decision<C>> {
        self.check_state(state)?;
        let step = self.steps + 1;

        let (action, q_values) = if self.learning && self.should_explore(step) {
            (self.rng.gen_range(0..self.choices.len()), None)
        } else {
            let (action, q_values) = self.models.eval.predict(state)?;
            if q_values.dim() != (self.reward_types, self.choices.len()) {
                return Err(HydraError::shape_mismatch(
                    format!("({}, {}) (heads x actions)", self.reward_types, self.choices.len()),
                    format!("{:?}", q_values.dim()),
                ));
            }
            if action >= self.choices.len() {
                return Err(HydraError::InvalidAction {
                    action,
                    num_actions: self.choices.len(),
                });
            }
            (action, Some(q_values))
        };

        let saliencies = match (&self.saliency, self.explanation) {
            (Some(provider), true) => explain(provider.as_ref(), &mut self.models.eval, state)?,
            _ => Vec::new(),
        };

        self.steps = step;
        if self.learning {
            if let (Some(previous_state), Some(previous_action)) =
                (self.previous_state.take(), self.previous_action.take())
            {
                self.replay_memory.add(Experience::new(
                    previous_state,
                    previous_action,
                    self.current_reward.clone(),
                    state.to_owned(),
                    false,
                ));
            }
        }

        if self.learning && self.steps % self.config.update_frequency == 0 {
            debug!("Replacing target model for {}", self.name);
            self.models.sync_target()?;
        }

        self.current_reward = vec![0.0; self.reward_types];
        self.previous_state = Some(state.to_owned());
        self.previous_action = Some(action);

        self.update()?;

        Ok(Decision {
            action,
            choice: self.choices[action].clone(),
            q_values,
            saliencies,
        })
    }

    fn check_state(&self, state: ArrayView1<f32>) -> Result<()> {
        let expected = self.models.input_size();
        if state.len() != expected {
            return Err(HydraError::shape_mismatch(
                format!("state of length {}", expected),
                format!("state of length {}", state.len()),
            ));
        }
        Ok(())
    }

    fn should_explore(&mut self, step: usize) -> bool {
        let epsilon = self.schedule.probability(step);
        self.record("epsilon", epsilon, step);
        self.schedule.should_explore(epsilon, &mut self.rng)
    }

    fn record(&mut self, tag: &str, value: f32, step: usize) {
        if let Err(err) = self.sink.add_scalar(tag, value, step) {
            warn!("Failed to record {} for {}: {}", tag, self.name, err);
        }
    }

    /// Accumulate one decomposed reward for the pending decision.
    pub fn reward(&mut self, decomposed_rewards: &[f32]) -> Result<()> {
        if decomposed_rewards.len() != self.reward_types {
            return Err(HydraError::shape_mismatch(
                format!("{} reward components", self.reward_types),
                format!("{} reward components", decomposed_rewards.len()),
            ));
        }
        if self.previous_state.is_none() || self.previous_action.is_none() {
            return Err(HydraError::StateMissing(format!(
                "reward for {} arrived with no pending decision",
                self.name
            )));
        }

        self.total_reward += decomposed_rewards.iter().sum::<f32>();
        for (accumulated, reward) in self.current_reward.iter_mut().zip(decomposed_rewards) {
            *accumulated += reward;
        }
        Ok(())
    }

    /// Close the episode with its terminal `state`. A no-op once learning is
    /// disabled.
    ///
    /// The terminal transition is stored and the episode counted before the
    /// closing update runs, so an update error still leaves the agent at the
    /// start of the next episode.
    pub fn end_episode(&mut self, state: ArrayView1<f32>) -> Result<()> {
        if !self.learning {
            return Ok(());
        }
        self.check_state(state)?;
        let (previous_state, previous_action) = match (self.previous_state.take(), self.previous_action.take()) {
            (Some(previous_state), Some(previous_action)) => (previous_state, previous_action),
            _ => {
                return Err(HydraError::StateMissing(format!(
                    "end of episode for {} arrived with no pending decision",
                    self.name
                )))
            }
        };

        info!("End of episode {} with total reward {}", self.episode + 1, self.total_reward);
        let tag = format!("{} agent reward", self.name);
        self.record(&tag, self.total_reward, self.episode + 1);

        let reward = std::mem::replace(&mut self.current_reward, vec![0.0; self.reward_types]);
        self.replay_memory.add(Experience::new(
            previous_state,
            previous_action,
            reward,
            state.to_owned(),
            true,
        ));
        self.total_reward = 0.0;
        self.episode += 1;

        self.update()
    }

    /// Batched TD update of the evaluation model.
    ///
    /// Skipped while the buffer holds fewer than `batch_size` experiences. The
    /// bootstrap value of each head is the target model's mean Q-value over
    /// the next state's actions, zeroed for terminal transitions.
    pub fn update(&mut self) -> Result<()> {
        if !self.learning {
            return Ok(());
        }
        let batch_size = self.config.batch_size;
        if self.replay_memory.current_size() < batch_size {
            debug!(
                "Warming up {}: {} of {} experiences stored",
                self.name,
                self.replay_memory.current_size(),
                batch_size
            );
            return Ok(());
        }
        let batch = match self.replay_memory.sample(batch_size, &mut self.rng) {
            Ok(batch) => batch,
            Err(err) if err.is_insufficient_data() => {
                debug!("Skipping update for {}: {}", self.name, err);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let states = stack_states(&batch, Experience::state)?;
        let next_states = stack_states(&batch, Experience::next_state)?;
        let (heads, actions) = (self.reward_types, self.choices.len());

        let q_next = self.models.target.predict_batch(next_states.view())?;
        check_layout(q_next.view(), heads, batch.len(), actions)?;
        let q_values = self.models.eval.predict_batch(states.view())?;
        check_layout(q_values.view(), heads, batch.len(), actions)?;

        let targets = td_targets(&batch, q_values, &q_next, self.config.discount_factor)?;
        self.models.eval.fit(states.view(), targets.view(), self.steps)
    }

    /// Persist both models and freeze the agent. There is no way back; build
    /// a fresh agent to resume training.
    pub fn disable_learning(&mut self) -> Result<()> {
        info!("Disabled learning for {} agent", self.name);
        self.models.save()?;
        self.learning = false;
        self.episode = 0;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn choices(&self) -> &[C] {
        &self.choices
    }

    pub fn config(&self) -> &ReinforceConfig {
        &self.config
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn episode(&self) -> usize {
        self.episode
    }

    pub fn total_reward(&self) -> f32 {
        self.total_reward
    }

    pub fn current_reward(&self) -> &[f32] {
        &self.current_reward
    }

    pub fn reward_types(&self) -> usize {
        self.reward_types
    }

    pub fn is_learning(&self) -> bool {
        self.learning
    }

    pub fn is_explaining(&self) -> bool {
        self.explanation
    }

    /// Exploration probability at the current step.
    pub fn epsilon(&self) -> f32 {
        self.schedule.probability(self.steps)
    }

    /// The pending transition, if one is waiting for its next state.
    pub fn pending(&self) -> Option<(&Array1<f32>, usize)> {
        match (&self.previous_state, self.previous_action) {
            (Some(state), Some(action)) => Some((state, action)),
            _ => None,
        }
    }

    pub fn replay_buffer(&self) -> &ReplayBuffer {
        &self.replay_memory
    }

    pub fn models(&self) -> &ModelPair<M> {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut ModelPair<M> {
        &mut self.models
    }

    pub fn sink_mut(&mut self) -> &mut dyn ScalarSink {
        self.sink.as_mut()
    }
}

impl<C: Clone> HraAgent<HraModel, C> {
    /// Build `<name>_eval` and `<name>_target` dense models from `network`
    /// and wrap them in an agent.
    pub fn from_configs(name: &str, choices: Vec<C>, network: &NetworkConfig, config: ReinforceConfig) -> Result<Self> {
        let eval = HraModel::new(&format!("{}_eval", name), network)?;
        let target = HraModel::new(&format!("{}_target", name), network)?;
        Self::new(name, choices, ModelPair::new(eval, target)?, config)
    }
}

fn stack_states<'a, F>(batch: &[&'a Experience], field: F) -> Result<Array2<f32>>
where
    F: Fn(&'a Experience) -> &'a Array1<f32>,
{
    let width = batch.first().map_or(0, |&e| field(e).len());
    let mut states = Array2::zeros((batch.len(), width));
    for (mut row, &experience) in states.axis_iter_mut(Axis(0)).zip(batch) {
        let state = field(experience);
        if state.len() != width {
            return Err(HydraError::shape_mismatch(
                format!("state of length {}", width),
                format!("state of length {}", state.len()),
            ));
        }
        row.assign(state);
    }
    Ok(states)
}

/// Assemble the training targets for a sampled batch.
///
/// Starts from the evaluation model's own predictions `q_values` and, for
/// each sample, overwrites only the entry of the action taken:
/// `target[h, b, a_b] = reward_b[h] + discount * bootstrap[h, b]`, where
/// `bootstrap[h, b]` is the mean of `q_next[h, b, ..]` over actions, or zero
/// when sample `b` is terminal.
pub fn td_targets(batch: &[&Experience], q_values: Array3<f32>, q_next: &Array3<f32>, discount: f32) -> Result<Array3<f32>> {
    let (heads, batch_len, actions) = q_values.dim();
    check_layout(q_next.view(), heads, batch_len, actions)?;
    if batch.len() != batch_len {
        return Err(HydraError::shape_mismatch(
            format!("batch of {}", batch_len),
            format!("batch of {}", batch.len()),
        ));
    }

    let mut bootstrap = q_next
        .mean_axis(Axis(2))
        .unwrap_or_else(|| Array2::zeros((heads, batch_len)));
    for (b, experience) in batch.iter().enumerate() {
        if experience.is_terminal() {
            bootstrap.column_mut(b).fill(0.0);
        }
    }

    let mut targets = q_values;
    for (b, experience) in batch.iter().enumerate() {
        let action = experience.action();
        if action >= actions {
            return Err(HydraError::InvalidAction { action, num_actions: actions });
        }
        let reward = experience.reward();
        if reward.len() != heads {
            return Err(HydraError::shape_mismatch(
                format!("{} reward components", heads),
                format!("{} reward components", reward.len()),
            ));
        }
        for h in 0..heads {
            targets[[h, b, action]] = reward[h] + discount * bootstrap[[h, b]];
        }
    }
    Ok(targets)
}
