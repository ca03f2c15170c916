use crate::agent::HraAgent;
use crate::config::ReinforceConfig;
use crate::error::{HydraError, Result};
use crate::model::{ModelPair, ValueModel};
use crate::saliency::SaliencyProvider;
use crate::tensorboard::ScalarSink;

/// Builder pattern for HraAgent
pub struct HraAgentBuilder<M: ValueModel, C: Clone = usize> {
    name: String,
    choices: Option<Vec<C>>,
    models: Option<ModelPair<M>>,
    config: ReinforceConfig,
    sink: Option<Box<dyn ScalarSink>>,
    saliency: Option<Box<dyn SaliencyProvider<M>>>,
    explanation: Option<bool>,
}

impl<M: ValueModel, C: Clone> HraAgentBuilder<M, C> {
    pub fn new(name: &str) -> Self {
        HraAgentBuilder {
            name: name.to_string(),
            choices: None,
            models: None,
            config: ReinforceConfig::default(),
            sink: None,
            saliency: None,
            explanation: None,
        }
    }

    pub fn choices(mut self, choices: Vec<C>) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn models(mut self, models: ModelPair<M>) -> Self {
        self.models = Some(models);
        self
    }

    pub fn config(mut self, config: ReinforceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn sink(mut self, sink: Box<dyn ScalarSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn saliency(mut self, provider: Box<dyn SaliencyProvider<M>>) -> Self {
        self.saliency = Some(provider);
        self
    }

    /// Override explanation mode; attaching a saliency provider enables it.
    pub fn explanation(mut self, enabled: bool) -> Self {
        self.explanation = Some(enabled);
        self
    }

    pub fn build(self) -> Result<HraAgent<M, C>> {
        let choices = self
            .choices
            .ok_or_else(|| HydraError::invalid_parameter("choices", "choices must be specified"))?;
        let models = self
            .models
            .ok_or_else(|| HydraError::invalid_parameter("models", "value models must be specified"))?;

        let mut agent = HraAgent::new(&self.name, choices, models, self.config)?;
        if let Some(sink) = self.sink {
            agent = agent.with_sink(sink);
        }
        if let Some(provider) = self.saliency {
            agent = agent.with_saliency(provider);
        }
        if let Some(enabled) = self.explanation {
            agent.set_explanation(enabled)?;
        }
        Ok(agent)
    }
}
