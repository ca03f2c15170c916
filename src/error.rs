use thiserror::Error;

/// Result type for Hydra operations
pub type Result<T> = std::result::Result<T, HydraError>;

/// Main error type for the Hydra library
#[derive(Debug, Error)]
pub enum HydraError {
    /// Replay buffer sampled before it holds enough experiences
    #[error("Insufficient data: requested {requested} experiences, only {available} stored")]
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// Value model output does not match the (heads x batch x actions) layout
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        expected: String,
        actual: String,
    },

    /// A call that needs a pending transition arrived without one
    #[error("State missing: {0}")]
    StateMissing(String),

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Invalid action
    #[error("Invalid action {action}: must be less than {num_actions}")]
    InvalidAction {
        action: usize,
        num_actions: usize,
    },

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Weight snapshot (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration parse errors
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl HydraError {
    pub fn shape_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        HydraError::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        HydraError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is the warm-up condition the agent tolerates silently.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, HydraError::InsufficientData { .. })
    }
}
