//! # Activation Functions
//!
//! Hidden layers of each value head use the activation named in its
//! `HeadConfig` (ReLU unless configured otherwise). The output layer is
//! always linear, since Q-values are unbounded regression targets.

pub mod functions;

pub use functions::Activation;
