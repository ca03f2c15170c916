pub mod dense;

pub use dense::{DenseGradients, DenseLayer};
