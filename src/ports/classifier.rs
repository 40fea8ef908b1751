//! Classifier port: Trait for the pre-trained binary model.
//!
//! This trait abstracts the trained artifact from the application logic.
//! The application only relies on scikit-learn style `predict` and
//! `predict_proba` semantics over an ordered feature vector.

use thiserror::Error;

/// Errors raised by a classifier implementation.
///
/// All of these are fatal: there is no degraded prediction mode.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model artifact not found at {0}")]
    NotFound(String),

    #[error("Failed to read model artifact: {0}")]
    Read(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Feature shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Classifier returned an invalid result: {0}")]
    InvalidOutput(String),
}

/// Trait for binary classifiers.
///
/// Implementations are loaded once at startup and are read-only afterwards,
/// so they must be shareable across threads.
pub trait Classifier: Send + Sync {
    /// Feature names in the order `predict` expects them.
    fn feature_names(&self) -> &[String];

    /// Predict the class label for one feature vector.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the vector length is wrong.
    fn predict(&self, features: &[f64]) -> Result<u8, ModelError>;

    /// Class probability distribution for one feature vector, indexed by label.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the vector length is wrong.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}
