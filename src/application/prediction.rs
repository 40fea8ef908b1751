//! Prediction service: validates a record and runs the classifier.
//!
//! This is the predictor adapter between the form and the trained model:
//! - range-check the record
//! - build the feature vector in model order
//! - call `predict` and `predict_proba`
//! - pair the predicted label with its own probability

use std::sync::Arc;

use crate::domain::{validate, Assessment, Outcome, PatientRecord, Prediction, FEATURE_COUNT};
use crate::ports::{Classifier, ModelError};

/// Service for turning a submitted record into an [`Assessment`].
///
/// The classifier is loaded once by the caller and injected here; the
/// service never mutates it.
pub struct PredictionService<C>
where
    C: Classifier,
{
    classifier: Arc<C>,
}

impl<C> Clone for PredictionService<C>
where
    C: Classifier,
{
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<C> PredictionService<C>
where
    C: Classifier,
{
    /// Create a new prediction service.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the classifier does not take
    /// exactly eight features.
    pub fn new(classifier: Arc<C>) -> Result<Self, ModelError> {
        let n = classifier.feature_names().len();
        if n != FEATURE_COUNT {
            return Err(ModelError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: n,
            });
        }
        Ok(Self { classifier })
    }

    /// Validate `record` and, only if every checked field passes, predict.
    ///
    /// # Errors
    /// Returns `ModelError` if the classifier fails. Range violations are
    /// not errors; they come back as `Assessment::Rejected`.
    pub fn assess(&self, record: &PatientRecord) -> Result<Assessment, ModelError> {
        let violations = validate(record);
        if !violations.is_empty() {
            tracing::info!(
                "Submission rejected: {} field(s) out of range",
                violations.len()
            );
            return Ok(Assessment::Rejected(violations));
        }

        self.predict(record).map(Assessment::Predicted)
    }

    /// Run the classifier on a record that already passed validation.
    ///
    /// # Errors
    /// Returns `ModelError` on a shape mismatch, an unknown label, or a
    /// malformed probability distribution.
    pub fn predict(&self, record: &PatientRecord) -> Result<Prediction, ModelError> {
        let features = record.to_features();

        let label = self.classifier.predict(&features)?;
        let outcome = Outcome::from_label(label)
            .ok_or_else(|| ModelError::InvalidOutput(format!("unknown class label {label}")))?;

        let proba = self.classifier.predict_proba(&features)?;
        if proba.len() != 2 {
            return Err(ModelError::InvalidOutput(format!(
                "expected 2 class probabilities, got {}",
                proba.len()
            )));
        }
        if proba.iter().any(|p| !p.is_finite() || !(0.0..=1.0).contains(p)) {
            return Err(ModelError::InvalidOutput(
                "class probabilities must lie in [0, 1]".into(),
            ));
        }

        let confidence = proba[usize::from(outcome.label())];
        let prediction = Prediction::new(outcome, confidence);

        tracing::info!(
            "Prediction complete: outcome={}, confidence={}",
            prediction.outcome,
            prediction.confidence_percent()
        );

        Ok(prediction)
    }
}
