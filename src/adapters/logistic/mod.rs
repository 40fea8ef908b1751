//! Logistic regression adapter: Implementation of `Classifier` over a JSON artifact.
//!
//! The artifact is exported by the training pipeline as `model.json`:
//! a standard scaler followed by a binary logistic regression.
//!
//! # Loading
//!
//! Loading is the only fallible step that touches the filesystem. The model
//! directory is verified against the configured [`IntegrityPolicy`] first,
//! then the artifact is parsed and its shape checked against
//! [`FEATURE_NAMES`]. Any failure here is fatal for the application.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::adapters::manifest::{self, MODEL_FILE};
use crate::config::IntegrityPolicy;
use crate::domain::FEATURE_NAMES;
use crate::ports::{Classifier, ModelError};
use crate::DiabscreenError;

const FORMAT_VERSION: u32 = 1;

fn default_threshold() -> f64 {
    0.5
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedLogisticModel {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    /// Probability of class 1 at or above which class 1 is predicted.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

/// Standardized binary logistic regression.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    params: ExportedLogisticModel,
}

impl LogisticModel {
    /// Load and verify the artifact in `model_dir`.
    ///
    /// `model_dir` may also point directly at a `model.json` file, in which
    /// case its parent directory is checked for a manifest.
    ///
    /// # Errors
    /// Returns error if integrity checks fail or the artifact is missing,
    /// unparseable or shaped for a different feature set.
    pub fn load(model_dir: &Path, policy: &IntegrityPolicy) -> Result<Self, DiabscreenError> {
        let (base_dir, model_path) = if model_dir.is_file() {
            let parent = model_dir.parent().unwrap_or_else(|| Path::new("."));
            (parent.to_path_buf(), model_dir.to_path_buf())
        } else {
            (model_dir.to_path_buf(), model_dir.join(MODEL_FILE))
        };

        if !model_path.exists() {
            return Err(ModelError::NotFound(model_path.display().to_string()).into());
        }

        manifest::verify_model_dir(&base_dir, policy)?;

        let content = std::fs::read_to_string(&model_path)
            .map_err(|e| ModelError::Read(format!("{}: {e}", model_path.display())))?;
        let params: ExportedLogisticModel = serde_json::from_str(&content)
            .map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;

        let model = Self::from_params(params)?;

        tracing::info!(
            "Loaded model from {:?} (n_features={}, threshold={})",
            model_path,
            model.params.feature_names.len(),
            model.params.threshold
        );

        Ok(model)
    }

    /// Build a model from already-parsed parameters.
    ///
    /// # Errors
    /// Returns `ModelError` if the parameters are inconsistent or do not
    /// describe the expected feature set.
    pub fn from_params(params: ExportedLogisticModel) -> Result<Self, ModelError> {
        if params.format_version != FORMAT_VERSION {
            return Err(ModelError::InvalidArtifact(format!(
                "unsupported format_version {}",
                params.format_version
            )));
        }

        let n = params.feature_names.len();
        if n != FEATURE_NAMES.len() {
            return Err(ModelError::ShapeMismatch {
                expected: FEATURE_NAMES.len(),
                actual: n,
            });
        }
        if let Some((i, (got, want))) = params
            .feature_names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .enumerate()
            .find(|(_, (got, want))| got.as_str() != **want)
        {
            return Err(ModelError::InvalidArtifact(format!(
                "feature {i} is {got:?}, expected {want:?}"
            )));
        }

        if params.coefficients.len() != n
            || params.scaler_mean.len() != n
            || params.scaler_scale.len() != n
        {
            return Err(ModelError::InvalidArtifact(
                "parameter lengths do not match feature_names length".into(),
            ));
        }

        let all_finite = params
            .coefficients
            .iter()
            .chain(&params.scaler_mean)
            .chain(&params.scaler_scale)
            .chain(std::iter::once(&params.intercept))
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ModelError::InvalidArtifact(
                "parameters must be finite".into(),
            ));
        }
        if params.scaler_scale.iter().any(|s| *s <= 0.0) {
            return Err(ModelError::InvalidArtifact(
                "scaler_scale entries must be > 0".into(),
            ));
        }
        if !(params.threshold > 0.0 && params.threshold < 1.0) {
            return Err(ModelError::InvalidArtifact(
                "threshold must lie in (0, 1)".into(),
            ));
        }

        Ok(Self { params })
    }

    fn check_shape(&self, features: &[f64]) -> Result<(), ModelError> {
        let expected = self.params.feature_names.len();
        if features.len() != expected {
            return Err(ModelError::ShapeMismatch {
                expected,
                actual: features.len(),
            });
        }
        Ok(())
    }

    /// Decision function: intercept plus the weighted standardized features.
    fn decision(&self, features: &[f64]) -> f64 {
        let p = &self.params;
        features
            .iter()
            .zip(&p.coefficients)
            .zip(p.scaler_mean.iter().zip(&p.scaler_scale))
            .map(|((x, w), (mean, scale))| w * (x - mean) / scale)
            .sum::<f64>()
            + p.intercept
    }

    fn positive_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.check_shape(features)?;
        let p = sigmoid(self.decision(features));
        if p.is_nan() {
            return Err(ModelError::InvalidOutput(
                "probability is NaN for the given features".into(),
            ));
        }
        Ok(p)
    }
}

// Split on sign so `exp` never overflows.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticModel {
    fn feature_names(&self) -> &[String] {
        &self.params.feature_names
    }

    fn predict(&self, features: &[f64]) -> Result<u8, ModelError> {
        let p = self.positive_probability(features)?;
        Ok(u8::from(p >= self.params.threshold))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let p = self.positive_probability(features)?;
        Ok(vec![1.0 - p, p])
    }
}
