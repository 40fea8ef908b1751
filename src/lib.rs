//! # Diabscreen
//!
//! Terminal form for diabetes risk screening with a pre-trained classifier.
//!
//! This crate provides:
//! - Range validation of eight clinical measurements
//! - A predictor adapter over a binary classifier artifact
//! - Terminal UI with a single-page entry form and outcome box
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientRecord, Violations, Prediction) and the validator
//! - `ports`: The `Classifier` trait
//! - `adapters`: Logistic regression artifact, integrity checks, log sanitization
//! - `application`: `PredictionService` orchestrating validation and inference
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{Assessment, Outcome, PatientRecord, Prediction, Violations};

/// Result type for Diabscreen operations
pub type Result<T> = std::result::Result<T, DiabscreenError>;

/// Main error type for Diabscreen
#[derive(Debug, thiserror::Error)]
pub enum DiabscreenError {
    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Model integrity check failed: {0}")]
    Integrity(#[from] adapters::IntegrityError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
