//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: JSON logistic regression artifact implementing `Classifier`
//! - `manifest`: SHA-256 manifest and Ed25519 signature checks for the model directory
//! - `sanitize`: redaction of clinical values in log output

pub mod logistic;
pub mod manifest;
pub mod sanitize;

pub use manifest::IntegrityError;
