//! Application layer: Use cases.
//!
//! Orchestrates the domain validator with the classifier port.

mod prediction;

pub use prediction::PredictionService;
