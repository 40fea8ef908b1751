//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. The validator lives here because it is a total
//! function over a [`PatientRecord`].

mod patient;
mod prediction;
pub mod validation;

pub use patient::{Field, PatientRecord, FEATURE_COUNT, FEATURE_NAMES};
pub use prediction::{Assessment, Outcome, Prediction};
pub use validation::{validate, Violations};
