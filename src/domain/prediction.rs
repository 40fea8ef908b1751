//! Prediction result types.
//!
//! Represents the classifier's verdict for one patient record.

use serde::{Deserialize, Serialize};

use super::validation::Violations;

/// Binary classifier outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Class 0
    NoDiabetes,
    /// Class 1
    Diabetes,
}

impl Outcome {
    /// Map a raw class label to an outcome.
    #[must_use]
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Self::NoDiabetes),
            1 => Some(Self::Diabetes),
            _ => None,
        }
    }

    /// Raw class label (also the index into the probability distribution).
    #[must_use]
    pub fn label(&self) -> u8 {
        match self {
            Self::NoDiabetes => 0,
            Self::Diabetes => 1,
        }
    }

    /// Sentence shown in the outcome box.
    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Self::NoDiabetes => "The patient is unlikely to have diabetes.",
            Self::Diabetes => "The patient is likely to have diabetes.",
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::NoDiabetes => (16, 185, 129), // Emerald (#10B981)
            Self::Diabetes => (244, 63, 94),    // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDiabetes => write!(f, "no diabetes"),
            Self::Diabetes => write!(f, "diabetes"),
        }
    }
}

/// Predicted outcome plus the probability the classifier assigns to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub outcome: Outcome,

    /// Probability of `outcome` (0.0 to 1.0)
    pub confidence: f64,
}

impl Prediction {
    #[must_use]
    pub fn new(outcome: Outcome, confidence: f64) -> Self {
        Self {
            outcome,
            confidence,
        }
    }

    /// Confidence as a percentage with two decimals, e.g. `87.00%`.
    #[must_use]
    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence * 100.0)
    }
}

/// Result of one form submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Assessment {
    /// Input failed range checks; the classifier was not called.
    Rejected(Violations),
    /// Input passed and the classifier produced a prediction.
    Predicted(Prediction),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::from_label(0), Some(Outcome::NoDiabetes));
        assert_eq!(Outcome::from_label(1), Some(Outcome::Diabetes));
        assert_eq!(Outcome::from_label(2), None);
        assert_eq!(Outcome::Diabetes.label(), 1);
        assert_eq!(Outcome::Diabetes.to_string(), "diabetes");
        assert_eq!(Outcome::NoDiabetes.to_string(), "no diabetes");
    }

    #[test]
    fn test_confidence_percent_has_two_decimals() {
        let p = Prediction::new(Outcome::Diabetes, 0.87);
        assert_eq!(p.confidence_percent(), "87.00%");

        let p = Prediction::new(Outcome::NoDiabetes, 0.5);
        assert_eq!(p.confidence_percent(), "50.00%");

        let p = Prediction::new(Outcome::NoDiabetes, 0.123_456);
        assert_eq!(p.confidence_percent(), "12.35%");
    }

    #[test]
    fn test_headlines() {
        assert!(Outcome::Diabetes.headline().contains("likely to have diabetes"));
        assert!(Outcome::NoDiabetes.headline().contains("unlikely"));
    }
}
