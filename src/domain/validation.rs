//! Range checks applied to a [`PatientRecord`] before prediction.
//!
//! Only Glucose, Blood Pressure, Skin Thickness, Insulin, BMI and Age are
//! checked. Pregnancies and the pedigree score reach the classifier as
//! entered.

use serde::{Deserialize, Serialize};

use super::patient::{Field, PatientRecord};

/// Upper bounds for the checked fields. `None` means no upper bound.
const CHECKED_FIELDS: [(Field, Option<f64>); 6] = [
    (Field::Glucose, Some(1000.0)),
    (Field::BloodPressure, Some(140.0)),
    (Field::SkinThickness, Some(99.0)),
    (Field::Insulin, Some(1000.0)),
    (Field::Bmi, Some(120.0)),
    (Field::Age, None),
];

/// Declared maximum of a field, if it is range-checked and bounded.
#[must_use]
pub fn upper_bound(field: Field) -> Option<f64> {
    CHECKED_FIELDS
        .iter()
        .find(|(f, _)| *f == field)
        .and_then(|(_, max)| *max)
}

/// Whether the validator looks at this field at all.
#[must_use]
pub fn is_checked(field: Field) -> bool {
    CHECKED_FIELDS.iter().any(|(f, _)| *f == field)
}

fn out_of_range(value: f64, max: Option<f64>) -> bool {
    // NaN is not finite, so it is caught by the first check.
    if !value.is_finite() || value <= 0.0 {
        return true;
    }
    matches!(max, Some(max) if value > max)
}

/// Fields of a record that violate their declared range, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violations(Vec<Field>);

impl Violations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }

    /// User-facing error listing every offending field.
    #[must_use]
    pub fn message(&self) -> String {
        let names: Vec<&str> = self.0.iter().map(Field::display_name).collect();
        format!(
            "Invalid input detected in: {}. Please enter realistic values.",
            names.join(", ")
        )
    }
}

impl std::fmt::Display for Violations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Check every range-checked field of `record`.
///
/// Total over any `f64` input: NaN and infinities count as out of range.
#[must_use]
pub fn validate(record: &PatientRecord) -> Violations {
    Violations(
        CHECKED_FIELDS
            .iter()
            .filter(|(field, max)| out_of_range(record.get(*field), *max))
            .map(|(field, _)| *field)
            .collect(),
    )
}
