//! Patient measurement record for diabetes risk prediction.
//!
//! Field set and order follow the Pima Indians Diabetes dataset columns the
//! classifier artifact is trained on.

use serde::{Deserialize, Serialize};

/// Number of features expected by the classifier.
pub const FEATURE_COUNT: usize = 8;

/// Canonical column names, in the exact order the classifier consumes them.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// One field of a [`PatientRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Pregnancies,
    Glucose,
    BloodPressure,
    SkinThickness,
    Insulin,
    Bmi,
    DiabetesPedigreeFunction,
    Age,
}

impl Field {
    /// All fields in classifier feature order.
    pub const ALL: [Field; FEATURE_COUNT] = [
        Field::Pregnancies,
        Field::Glucose,
        Field::BloodPressure,
        Field::SkinThickness,
        Field::Insulin,
        Field::Bmi,
        Field::DiabetesPedigreeFunction,
        Field::Age,
    ];

    /// Name shown to the user (validation messages, form labels).
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pregnancies => "Pregnancies",
            Self::Glucose => "Glucose",
            Self::BloodPressure => "Blood Pressure",
            Self::SkinThickness => "Skin Thickness",
            Self::Insulin => "Insulin",
            Self::Bmi => "BMI",
            Self::DiabetesPedigreeFunction => "Diabetes Pedigree Function",
            Self::Age => "Age",
        }
    }

    /// Column name in the classifier artifact.
    #[must_use]
    pub fn feature_name(&self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    /// Position in the feature vector.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Pregnancies => 0,
            Self::Glucose => 1,
            Self::BloodPressure => 2,
            Self::SkinThickness => 3,
            Self::Insulin => 4,
            Self::Bmi => 5,
            Self::DiabetesPedigreeFunction => 6,
            Self::Age => 7,
        }
    }

    /// Whether the field only takes whole numbers on the form.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        !matches!(self, Self::Bmi | Self::DiabetesPedigreeFunction)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Clinical measurements submitted for a single prediction.
///
/// Created per submission and dropped once the outcome is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PatientRecord {
    /// Number of pregnancies
    pub pregnancies: f64,

    /// Plasma glucose concentration (mg/dL)
    pub glucose: f64,

    /// Diastolic blood pressure (mmHg)
    pub blood_pressure: f64,

    /// Triceps skin fold thickness (mm)
    pub skin_thickness: f64,

    /// 2-hour serum insulin (mu U/ml)
    pub insulin: f64,

    /// Body mass index (kg/m^2)
    pub bmi: f64,

    /// Diabetes pedigree function score
    pub diabetes_pedigree: f64,

    /// Age in years
    pub age: f64,
}

impl PatientRecord {
    /// Value of a single field.
    #[must_use]
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Pregnancies => self.pregnancies,
            Field::Glucose => self.glucose,
            Field::BloodPressure => self.blood_pressure,
            Field::SkinThickness => self.skin_thickness,
            Field::Insulin => self.insulin,
            Field::Bmi => self.bmi,
            Field::DiabetesPedigreeFunction => self.diabetes_pedigree,
            Field::Age => self.age,
        }
    }

    /// Convert to the classifier's feature vector.
    /// Order matches [`FEATURE_NAMES`].
    #[must_use]
    pub fn to_features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.pregnancies,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree,
            self.age,
        ]
    }

    /// Build a record from a feature vector.
    ///
    /// # Errors
    /// Returns error if the slice does not hold exactly 8 values.
    pub fn from_features(v: &[f64]) -> Result<Self, String> {
        if v.len() != FEATURE_COUNT {
            return Err(format!(
                "Expected {FEATURE_COUNT} features, got {}",
                v.len()
            ));
        }

        Ok(Self {
            pregnancies: v[0],
            glucose: v[1],
            blood_pressure: v[2],
            skin_thickness: v[3],
            insulin: v[4],
            bmi: v[5],
            diabetes_pedigree: v[6],
            age: v[7],
        })
    }
}
