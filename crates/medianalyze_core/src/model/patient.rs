//! Patient domain model.
//!
//! # Responsibility
//! - Define the root record that owns metrics, images and signals.
//! - Define insert/update request shapes and their validation.
//!
//! # Invariants
//! - `patient_id` is assigned by the store and never changes.
//! - Deleting a patient removes every dependent record (store cascade).
//! - `age` is expressed in days, `height` in cm, `weight` in kg.

use crate::model::validation::{
    check_opt, optional_text, require_non_negative_int, require_positive, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Store-assigned patient identifier.
pub type PatientId = i64;

pub(crate) const NAME_MAX_CHARS: usize = 100;

/// Coded patient gender as stored in the `patients.gender` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Stored as `1`.
    Female,
    /// Stored as `2`.
    Male,
}

impl Gender {
    /// Integer code persisted in the store.
    pub fn code(self) -> i64 {
        match self {
            Self::Female => 1,
            Self::Male => 2,
        }
    }

    /// Decodes a persisted gender code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Female),
            2 => Some(Self::Male),
            _ => None,
        }
    }
}

/// Persisted patient row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: PatientId,
    /// Display name; optional in the schema.
    pub name: Option<String>,
    /// Age in days.
    pub age: i64,
    pub gender: Gender,
    /// Height in cm.
    pub height: f64,
    /// Weight in kg.
    pub weight: f64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by every update.
    pub updated_at: i64,
}

/// Insert request for a patient.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub name: Option<String>,
    pub age: i64,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
}

impl NewPatient {
    /// Creates an unnamed patient request with the required measurements.
    pub fn new(age: i64, gender: Gender, height: f64, weight: f64) -> Self {
        Self {
            name: None,
            age,
            gender,
            height,
            weight,
        }
    }

    /// Sets the optional display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn validate(&self) -> ValidationResult {
        optional_text("name", self.name.as_deref(), NAME_MAX_CHARS)?;
        require_non_negative_int("age", self.age)?;
        require_positive("height", self.height)?;
        require_positive("weight", self.weight)?;
        Ok(())
    }
}

/// Partial update for a patient. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

impl PatientUpdate {
    /// Returns whether no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.height.is_none()
            && self.weight.is_none()
    }

    pub fn validate(&self) -> ValidationResult {
        optional_text("name", self.name.as_deref(), NAME_MAX_CHARS)?;
        check_opt(self.age, |age| require_non_negative_int("age", age))?;
        check_opt(self.height, |height| require_positive("height", height))?;
        check_opt(self.weight, |weight| require_positive("weight", weight))?;
        Ok(())
    }
}
