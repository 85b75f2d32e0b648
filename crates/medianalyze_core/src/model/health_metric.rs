//! Health metric domain model.
//!
//! # Responsibility
//! - Define one timestamped set of vital/lab measurements for a patient.
//! - Keep measurement fields optional so partial readings can be stored.
//!
//! # Invariants
//! - Every metric belongs to exactly one existing patient.
//! - `cholesterol` and `glucose` use the three-level clinical code.

use crate::model::patient::PatientId;
use crate::model::validation::{
    check_opt, require_in_range, require_positive_int, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Store-assigned health metric identifier.
pub type MetricId = i64;

/// Three-level lab result code used by cholesterol and glucose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalLevel {
    /// Stored as `1`.
    Normal,
    /// Stored as `2`.
    AboveNormal,
    /// Stored as `3`.
    WellAboveNormal,
}

impl ClinicalLevel {
    pub fn code(self) -> i64 {
        match self {
            Self::Normal => 1,
            Self::AboveNormal => 2,
            Self::WellAboveNormal => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Normal),
            2 => Some(Self::AboveNormal),
            3 => Some(Self::WellAboveNormal),
            _ => None,
        }
    }
}

/// Persisted health metric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetric {
    pub metric_id: MetricId,
    pub patient_id: PatientId,
    /// Measurement time, Unix epoch milliseconds.
    pub recorded_at: i64,
    pub systolic_bp: Option<i64>,
    pub diastolic_bp: Option<i64>,
    /// Beats per minute.
    pub heart_rate: Option<i64>,
    /// Degrees Celsius.
    pub body_temperature: Option<f64>,
    /// SpO2 percentage.
    pub oxygen_saturation: Option<f64>,
    pub cholesterol: Option<ClinicalLevel>,
    pub glucose: Option<ClinicalLevel>,
    pub smoking: bool,
    pub alcohol_intake: bool,
    pub physical_activity: bool,
    pub cardiovascular_disease: Option<bool>,
    pub created_at: i64,
}

/// Insert request for a health metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewHealthMetric {
    pub patient_id: PatientId,
    /// Defaults to the store's current time when `None`.
    pub recorded_at: Option<i64>,
    pub systolic_bp: Option<i64>,
    pub diastolic_bp: Option<i64>,
    pub heart_rate: Option<i64>,
    pub body_temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub cholesterol: Option<ClinicalLevel>,
    pub glucose: Option<ClinicalLevel>,
    pub smoking: bool,
    pub alcohol_intake: bool,
    pub physical_activity: bool,
    pub cardiovascular_disease: Option<bool>,
}

impl NewHealthMetric {
    /// Creates an empty measurement set for the given patient.
    pub fn new(patient_id: PatientId) -> Self {
        Self {
            patient_id,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ValidationResult {
        validate_measurements(
            self.systolic_bp,
            self.diastolic_bp,
            self.heart_rate,
            self.body_temperature,
            self.oxygen_saturation,
        )
    }
}

/// Partial update for a health metric. The owning patient cannot change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthMetricUpdate {
    pub recorded_at: Option<i64>,
    pub systolic_bp: Option<i64>,
    pub diastolic_bp: Option<i64>,
    pub heart_rate: Option<i64>,
    pub body_temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub cholesterol: Option<ClinicalLevel>,
    pub glucose: Option<ClinicalLevel>,
    pub smoking: Option<bool>,
    pub alcohol_intake: Option<bool>,
    pub physical_activity: Option<bool>,
    pub cardiovascular_disease: Option<bool>,
}

impl HealthMetricUpdate {
    pub fn validate(&self) -> ValidationResult {
        validate_measurements(
            self.systolic_bp,
            self.diastolic_bp,
            self.heart_rate,
            self.body_temperature,
            self.oxygen_saturation,
        )
    }
}

fn validate_measurements(
    systolic_bp: Option<i64>,
    diastolic_bp: Option<i64>,
    heart_rate: Option<i64>,
    body_temperature: Option<f64>,
    oxygen_saturation: Option<f64>,
) -> ValidationResult {
    check_opt(systolic_bp, |value| require_positive_int("systolic_bp", value))?;
    check_opt(diastolic_bp, |value| require_positive_int("diastolic_bp", value))?;
    check_opt(heart_rate, |value| require_positive_int("heart_rate", value))?;
    check_opt(body_temperature, |value| require_in_range("body_temperature", value, 20.0, 45.0))?;
    check_opt(oxygen_saturation, |value| require_in_range("oxygen_saturation", value, 0.0, 100.0))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ClinicalLevel, NewHealthMetric};
    use crate::model::validation::ValidationError;

    #[test]
    fn clinical_level_codes_roundtrip() {
        for level in [
            ClinicalLevel::Normal,
            ClinicalLevel::AboveNormal,
            ClinicalLevel::WellAboveNormal,
        ] {
            assert_eq!(ClinicalLevel::from_code(level.code()), Some(level));
        }
        assert_eq!(ClinicalLevel::from_code(0), None);
        assert_eq!(ClinicalLevel::from_code(4), None);
    }

    #[test]
    fn validate_rejects_implausible_temperature() {
        let metric = NewHealthMetric {
            body_temperature: Some(365.0),
            ..NewHealthMetric::new(1)
        };
        assert!(matches!(
            metric.validate(),
            Err(ValidationError::OutOfRange {
                field: "body_temperature",
                ..
            })
        ));
    }

    #[test]
    fn empty_measurement_set_is_valid() {
        assert!(NewHealthMetric::new(7).validate().is_ok());
    }
}
