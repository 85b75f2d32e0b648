//! Correlation result model.
//!
//! # Responsibility
//! - Store a coefficient computed elsewhere between two named metrics.
//!
//! # Invariants
//! - Not owned by any patient; survives patient deletion.
//! - `correlation_value` is stored as supplied. Only non-finite values are
//!   rejected, the conventional [-1, 1] range is not enforced.

use crate::model::validation::{
    check_opt, optional_notes, optional_text, require_finite, require_in_range,
    require_positive_int, require_text, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Store-assigned correlation result identifier.
pub type CorrelationId = i64;

/// Method label used when the caller does not supply one.
pub const DEFAULT_CORRELATION_TYPE: &str = "pearson";

const METRIC_MAX_CHARS: usize = 100;
const CORRELATION_TYPE_MAX_CHARS: usize = 20;

/// Persisted correlation result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub correlation_id: CorrelationId,
    /// Name of the first compared field, e.g. `systolic_bp`.
    pub metric1: String,
    /// Name of the second compared field, e.g. `cholesterol`.
    pub metric2: String,
    pub correlation_value: f64,
    /// Method label, e.g. `pearson` or `spearman`.
    pub correlation_type: String,
    pub sample_size: Option<i64>,
    pub p_value: Option<f64>,
    pub notes: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Insert request for a correlation result.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCorrelationResult {
    pub metric1: String,
    pub metric2: String,
    pub correlation_value: f64,
    pub correlation_type: String,
    pub sample_size: Option<i64>,
    pub p_value: Option<f64>,
    pub notes: Option<String>,
}

impl NewCorrelationResult {
    /// Creates a request using the default `pearson` method label.
    pub fn new(
        metric1: impl Into<String>,
        metric2: impl Into<String>,
        correlation_value: f64,
    ) -> Self {
        Self {
            metric1: metric1.into(),
            metric2: metric2.into(),
            correlation_value,
            correlation_type: DEFAULT_CORRELATION_TYPE.to_string(),
            sample_size: None,
            p_value: None,
            notes: None,
        }
    }

    /// Overrides the method label.
    pub fn with_correlation_type(mut self, correlation_type: impl Into<String>) -> Self {
        self.correlation_type = correlation_type.into();
        self
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("metric1", &self.metric1, METRIC_MAX_CHARS)?;
        require_text("metric2", &self.metric2, METRIC_MAX_CHARS)?;
        require_finite("correlation_value", self.correlation_value)?;
        require_text(
            "correlation_type",
            &self.correlation_type,
            CORRELATION_TYPE_MAX_CHARS,
        )?;
        validate_statistics(self.sample_size, self.p_value, self.notes.as_deref())
    }
}

/// Partial update for a correlation result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationResultUpdate {
    pub metric1: Option<String>,
    pub metric2: Option<String>,
    pub correlation_value: Option<f64>,
    pub correlation_type: Option<String>,
    pub sample_size: Option<i64>,
    pub p_value: Option<f64>,
    pub notes: Option<String>,
}

impl CorrelationResultUpdate {
    pub fn validate(&self) -> ValidationResult {
        optional_text("metric1", self.metric1.as_deref(), METRIC_MAX_CHARS)?;
        optional_text("metric2", self.metric2.as_deref(), METRIC_MAX_CHARS)?;
        check_opt(self.correlation_value, |value| {
            require_finite("correlation_value", value)
        })?;
        optional_text(
            "correlation_type",
            self.correlation_type.as_deref(),
            CORRELATION_TYPE_MAX_CHARS,
        )?;
        validate_statistics(self.sample_size, self.p_value, self.notes.as_deref())
    }
}

fn validate_statistics(
    sample_size: Option<i64>,
    p_value: Option<f64>,
    notes: Option<&str>,
) -> ValidationResult {
    check_opt(sample_size, |value| require_positive_int("sample_size", value))?;
    check_opt(p_value, |value| require_in_range("p_value", value, 0.0, 1.0))?;
    optional_notes(notes)
}
