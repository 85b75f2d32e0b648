//! Field validation shared by every insert/update request type.
//!
//! # Responsibility
//! - Define the semantic `ValidationError` surfaced before any SQL runs.
//! - Provide small field checks reused by the per-entity request types.
//!
//! # Invariants
//! - Validation is pure: it never touches the store.
//! - Foreign-key violations are reported through the same error type so
//!   callers see one "rejected input" category.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected insert/update input. No write happens when this is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace only.
    EmptyField { field: &'static str },
    /// Text field exceeds the column width.
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
        actual: usize,
    },
    /// Numeric field must be strictly greater than zero.
    NonPositive { field: &'static str, value: f64 },
    /// Numeric field must be zero or greater.
    Negative { field: &'static str, value: f64 },
    /// Float field is NaN or infinite.
    NonFinite { field: &'static str },
    /// Numeric field falls outside its closed range.
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Coded integer is not one of the known codes.
    InvalidCode { field: &'static str, value: i64 },
    /// Time window filter or value has `end` before `start`.
    InvalidWindow { start: i64, end: i64 },
    /// Referenced patient does not exist.
    MissingPatient(i64),
    /// Referenced biomedical signal does not exist.
    MissingSignal(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::FieldTooLong {
                field,
                max_chars,
                actual,
            } => write!(
                f,
                "{field} is {actual} characters long; at most {max_chars} allowed"
            ),
            Self::NonPositive { field, value } => {
                write!(f, "{field} must be greater than 0, got {value}")
            }
            Self::Negative { field, value } => write!(f, "{field} must be >= 0, got {value}"),
            Self::NonFinite { field } => write!(f, "{field} must be a finite number"),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} must be within [{min}, {max}], got {value}"),
            Self::InvalidCode { field, value } => write!(f, "unknown {field} code {value}"),
            Self::InvalidWindow { start, end } => {
                write!(f, "window end ({end}) must be >= window start ({start})")
            }
            Self::MissingPatient(id) => write!(f, "referenced patient does not exist: {id}"),
            Self::MissingSignal(id) => {
                write!(f, "referenced biomedical signal does not exist: {id}")
            }
        }
    }
}

impl Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub(crate) fn require_text(field: &'static str, value: &str, max_chars: usize) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    limit_text(field, value, max_chars)
}

pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> ValidationResult {
    match value {
        Some(value) => require_text(field, value, max_chars),
        None => Ok(()),
    }
}

/// Free-form notes may be empty; only the length is bounded.
pub(crate) fn optional_notes(value: Option<&str>) -> ValidationResult {
    match value {
        Some(value) => limit_text("notes", value, NOTES_MAX_CHARS),
        None => Ok(()),
    }
}

pub(crate) const NOTES_MAX_CHARS: usize = 10_000;

fn limit_text(field: &'static str, value: &str, max_chars: usize) -> ValidationResult {
    let actual = value.chars().count();
    if actual > max_chars {
        return Err(ValidationError::FieldTooLong {
            field,
            max_chars,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> ValidationResult {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field });
    }
    Ok(())
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> ValidationResult {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(ValidationError::NonPositive { field, value });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> ValidationResult {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

pub(crate) fn require_in_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> ValidationResult {
    require_finite(field, value)?;
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn require_positive_int(field: &'static str, value: i64) -> ValidationResult {
    if value <= 0 {
        return Err(ValidationError::NonPositive {
            field,
            value: value as f64,
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative_int(field: &'static str, value: i64) -> ValidationResult {
    if value < 0 {
        return Err(ValidationError::Negative {
            field,
            value: value as f64,
        });
    }
    Ok(())
}

/// Applies `check` to the value when present.
pub(crate) fn check_opt<T: Copy>(
    value: Option<T>,
    check: impl FnOnce(T) -> ValidationResult,
) -> ValidationResult {
    match value {
        Some(value) => check(value),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_rejects_blank_and_long_values() {
        assert_eq!(
            require_text("name", "   ", 10).unwrap_err(),
            ValidationError::EmptyField { field: "name" }
        );
        assert_eq!(
            require_text("name", "abcdef", 3).unwrap_err(),
            ValidationError::FieldTooLong {
                field: "name",
                max_chars: 3,
                actual: 6,
            }
        );
        assert!(require_text("name", "abc", 3).is_ok());
    }

    #[test]
    fn require_positive_rejects_zero_and_nan() {
        assert!(matches!(
            require_positive("height", 0.0),
            Err(ValidationError::NonPositive { field: "height", .. })
        ));
        assert_eq!(
            require_positive("height", f64::NAN).unwrap_err(),
            ValidationError::NonFinite { field: "height" }
        );
        assert!(require_positive("height", 0.1).is_ok());
    }

    #[test]
    fn require_in_range_is_inclusive() {
        assert!(require_in_range("p_value", 0.0, 0.0, 1.0).is_ok());
        assert!(require_in_range("p_value", 1.0, 0.0, 1.0).is_ok());
        assert!(require_in_range("p_value", 1.01, 0.0, 1.0).is_err());
    }

    #[test]
    fn notes_may_be_empty_but_bounded() {
        assert!(optional_notes(Some("")).is_ok());
        let long = "x".repeat(NOTES_MAX_CHARS + 1);
        assert!(matches!(
            optional_notes(Some(long.as_str())),
            Err(ValidationError::FieldTooLong { field: "notes", .. })
        ));
    }
}
