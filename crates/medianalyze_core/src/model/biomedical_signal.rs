//! Biomedical signal metadata model.
//!
//! # Responsibility
//! - Describe an externally stored ECG/EEG recording and its acquisition
//!   parameters.
//!
//! # Invariants
//! - Every signal belongs to an existing patient.
//! - Deleting a signal removes its spectrum analyses (store cascade).

use crate::model::patient::PatientId;
use crate::model::validation::{
    check_opt, optional_notes, optional_text, require_positive, require_positive_int,
    require_text, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Store-assigned biomedical signal identifier.
pub type SignalId = i64;

const SIGNAL_TYPE_MAX_CHARS: usize = 50;
const PATH_MAX_CHARS: usize = 500;

/// Persisted biomedical signal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomedicalSignal {
    pub signal_id: SignalId,
    pub patient_id: PatientId,
    /// Signal family such as `ECG` or `EEG`.
    pub signal_type: String,
    pub signal_data_path: String,
    /// Hz.
    pub sampling_rate: Option<f64>,
    /// Seconds.
    pub duration: Option<f64>,
    pub number_of_channels: Option<i64>,
    pub notes: Option<String>,
    /// Unix epoch milliseconds.
    pub recorded_at: i64,
}

/// Insert request for signal metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBiomedicalSignal {
    pub patient_id: PatientId,
    pub signal_type: String,
    pub signal_data_path: String,
    pub sampling_rate: Option<f64>,
    pub duration: Option<f64>,
    pub number_of_channels: Option<i64>,
    pub notes: Option<String>,
}

impl NewBiomedicalSignal {
    pub fn new(
        patient_id: PatientId,
        signal_type: impl Into<String>,
        signal_data_path: impl Into<String>,
    ) -> Self {
        Self {
            patient_id,
            signal_type: signal_type.into(),
            signal_data_path: signal_data_path.into(),
            sampling_rate: None,
            duration: None,
            number_of_channels: None,
            notes: None,
        }
    }

    /// Sets the sampling rate in Hz.
    pub fn with_sampling_rate(mut self, sampling_rate: f64) -> Self {
        self.sampling_rate = Some(sampling_rate);
        self
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("signal_type", &self.signal_type, SIGNAL_TYPE_MAX_CHARS)?;
        require_text("signal_data_path", &self.signal_data_path, PATH_MAX_CHARS)?;
        validate_acquisition(
            self.sampling_rate,
            self.duration,
            self.number_of_channels,
            self.notes.as_deref(),
        )
    }
}

/// Partial update for signal metadata. The owning patient cannot change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BiomedicalSignalUpdate {
    pub signal_type: Option<String>,
    pub signal_data_path: Option<String>,
    pub sampling_rate: Option<f64>,
    pub duration: Option<f64>,
    pub number_of_channels: Option<i64>,
    pub notes: Option<String>,
}

impl BiomedicalSignalUpdate {
    pub fn validate(&self) -> ValidationResult {
        optional_text(
            "signal_type",
            self.signal_type.as_deref(),
            SIGNAL_TYPE_MAX_CHARS,
        )?;
        optional_text(
            "signal_data_path",
            self.signal_data_path.as_deref(),
            PATH_MAX_CHARS,
        )?;
        validate_acquisition(
            self.sampling_rate,
            self.duration,
            self.number_of_channels,
            self.notes.as_deref(),
        )
    }
}

fn validate_acquisition(
    sampling_rate: Option<f64>,
    duration: Option<f64>,
    number_of_channels: Option<i64>,
    notes: Option<&str>,
) -> ValidationResult {
    check_opt(sampling_rate, |value| require_positive("sampling_rate", value))?;
    check_opt(duration, |value| require_positive("duration", value))?;
    check_opt(number_of_channels, |value| {
        require_positive_int("number_of_channels", value)
    })?;
    optional_notes(notes)
}
