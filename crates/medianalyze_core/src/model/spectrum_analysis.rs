//! Spectrum analysis result model.
//!
//! Values are produced elsewhere (FFT tooling) and stored as supplied.

use crate::model::biomedical_signal::SignalId;
use crate::model::validation::{
    check_opt, optional_notes, optional_text, require_non_negative, require_positive,
    require_positive_int, require_text, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Store-assigned spectrum analysis identifier.
pub type AnalysisId = i64;

const PATH_MAX_CHARS: usize = 500;

/// Persisted spectrum analysis row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumAnalysis {
    pub analysis_id: AnalysisId,
    pub signal_id: SignalId,
    pub frequency_data_path: String,
    /// FFT window size in samples.
    pub fft_size: Option<i64>,
    /// Hz per bin.
    pub frequency_resolution: Option<f64>,
    /// Hz.
    pub dominant_frequency: Option<f64>,
    pub power_spectrum_path: Option<String>,
    pub notes: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Insert request for a spectrum analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSpectrumAnalysis {
    pub signal_id: SignalId,
    pub frequency_data_path: String,
    pub fft_size: Option<i64>,
    pub frequency_resolution: Option<f64>,
    pub dominant_frequency: Option<f64>,
    pub power_spectrum_path: Option<String>,
    pub notes: Option<String>,
}

impl NewSpectrumAnalysis {
    pub fn new(signal_id: SignalId, frequency_data_path: impl Into<String>) -> Self {
        Self {
            signal_id,
            frequency_data_path: frequency_data_path.into(),
            fft_size: None,
            frequency_resolution: None,
            dominant_frequency: None,
            power_spectrum_path: None,
            notes: None,
        }
    }

    /// Sets the dominant frequency in Hz.
    pub fn with_dominant_frequency(mut self, dominant_frequency: f64) -> Self {
        self.dominant_frequency = Some(dominant_frequency);
        self
    }

    pub fn validate(&self) -> ValidationResult {
        require_text(
            "frequency_data_path",
            &self.frequency_data_path,
            PATH_MAX_CHARS,
        )?;
        validate_spectrum(
            self.fft_size,
            self.frequency_resolution,
            self.dominant_frequency,
            self.power_spectrum_path.as_deref(),
            self.notes.as_deref(),
        )
    }
}

/// Partial update for a spectrum analysis. The source signal cannot change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumAnalysisUpdate {
    pub frequency_data_path: Option<String>,
    pub fft_size: Option<i64>,
    pub frequency_resolution: Option<f64>,
    pub dominant_frequency: Option<f64>,
    pub power_spectrum_path: Option<String>,
    pub notes: Option<String>,
}

impl SpectrumAnalysisUpdate {
    pub fn validate(&self) -> ValidationResult {
        optional_text(
            "frequency_data_path",
            self.frequency_data_path.as_deref(),
            PATH_MAX_CHARS,
        )?;
        validate_spectrum(
            self.fft_size,
            self.frequency_resolution,
            self.dominant_frequency,
            self.power_spectrum_path.as_deref(),
            self.notes.as_deref(),
        )
    }
}

fn validate_spectrum(
    fft_size: Option<i64>,
    frequency_resolution: Option<f64>,
    dominant_frequency: Option<f64>,
    power_spectrum_path: Option<&str>,
    notes: Option<&str>,
) -> ValidationResult {
    check_opt(fft_size, |value| require_positive_int("fft_size", value))?;
    check_opt(frequency_resolution, |value| {
        require_positive("frequency_resolution", value)
    })?;
    check_opt(dominant_frequency, |value| {
        require_non_negative("dominant_frequency", value)
    })?;
    optional_text("power_spectrum_path", power_spectrum_path, PATH_MAX_CHARS)?;
    optional_notes(notes)
}
