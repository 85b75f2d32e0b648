//! Medical image metadata model.
//!
//! Only metadata is stored; `image_path` points at an externally managed
//! file and is never opened here.

use crate::model::patient::PatientId;
use crate::model::validation::{
    check_opt, optional_notes, optional_text, require_non_negative_int, require_positive_int,
    require_text, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Store-assigned medical image identifier.
pub type ImageId = i64;

const FILENAME_MAX_CHARS: usize = 255;
const PATH_MAX_CHARS: usize = 500;
const IMAGE_TYPE_MAX_CHARS: usize = 50;
const PROCESSING_METHOD_MAX_CHARS: usize = 100;

/// Persisted medical image metadata row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalImage {
    pub image_id: ImageId,
    pub patient_id: PatientId,
    pub filename: String,
    pub image_path: String,
    /// Free-text category such as `X-ray`, `MRI` or `CT`.
    pub image_type: Option<String>,
    /// Applied processing step such as `grayscale`.
    pub processing_method: Option<String>,
    pub original_filename: String,
    /// File size in bytes.
    pub file_size: Option<i64>,
    /// Width in pixels.
    pub width: Option<i64>,
    /// Height in pixels.
    pub height: Option<i64>,
    pub notes: Option<String>,
    /// Unix epoch milliseconds.
    pub uploaded_at: i64,
}

/// Insert request for image metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedicalImage {
    pub patient_id: PatientId,
    pub filename: String,
    pub image_path: String,
    pub image_type: Option<String>,
    pub processing_method: Option<String>,
    /// Defaults to `filename` when `None`.
    pub original_filename: Option<String>,
    pub file_size: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub notes: Option<String>,
}

impl NewMedicalImage {
    pub fn new(
        patient_id: PatientId,
        filename: impl Into<String>,
        image_path: impl Into<String>,
    ) -> Self {
        Self {
            patient_id,
            filename: filename.into(),
            image_path: image_path.into(),
            image_type: None,
            processing_method: None,
            original_filename: None,
            file_size: None,
            width: None,
            height: None,
            notes: None,
        }
    }

    /// Sets the image category.
    pub fn with_image_type(mut self, image_type: impl Into<String>) -> Self {
        self.image_type = Some(image_type.into());
        self
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("filename", &self.filename, FILENAME_MAX_CHARS)?;
        require_text("image_path", &self.image_path, PATH_MAX_CHARS)?;
        optional_text(
            "original_filename",
            self.original_filename.as_deref(),
            FILENAME_MAX_CHARS,
        )?;
        validate_descriptors(
            self.image_type.as_deref(),
            self.processing_method.as_deref(),
            self.file_size,
            self.width,
            self.height,
            self.notes.as_deref(),
        )
    }
}

/// Partial update for image metadata. The owning patient cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicalImageUpdate {
    pub filename: Option<String>,
    pub image_path: Option<String>,
    pub image_type: Option<String>,
    pub processing_method: Option<String>,
    pub file_size: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub notes: Option<String>,
}

impl MedicalImageUpdate {
    pub fn validate(&self) -> ValidationResult {
        optional_text("filename", self.filename.as_deref(), FILENAME_MAX_CHARS)?;
        optional_text("image_path", self.image_path.as_deref(), PATH_MAX_CHARS)?;
        validate_descriptors(
            self.image_type.as_deref(),
            self.processing_method.as_deref(),
            self.file_size,
            self.width,
            self.height,
            self.notes.as_deref(),
        )
    }
}

fn validate_descriptors(
    image_type: Option<&str>,
    processing_method: Option<&str>,
    file_size: Option<i64>,
    width: Option<i64>,
    height: Option<i64>,
    notes: Option<&str>,
) -> ValidationResult {
    optional_text("image_type", image_type, IMAGE_TYPE_MAX_CHARS)?;
    optional_text(
        "processing_method",
        processing_method,
        PROCESSING_METHOD_MAX_CHARS,
    )?;
    check_opt(file_size, |value| require_non_negative_int("file_size", value))?;
    check_opt(width, |value| require_positive_int("width", value))?;
    check_opt(height, |value| require_positive_int("height", value))?;
    optional_notes(notes)
}
