//! Domain records for the MediAnalyze store.
//!
//! # Responsibility
//! - Define the six persisted record types and their request shapes.
//! - Validate caller input before it reaches a repository.
//!
//! # Invariants
//! - Identifiers are assigned by the store and immutable afterwards.
//! - `Patient` is the ownership root for metrics, images and signals;
//!   `BiomedicalSignal` owns spectrum analyses.
//! - Image and signal records hold file paths only, never file content.

pub mod biomedical_signal;
pub mod correlation_result;
pub mod health_metric;
pub mod medical_image;
pub mod patient;
pub mod spectrum_analysis;
pub mod validation;
