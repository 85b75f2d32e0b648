//! Persistence core for MediAnalyze Pro.
//! This crate owns the clinical data schema and every rule about how records
//! are created, read, changed and removed.

pub mod config;
pub mod crud;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{ConfigError, DatabaseConfig, DatabaseLocation};
pub use crud::*;
pub use db::{
    get_db_connection, get_session, init_database, reset_database, DatabaseConnection, DbError,
    DbResult, Session, EXPECTED_TABLES,
};
pub use logging::{
    default_log_level, init_logging, logging_status, resolve_log_dir, LoggingError, LoggingStatus,
};
pub use model::biomedical_signal::{
    BiomedicalSignal, BiomedicalSignalUpdate, NewBiomedicalSignal, SignalId,
};
pub use model::correlation_result::{
    CorrelationId, CorrelationResult, CorrelationResultUpdate, NewCorrelationResult,
    DEFAULT_CORRELATION_TYPE,
};
pub use model::health_metric::{
    ClinicalLevel, HealthMetric, HealthMetricUpdate, MetricId, NewHealthMetric,
};
pub use model::medical_image::{ImageId, MedicalImage, MedicalImageUpdate, NewMedicalImage};
pub use model::patient::{Gender, NewPatient, Patient, PatientId, PatientUpdate};
pub use model::spectrum_analysis::{
    AnalysisId, NewSpectrumAnalysis, SpectrumAnalysis, SpectrumAnalysisUpdate,
};
pub use model::validation::ValidationError;
pub use repo::correlation_repo::CorrelationResultQuery;
pub use repo::health_metric_repo::HealthMetricQuery;
pub use repo::medical_image_repo::MedicalImageQuery;
pub use repo::patient_repo::PatientQuery;
pub use repo::signal_repo::BiomedicalSignalQuery;
pub use repo::spectrum_repo::SpectrumAnalysisQuery;
pub use repo::{EntityKind, RepoError, RepoResult};

/// Minimal linkage check used by the harness.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
