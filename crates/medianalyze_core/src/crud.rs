//! Session-scoped CRUD entry points for every entity.
//!
//! # Responsibility
//! - Expose the insert/retrieve/update/delete function set consumed by the
//!   verification harness and other callers.
//! - Emit one metadata-only log event per call; failures carry the error
//!   code, never the message.
//!
//! # Invariants
//! - Each call commits (or rolls back) before returning.
//! - `retrieve_*` returns an empty vector, never an error, when nothing
//!   matches.
//! - `update_*` fails with `RepoError::NotFound` for unknown ids while
//!   `delete_*` returns `Ok(false)`.

use crate::db::Session;
use crate::model::biomedical_signal::{
    BiomedicalSignal, BiomedicalSignalUpdate, NewBiomedicalSignal, SignalId,
};
use crate::model::correlation_result::{
    CorrelationId, CorrelationResult, CorrelationResultUpdate, NewCorrelationResult,
};
use crate::model::health_metric::{HealthMetric, HealthMetricUpdate, MetricId, NewHealthMetric};
use crate::model::medical_image::{ImageId, MedicalImage, MedicalImageUpdate, NewMedicalImage};
use crate::model::patient::{NewPatient, Patient, PatientId, PatientUpdate};
use crate::model::spectrum_analysis::{
    AnalysisId, NewSpectrumAnalysis, SpectrumAnalysis, SpectrumAnalysisUpdate,
};
use crate::repo::correlation_repo::{
    CorrelationResultQuery, CorrelationResultRepository, SqliteCorrelationResultRepository,
};
use crate::repo::health_metric_repo::{
    HealthMetricQuery, HealthMetricRepository, SqliteHealthMetricRepository,
};
use crate::repo::medical_image_repo::{
    MedicalImageQuery, MedicalImageRepository, SqliteMedicalImageRepository,
};
use crate::repo::patient_repo::{PatientQuery, PatientRepository, SqlitePatientRepository};
use crate::repo::signal_repo::{
    BiomedicalSignalQuery, BiomedicalSignalRepository, SqliteBiomedicalSignalRepository,
};
use crate::repo::spectrum_repo::{
    SpectrumAnalysisQuery, SpectrumAnalysisRepository, SqliteSpectrumAnalysisRepository,
};
use crate::repo::{EntityKind, RepoResult};
use log::{debug, warn};
use std::time::Instant;

/// Persists a new patient and returns it with `patient_id` assigned.
pub fn insert_patient_data(session: &Session, patient: &NewPatient) -> RepoResult<Patient> {
    logged(session, "insert", EntityKind::Patient, || {
        SqlitePatientRepository::try_new(session.connection())?.insert_patient(patient)
    })
}

/// Lists patients matching `query`, newest first.
pub fn retrieve_patient_data(session: &Session, query: &PatientQuery) -> RepoResult<Vec<Patient>> {
    logged(session, "retrieve", EntityKind::Patient, || {
        SqlitePatientRepository::try_new(session.connection())?.list_patients(query)
    })
}

/// Applies the set fields of `update` and refreshes `updated_at`.
pub fn update_patient_data(
    session: &Session,
    patient_id: PatientId,
    update: &PatientUpdate,
) -> RepoResult<Patient> {
    logged(session, "update", EntityKind::Patient, || {
        SqlitePatientRepository::try_new(session.connection())?.update_patient(patient_id, update)
    })
}

/// Deletes a patient together with all dependent records.
///
/// Returns `Ok(false)` when the patient does not exist.
pub fn delete_patient_data(session: &Session, patient_id: PatientId) -> RepoResult<bool> {
    logged(session, "delete", EntityKind::Patient, || {
        SqlitePatientRepository::try_new(session.connection())?.delete_patient(patient_id)
    })
}

/// Persists one vital-sign snapshot for an existing patient.
pub fn insert_health_metrics(
    session: &Session,
    metric: &NewHealthMetric,
) -> RepoResult<HealthMetric> {
    logged(session, "insert", EntityKind::HealthMetric, || {
        SqliteHealthMetricRepository::try_new(session.connection())?.insert_metric(metric)
    })
}

pub fn retrieve_health_metrics(
    session: &Session,
    query: &HealthMetricQuery,
) -> RepoResult<Vec<HealthMetric>> {
    logged(session, "retrieve", EntityKind::HealthMetric, || {
        SqliteHealthMetricRepository::try_new(session.connection())?.list_metrics(query)
    })
}

pub fn update_health_metric(
    session: &Session,
    metric_id: MetricId,
    update: &HealthMetricUpdate,
) -> RepoResult<HealthMetric> {
    logged(session, "update", EntityKind::HealthMetric, || {
        SqliteHealthMetricRepository::try_new(session.connection())?
            .update_metric(metric_id, update)
    })
}

pub fn delete_health_metric(session: &Session, metric_id: MetricId) -> RepoResult<bool> {
    logged(session, "delete", EntityKind::HealthMetric, || {
        SqliteHealthMetricRepository::try_new(session.connection())?.delete_metric(metric_id)
    })
}

/// Records metadata for an image stored outside the database.
pub fn insert_image_metadata(
    session: &Session,
    image: &NewMedicalImage,
) -> RepoResult<MedicalImage> {
    logged(session, "insert", EntityKind::MedicalImage, || {
        SqliteMedicalImageRepository::try_new(session.connection())?.insert_image(image)
    })
}

pub fn retrieve_image_metadata(
    session: &Session,
    query: &MedicalImageQuery,
) -> RepoResult<Vec<MedicalImage>> {
    logged(session, "retrieve", EntityKind::MedicalImage, || {
        SqliteMedicalImageRepository::try_new(session.connection())?.list_images(query)
    })
}

pub fn update_image_metadata(
    session: &Session,
    image_id: ImageId,
    update: &MedicalImageUpdate,
) -> RepoResult<MedicalImage> {
    logged(session, "update", EntityKind::MedicalImage, || {
        SqliteMedicalImageRepository::try_new(session.connection())?.update_image(image_id, update)
    })
}

pub fn delete_image_metadata(session: &Session, image_id: ImageId) -> RepoResult<bool> {
    logged(session, "delete", EntityKind::MedicalImage, || {
        SqliteMedicalImageRepository::try_new(session.connection())?.delete_image(image_id)
    })
}

/// Records metadata for a signal recording stored outside the database.
pub fn insert_biomedical_signal(
    session: &Session,
    signal: &NewBiomedicalSignal,
) -> RepoResult<BiomedicalSignal> {
    logged(session, "insert", EntityKind::BiomedicalSignal, || {
        SqliteBiomedicalSignalRepository::try_new(session.connection())?.insert_signal(signal)
    })
}

pub fn retrieve_biomedical_signals(
    session: &Session,
    query: &BiomedicalSignalQuery,
) -> RepoResult<Vec<BiomedicalSignal>> {
    logged(session, "retrieve", EntityKind::BiomedicalSignal, || {
        SqliteBiomedicalSignalRepository::try_new(session.connection())?.list_signals(query)
    })
}

pub fn update_biomedical_signal(
    session: &Session,
    signal_id: SignalId,
    update: &BiomedicalSignalUpdate,
) -> RepoResult<BiomedicalSignal> {
    logged(session, "update", EntityKind::BiomedicalSignal, || {
        SqliteBiomedicalSignalRepository::try_new(session.connection())?
            .update_signal(signal_id, update)
    })
}

/// Deletes a signal and its spectrum analyses.
pub fn delete_biomedical_signal(session: &Session, signal_id: SignalId) -> RepoResult<bool> {
    logged(session, "delete", EntityKind::BiomedicalSignal, || {
        SqliteBiomedicalSignalRepository::try_new(session.connection())?.delete_signal(signal_id)
    })
}

/// Stores a precomputed correlation between two named metrics.
pub fn insert_correlation_result(
    session: &Session,
    result: &NewCorrelationResult,
) -> RepoResult<CorrelationResult> {
    logged(session, "insert", EntityKind::CorrelationResult, || {
        SqliteCorrelationResultRepository::try_new(session.connection())?
            .insert_correlation(result)
    })
}

pub fn retrieve_correlation_results(
    session: &Session,
    query: &CorrelationResultQuery,
) -> RepoResult<Vec<CorrelationResult>> {
    logged(session, "retrieve", EntityKind::CorrelationResult, || {
        SqliteCorrelationResultRepository::try_new(session.connection())?.list_correlations(query)
    })
}

pub fn update_correlation_result(
    session: &Session,
    correlation_id: CorrelationId,
    update: &CorrelationResultUpdate,
) -> RepoResult<CorrelationResult> {
    logged(session, "update", EntityKind::CorrelationResult, || {
        SqliteCorrelationResultRepository::try_new(session.connection())?
            .update_correlation(correlation_id, update)
    })
}

pub fn delete_correlation_result(
    session: &Session,
    correlation_id: CorrelationId,
) -> RepoResult<bool> {
    logged(session, "delete", EntityKind::CorrelationResult, || {
        SqliteCorrelationResultRepository::try_new(session.connection())?
            .delete_correlation(correlation_id)
    })
}

/// Stores spectrum analysis metadata for an existing signal.
pub fn insert_spectrum_analysis(
    session: &Session,
    analysis: &NewSpectrumAnalysis,
) -> RepoResult<SpectrumAnalysis> {
    logged(session, "insert", EntityKind::SpectrumAnalysis, || {
        SqliteSpectrumAnalysisRepository::try_new(session.connection())?.insert_analysis(analysis)
    })
}

pub fn retrieve_spectrum_analyses(
    session: &Session,
    query: &SpectrumAnalysisQuery,
) -> RepoResult<Vec<SpectrumAnalysis>> {
    logged(session, "retrieve", EntityKind::SpectrumAnalysis, || {
        SqliteSpectrumAnalysisRepository::try_new(session.connection())?.list_analyses(query)
    })
}

pub fn update_spectrum_analysis(
    session: &Session,
    analysis_id: AnalysisId,
    update: &SpectrumAnalysisUpdate,
) -> RepoResult<SpectrumAnalysis> {
    logged(session, "update", EntityKind::SpectrumAnalysis, || {
        SqliteSpectrumAnalysisRepository::try_new(session.connection())?
            .update_analysis(analysis_id, update)
    })
}

pub fn delete_spectrum_analysis(session: &Session, analysis_id: AnalysisId) -> RepoResult<bool> {
    logged(session, "delete", EntityKind::SpectrumAnalysis, || {
        SqliteSpectrumAnalysisRepository::try_new(session.connection())?
            .delete_analysis(analysis_id)
    })
}

fn logged<T>(
    session: &Session,
    op: &'static str,
    entity: EntityKind,
    f: impl FnOnce() -> RepoResult<T>,
) -> RepoResult<T> {
    let started_at = Instant::now();
    let result = f();
    match &result {
        Ok(_) => debug!(
            "event=crud_{} module=crud entity={} status=ok session_id={} duration_ms={}",
            op,
            entity,
            session.id(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=crud_{} module=crud entity={} status=error session_id={} duration_ms={} error_code={}",
            op,
            entity,
            session.id(),
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
    result
}
