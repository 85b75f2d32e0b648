use medianalyze_core::{
    delete_biomedical_signal, delete_health_metric, delete_image_metadata, delete_patient_data,
    delete_spectrum_analysis, get_db_connection, get_session, init_database,
    insert_biomedical_signal, insert_health_metrics, insert_image_metadata, insert_patient_data,
    insert_spectrum_analysis, retrieve_biomedical_signals, retrieve_health_metrics,
    retrieve_image_metadata, retrieve_spectrum_analyses, update_biomedical_signal,
    update_health_metric, update_image_metadata, update_spectrum_analysis,
    BiomedicalSignalQuery, BiomedicalSignalUpdate, ClinicalLevel, DatabaseConfig,
    DatabaseConnection, EntityKind, Gender, HealthMetricQuery, HealthMetricUpdate,
    MedicalImageQuery, MedicalImageUpdate, NewBiomedicalSignal, NewHealthMetric, NewMedicalImage,
    NewPatient, NewSpectrumAnalysis, Patient, RepoError, Session, SpectrumAnalysisQuery,
    SpectrumAnalysisUpdate, ValidationError,
};

fn open_session() -> (DatabaseConnection, Session) {
    let db = get_db_connection(&DatabaseConfig::in_memory()).unwrap();
    init_database(&db).unwrap();
    let session = get_session(&db).unwrap();
    (db, session)
}

fn seed_patient(session: &Session) -> Patient {
    insert_patient_data(
        session,
        &NewPatient::new(18_393, Gender::Male, 175.0, 75.0).with_name("Test Patient"),
    )
    .unwrap()
}

fn vitals(patient_id: i64) -> NewHealthMetric {
    NewHealthMetric {
        systolic_bp: Some(120),
        diastolic_bp: Some(80),
        heart_rate: Some(72),
        body_temperature: Some(36.5),
        cholesterol: Some(ClinicalLevel::Normal),
        glucose: Some(ClinicalLevel::Normal),
        ..NewHealthMetric::new(patient_id)
    }
}

#[test]
fn health_metric_insert_and_retrieve_for_patient() {
    let (_db, session) = open_session();
    let patient = seed_patient(&session);

    let metric = insert_health_metrics(&session, &vitals(patient.patient_id)).unwrap();
    assert_eq!(metric.patient_id, patient.patient_id);
    assert_eq!(metric.systolic_bp, Some(120));
    assert_eq!(metric.cholesterol, Some(ClinicalLevel::Normal));
    assert!(!metric.smoking);
    assert_eq!(metric.cardiovascular_disease, None);
    assert!(metric.recorded_at > 0);

    let metrics = retrieve_health_metrics(
        &session,
        &HealthMetricQuery::for_patient(patient.patient_id),
    )
    .unwrap();
    assert_eq!(metrics, vec![metric]);
}

#[test]
fn health_metric_for_missing_patient_is_rejected_without_write() {
    let (_db, session) = open_session();

    let err = insert_health_metrics(&session, &vitals(404)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingPatient(404))
    ));
    assert!(retrieve_health_metrics(&session, &HealthMetricQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn health_metric_time_window_filters_and_orders() {
    let (_db, session) = open_session();
    let patient = seed_patient(&session);
    for recorded_at in [1_000, 2_000, 3_000] {
        insert_health_metrics(
            &session,
            &NewHealthMetric {
                recorded_at: Some(recorded_at),
                ..vitals(patient.patient_id)
            },
        )
        .unwrap();
    }

    let window = retrieve_health_metrics(
        &session,
        &HealthMetricQuery {
            recorded_from: Some(1_500),
            recorded_to: Some(3_000),
            ..HealthMetricQuery::for_patient(patient.patient_id)
        },
    )
    .unwrap();
    let stamps: Vec<_> = window.iter().map(|metric| metric.recorded_at).collect();
    assert_eq!(stamps, vec![3_000, 2_000]);

    let err = retrieve_health_metrics(
        &session,
        &HealthMetricQuery {
            recorded_from: Some(3_000),
            recorded_to: Some(1_000),
            ..HealthMetricQuery::default()
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidWindow {
            start: 3_000,
            end: 1_000
        })
    ));
}

#[test]
fn health_metric_update_and_delete() {
    let (_db, session) = open_session();
    let patient = seed_patient(&session);
    let metric = insert_health_metrics(&session, &vitals(patient.patient_id)).unwrap();

    let updated = update_health_metric(
        &session,
        metric.metric_id,
        &HealthMetricUpdate {
            heart_rate: Some(95),
            smoking: Some(true),
            cardiovascular_disease: Some(false),
            ..HealthMetricUpdate::default()
        },
    )
    .unwrap();
    assert_eq!(updated.heart_rate, Some(95));
    assert!(updated.smoking);
    assert_eq!(updated.cardiovascular_disease, Some(false));
    assert_eq!(updated.systolic_bp, metric.systolic_bp);
    assert_eq!(updated.recorded_at, metric.recorded_at);

    let err = update_health_metric(
        &session,
        metric.metric_id + 100,
        &HealthMetricUpdate {
            heart_rate: Some(60),
            ..HealthMetricUpdate::default()
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::HealthMetric,
            ..
        }
    ));

    assert!(delete_health_metric(&session, metric.metric_id).unwrap());
    assert!(!delete_health_metric(&session, metric.metric_id).unwrap());
}

#[test]
fn image_metadata_defaults_original_filename() {
    let (_db, session) = open_session();
    let patient = seed_patient(&session);

    let image = insert_image_metadata(
        &session,
        &NewMedicalImage::new(
            patient.patient_id,
            "test_xray.jpg",
            "/data/images/test_xray.jpg",
        )
        .with_image_type("X-ray"),
    )
    .unwrap();
    assert_eq!(image.original_filename, "test_xray.jpg");
    assert_eq!(image.image_type.as_deref(), Some("X-ray"));

    let by_type = retrieve_image_metadata(
        &session,
        &MedicalImageQuery {
            image_type: Some("X-ray".to_string()),
            ..MedicalImageQuery::default()
        },
    )
    .unwrap();
    assert_eq!(by_type, vec![image.clone()]);

    let by_other_type = retrieve_image_metadata(
        &session,
        &MedicalImageQuery {
            image_type: Some("MRI".to_string()),
            ..MedicalImageQuery::default()
        },
    )
    .unwrap();
    assert!(by_other_type.is_empty());

    let updated = update_image_metadata(
        &session,
        image.image_id,
        &MedicalImageUpdate {
            processing_method: Some("histogram_equalization".to_string()),
            width: Some(512),
            height: Some(512),
            ..MedicalImageUpdate::default()
        },
    )
    .unwrap();
    assert_eq!(
        updated.processing_method.as_deref(),
        Some("histogram_equalization")
    );
    assert_eq!(updated.filename, image.filename);

    assert!(delete_image_metadata(&session, image.image_id).unwrap());
    assert!(!delete_image_metadata(&session, image.image_id).unwrap());
}

#[test]
fn image_requires_existing_patient_and_paths() {
    let (_db, session) = open_session();

    let err = insert_image_metadata(&session, &NewMedicalImage::new(77, "scan.png", "/scan.png"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingPatient(77))
    ));

    let patient = seed_patient(&session);
    let err = insert_image_metadata(
        &session,
        &NewMedicalImage::new(patient.patient_id, "scan.png", "  "),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyField { field: "image_path" })
    ));
}

#[test]
fn signal_and_spectrum_lifecycle() {
    let (_db, session) = open_session();
    let patient = seed_patient(&session);

    let signal = insert_biomedical_signal(
        &session,
        &NewBiomedicalSignal::new(patient.patient_id, "ECG", "/data/signals/ecg.csv")
            .with_sampling_rate(250.0),
    )
    .unwrap();
    assert_eq!(signal.sampling_rate, Some(250.0));

    let analysis = insert_spectrum_analysis(
        &session,
        &NewSpectrumAnalysis::new(signal.signal_id, "/data/spectrum/freq.csv")
            .with_dominant_frequency(60.0),
    )
    .unwrap();
    assert_eq!(analysis.signal_id, signal.signal_id);
    assert_eq!(analysis.dominant_frequency, Some(60.0));

    let updated_signal = update_biomedical_signal(
        &session,
        signal.signal_id,
        &BiomedicalSignalUpdate {
            number_of_channels: Some(12),
            ..BiomedicalSignalUpdate::default()
        },
    )
    .unwrap();
    assert_eq!(updated_signal.number_of_channels, Some(12));
    assert_eq!(updated_signal.sampling_rate, Some(250.0));

    let updated_analysis = update_spectrum_analysis(
        &session,
        analysis.analysis_id,
        &SpectrumAnalysisUpdate {
            fft_size: Some(1024),
            ..SpectrumAnalysisUpdate::default()
        },
    )
    .unwrap();
    assert_eq!(updated_analysis.fft_size, Some(1024));
    assert_eq!(updated_analysis.dominant_frequency, Some(60.0));

    let signals = retrieve_biomedical_signals(
        &session,
        &BiomedicalSignalQuery {
            patient_id: Some(patient.patient_id),
            signal_type: Some("ECG".to_string()),
            ..BiomedicalSignalQuery::default()
        },
    )
    .unwrap();
    assert_eq!(signals, vec![updated_signal]);

    assert!(delete_spectrum_analysis(&session, analysis.analysis_id).unwrap());
    assert!(!delete_spectrum_analysis(&session, analysis.analysis_id).unwrap());
}

#[test]
fn spectrum_for_missing_signal_is_rejected() {
    let (_db, session) = open_session();

    let err = insert_spectrum_analysis(&session, &NewSpectrumAnalysis::new(31, "/f.csv"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingSignal(31))
    ));
}

#[test]
fn updating_unknown_dependent_records_is_not_found() {
    let (_db, session) = open_session();

    let err = update_image_metadata(
        &session,
        404,
        &MedicalImageUpdate {
            width: Some(512),
            ..MedicalImageUpdate::default()
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::MedicalImage,
            id: 404
        }
    ));

    let err = update_biomedical_signal(
        &session,
        405,
        &BiomedicalSignalUpdate {
            number_of_channels: Some(12),
            ..BiomedicalSignalUpdate::default()
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::BiomedicalSignal,
            id: 405
        }
    ));

    let err = update_spectrum_analysis(
        &session,
        406,
        &SpectrumAnalysisUpdate {
            fft_size: Some(1024),
            ..SpectrumAnalysisUpdate::default()
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::SpectrumAnalysis,
            id: 406
        }
    ));

    let err = update_image_metadata(&session, 407, &MedicalImageUpdate::default()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 407, .. }));
}

#[test]
fn deleting_signal_cascades_to_spectrum_analyses() {
    let (_db, session) = open_session();
    let patient = seed_patient(&session);
    let signal = insert_biomedical_signal(
        &session,
        &NewBiomedicalSignal::new(patient.patient_id, "EEG", "/data/signals/eeg.edf"),
    )
    .unwrap();
    insert_spectrum_analysis(&session, &NewSpectrumAnalysis::new(signal.signal_id, "/a.csv"))
        .unwrap();
    insert_spectrum_analysis(&session, &NewSpectrumAnalysis::new(signal.signal_id, "/b.csv"))
        .unwrap();

    assert!(delete_biomedical_signal(&session, signal.signal_id).unwrap());

    let remaining = retrieve_spectrum_analyses(
        &session,
        &SpectrumAnalysisQuery {
            signal_id: Some(signal.signal_id),
            ..SpectrumAnalysisQuery::default()
        },
    )
    .unwrap();
    assert!(remaining.is_empty());
}

#[test]
fn deleting_patient_cascades_to_every_dependent_table() {
    let (_db, session) = open_session();
    let patient = seed_patient(&session);
    let other = seed_patient(&session);

    for _ in 0..3 {
        insert_health_metrics(&session, &vitals(patient.patient_id)).unwrap();
    }
    insert_health_metrics(&session, &vitals(other.patient_id)).unwrap();
    insert_image_metadata(
        &session,
        &NewMedicalImage::new(patient.patient_id, "ct.dcm", "/data/images/ct.dcm"),
    )
    .unwrap();
    let signal = insert_biomedical_signal(
        &session,
        &NewBiomedicalSignal::new(patient.patient_id, "ECG", "/data/signals/ecg.csv"),
    )
    .unwrap();
    insert_spectrum_analysis(
        &session,
        &NewSpectrumAnalysis::new(signal.signal_id, "/data/spectrum/freq.csv"),
    )
    .unwrap();

    assert!(delete_patient_data(&session, patient.patient_id).unwrap());

    let metrics = retrieve_health_metrics(
        &session,
        &HealthMetricQuery::for_patient(patient.patient_id),
    )
    .unwrap();
    assert!(metrics.is_empty());

    let images = retrieve_image_metadata(
        &session,
        &MedicalImageQuery {
            patient_id: Some(patient.patient_id),
            ..MedicalImageQuery::default()
        },
    )
    .unwrap();
    assert!(images.is_empty());

    let signals = retrieve_biomedical_signals(
        &session,
        &BiomedicalSignalQuery {
            patient_id: Some(patient.patient_id),
            ..BiomedicalSignalQuery::default()
        },
    )
    .unwrap();
    assert!(signals.is_empty());

    let analyses = retrieve_spectrum_analyses(&session, &SpectrumAnalysisQuery::default()).unwrap();
    assert!(analyses.is_empty());

    let untouched = retrieve_health_metrics(
        &session,
        &HealthMetricQuery::for_patient(other.patient_id),
    )
    .unwrap();
    assert_eq!(untouched.len(), 1);
}
