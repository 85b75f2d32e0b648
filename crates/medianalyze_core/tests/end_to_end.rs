use medianalyze_core::{
    delete_patient_data, get_db_connection, get_session, init_database, insert_biomedical_signal,
    insert_correlation_result, insert_health_metrics, insert_image_metadata, insert_patient_data,
    insert_spectrum_analysis, retrieve_biomedical_signals, retrieve_health_metrics,
    retrieve_image_metadata, retrieve_patient_data, update_patient_data, BiomedicalSignalQuery,
    ClinicalLevel, DatabaseConfig, Gender, HealthMetricQuery, MedicalImageQuery,
    NewBiomedicalSignal, NewCorrelationResult, NewHealthMetric, NewMedicalImage, NewPatient,
    NewSpectrumAnalysis, PatientQuery, PatientUpdate,
};

#[test]
fn harness_scenario_on_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = get_db_connection(&DatabaseConfig::file(dir.path().join("data").join("medanalyze.db")))
        .unwrap();
    init_database(&db).unwrap();
    let session = get_session(&db).unwrap();

    let patient = insert_patient_data(
        &session,
        &NewPatient::new(18_393, Gender::Male, 175.0, 75.0).with_name("Test Patient"),
    )
    .unwrap();
    let found = retrieve_patient_data(&session, &PatientQuery::by_id(patient.patient_id)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name.as_deref(), Some("Test Patient"));

    let metric = NewHealthMetric {
        systolic_bp: Some(120),
        diastolic_bp: Some(80),
        heart_rate: Some(72),
        body_temperature: Some(36.5),
        cholesterol: Some(ClinicalLevel::Normal),
        glucose: Some(ClinicalLevel::Normal),
        ..NewHealthMetric::new(patient.patient_id)
    };
    insert_health_metrics(&session, &metric).unwrap();
    let metrics_query = HealthMetricQuery::for_patient(patient.patient_id);
    assert_eq!(
        retrieve_health_metrics(&session, &metrics_query).unwrap().len(),
        1
    );

    let updated = update_patient_data(
        &session,
        patient.patient_id,
        &PatientUpdate {
            weight: Some(78.0),
            ..PatientUpdate::default()
        },
    )
    .unwrap();
    assert_eq!(updated.weight, 78.0);

    insert_correlation_result(
        &session,
        &NewCorrelationResult::new("systolic_bp", "cholesterol", 0.65),
    )
    .unwrap();
    insert_image_metadata(
        &session,
        &NewMedicalImage::new(
            patient.patient_id,
            "test_xray.jpg",
            "/data/images/test_xray.jpg",
        )
        .with_image_type("X-ray"),
    )
    .unwrap();
    let signal = insert_biomedical_signal(
        &session,
        &NewBiomedicalSignal::new(patient.patient_id, "ECG", "/data/signals/ecg.csv")
            .with_sampling_rate(250.0),
    )
    .unwrap();
    insert_spectrum_analysis(
        &session,
        &NewSpectrumAnalysis::new(signal.signal_id, "/data/spectrum/freq.csv")
            .with_dominant_frequency(60.0),
    )
    .unwrap();

    assert!(delete_patient_data(&session, patient.patient_id).unwrap());
    assert!(retrieve_health_metrics(&session, &metrics_query)
        .unwrap()
        .is_empty());
    assert!(retrieve_image_metadata(
        &session,
        &MedicalImageQuery {
            patient_id: Some(patient.patient_id),
            ..MedicalImageQuery::default()
        }
    )
    .unwrap()
    .is_empty());
    assert!(retrieve_biomedical_signals(
        &session,
        &BiomedicalSignalQuery {
            patient_id: Some(patient.patient_id),
            ..BiomedicalSignalQuery::default()
        }
    )
    .unwrap()
    .is_empty());

    session.close().unwrap();
}
