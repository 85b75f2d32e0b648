use medianalyze_core::{
    get_db_connection, get_session, init_database, insert_health_metrics, insert_patient_data,
    ClinicalLevel, DatabaseConfig, Gender, NewHealthMetric, NewPatient, Patient,
};
use serde_json::json;

#[test]
fn patient_serializes_with_snake_case_gender() {
    let db = get_db_connection(&DatabaseConfig::in_memory()).unwrap();
    init_database(&db).unwrap();
    let session = get_session(&db).unwrap();
    let patient = insert_patient_data(
        &session,
        &NewPatient::new(18_393, Gender::Male, 175.0, 75.0).with_name("Test Patient"),
    )
    .unwrap();

    let value = serde_json::to_value(&patient).unwrap();
    assert_eq!(value["gender"], json!("male"));
    assert_eq!(value["name"], json!("Test Patient"));
    assert_eq!(value["patient_id"], json!(patient.patient_id));

    let back: Patient = serde_json::from_value(value).unwrap();
    assert_eq!(back, patient);
}

#[test]
fn health_metric_serializes_levels_and_nulls() {
    let db = get_db_connection(&DatabaseConfig::in_memory()).unwrap();
    init_database(&db).unwrap();
    let session = get_session(&db).unwrap();
    let patient =
        insert_patient_data(&session, &NewPatient::new(1, Gender::Female, 50.0, 3.4)).unwrap();
    let metric = insert_health_metrics(
        &session,
        &NewHealthMetric {
            glucose: Some(ClinicalLevel::WellAboveNormal),
            ..NewHealthMetric::new(patient.patient_id)
        },
    )
    .unwrap();

    let value = serde_json::to_value(&metric).unwrap();
    assert_eq!(value["glucose"], json!("well_above_normal"));
    assert_eq!(value["cholesterol"], json!(null));
    assert_eq!(value["smoking"], json!(false));
}
