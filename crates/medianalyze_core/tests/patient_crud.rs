use medianalyze_core::{
    delete_patient_data, get_db_connection, get_session, init_database, insert_patient_data,
    retrieve_patient_data, update_patient_data, DatabaseConfig, DatabaseConnection, EntityKind,
    Gender, NewPatient, PatientQuery, PatientUpdate, RepoError, Session, ValidationError,
};

fn open_session() -> (DatabaseConnection, Session) {
    let db = get_db_connection(&DatabaseConfig::in_memory()).unwrap();
    init_database(&db).unwrap();
    let session = get_session(&db).unwrap();
    (db, session)
}

fn test_patient() -> NewPatient {
    NewPatient::new(18_393, Gender::Male, 175.0, 75.0).with_name("Test Patient")
}

#[test]
fn insert_then_retrieve_by_id_round_trips_fields() {
    let (_db, session) = open_session();

    let created = insert_patient_data(&session, &test_patient()).unwrap();
    assert!(created.patient_id > 0);
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);

    let found = retrieve_patient_data(&session, &PatientQuery::by_id(created.patient_id)).unwrap();
    assert_eq!(found, vec![created.clone()]);
    assert_eq!(found[0].name.as_deref(), Some("Test Patient"));
    assert_eq!(found[0].age, 18_393);
    assert_eq!(found[0].gender, Gender::Male);
}

#[test]
fn name_is_optional() {
    let (_db, session) = open_session();

    let created =
        insert_patient_data(&session, &NewPatient::new(0, Gender::Female, 49.5, 3.2)).unwrap();
    assert_eq!(created.name, None);
    assert_eq!(created.age, 0);
}

#[test]
fn retrieve_unknown_id_returns_empty() {
    let (_db, session) = open_session();

    let found = retrieve_patient_data(&session, &PatientQuery::by_id(4_242)).unwrap();
    assert!(found.is_empty());
}

#[test]
fn retrieve_filters_by_name_substring_and_gender() {
    let (_db, session) = open_session();
    let alice = insert_patient_data(
        &session,
        &NewPatient::new(10_000, Gender::Female, 165.0, 60.0).with_name("Alice Smith"),
    )
    .unwrap();
    let bob = insert_patient_data(
        &session,
        &NewPatient::new(12_000, Gender::Male, 180.0, 85.0).with_name("Bob Smith"),
    )
    .unwrap();
    insert_patient_data(
        &session,
        &NewPatient::new(9_000, Gender::Female, 158.0, 52.0).with_name("Carol Jones"),
    )
    .unwrap();

    let smiths = retrieve_patient_data(
        &session,
        &PatientQuery {
            name: Some("Smith".to_string()),
            ..PatientQuery::default()
        },
    )
    .unwrap();
    assert_eq!(smiths, vec![bob.clone(), alice.clone()]);

    let female_smiths = retrieve_patient_data(
        &session,
        &PatientQuery {
            name: Some("Smith".to_string()),
            gender: Some(Gender::Female),
            ..PatientQuery::default()
        },
    )
    .unwrap();
    assert_eq!(female_smiths, vec![alice.clone()]);

    let lowercase = retrieve_patient_data(
        &session,
        &PatientQuery {
            name: Some("smith".to_string()),
            ..PatientQuery::default()
        },
    )
    .unwrap();
    assert_eq!(lowercase, vec![bob, alice]);
}

#[test]
fn name_filter_treats_wildcards_literally() {
    let (_db, session) = open_session();
    let percent = insert_patient_data(
        &session,
        &NewPatient::new(10_000, Gender::Female, 165.0, 60.0).with_name("Dose 100%"),
    )
    .unwrap();
    insert_patient_data(
        &session,
        &NewPatient::new(12_000, Gender::Male, 180.0, 85.0).with_name("Dose 1000"),
    )
    .unwrap();
    let test_patient = insert_patient_data(&session, &test_patient()).unwrap();

    let by_percent = retrieve_patient_data(
        &session,
        &PatientQuery {
            name: Some("100%".to_string()),
            ..PatientQuery::default()
        },
    )
    .unwrap();
    assert_eq!(by_percent, vec![percent]);

    let by_underscore = retrieve_patient_data(
        &session,
        &PatientQuery {
            name: Some("t_p".to_string()),
            ..PatientQuery::default()
        },
    )
    .unwrap();
    assert!(by_underscore.is_empty());

    let by_prefix = retrieve_patient_data(
        &session,
        &PatientQuery {
            name: Some("test".to_string()),
            ..PatientQuery::default()
        },
    )
    .unwrap();
    assert_eq!(by_prefix, vec![test_patient]);
}

#[test]
fn retrieve_lists_newest_first_and_honors_limit() {
    let (_db, session) = open_session();
    let mut ids = Vec::new();
    for age in [100, 200, 300] {
        let patient =
            insert_patient_data(&session, &NewPatient::new(age, Gender::Male, 170.0, 70.0))
                .unwrap();
        ids.push(patient.patient_id);
    }

    let all = retrieve_patient_data(&session, &PatientQuery::default()).unwrap();
    let listed: Vec<_> = all.iter().map(|patient| patient.patient_id).collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let limited = retrieve_patient_data(
        &session,
        &PatientQuery {
            limit: Some(2),
            ..PatientQuery::default()
        },
    )
    .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].patient_id, ids[2]);
}

#[test]
fn update_changes_only_given_fields() {
    let (_db, session) = open_session();
    let created = insert_patient_data(&session, &test_patient()).unwrap();

    let updated = update_patient_data(
        &session,
        created.patient_id,
        &PatientUpdate {
            weight: Some(78.0),
            ..PatientUpdate::default()
        },
    )
    .unwrap();

    assert_eq!(updated.weight, 78.0);
    assert_eq!(updated.height, created.height);
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.age, created.age);
    assert_eq!(updated.gender, created.gender);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let found = retrieve_patient_data(&session, &PatientQuery::by_id(created.patient_id)).unwrap();
    assert_eq!(found[0].weight, 78.0);
}

#[test]
fn empty_update_returns_current_record() {
    let (_db, session) = open_session();
    let created = insert_patient_data(&session, &test_patient()).unwrap();

    let unchanged =
        update_patient_data(&session, created.patient_id, &PatientUpdate::default()).unwrap();
    assert_eq!(unchanged, created);
}

#[test]
fn update_unknown_patient_is_not_found() {
    let (_db, session) = open_session();

    let err = update_patient_data(
        &session,
        999,
        &PatientUpdate {
            weight: Some(80.0),
            ..PatientUpdate::default()
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Patient,
            id: 999
        }
    ));

    let err = update_patient_data(&session, 999, &PatientUpdate::default()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 999, .. }));
}

#[test]
fn invalid_patient_fields_are_rejected_before_write() {
    let (_db, session) = open_session();

    let err = insert_patient_data(&session, &NewPatient::new(100, Gender::Male, 0.0, 70.0))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::NonPositive { field: "height", .. })
    ));

    let err = insert_patient_data(&session, &NewPatient::new(-1, Gender::Male, 170.0, 70.0))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::Negative { field: "age", .. })
    ));

    let err = insert_patient_data(
        &session,
        &NewPatient::new(100, Gender::Male, 170.0, 70.0).with_name("x".repeat(101)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::FieldTooLong { field: "name", .. })
    ));

    assert!(retrieve_patient_data(&session, &PatientQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn delete_returns_true_once_then_false() {
    let (_db, session) = open_session();
    let created = insert_patient_data(&session, &test_patient()).unwrap();

    assert!(delete_patient_data(&session, created.patient_id).unwrap());
    assert!(retrieve_patient_data(&session, &PatientQuery::by_id(created.patient_id))
        .unwrap()
        .is_empty());
    assert!(!delete_patient_data(&session, created.patient_id).unwrap());
}
