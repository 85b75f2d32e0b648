//! Three-phase verification of the persistence layer.
//!
//! Phases run in order and never abort the suite: a failing phase is
//! reported with its full cause chain and recorded as failed.

use anyhow::{anyhow, ensure, Context, Result};
use log::{error, info};
use medianalyze_core::{
    core_version, delete_patient_data, get_db_connection, get_session, init_database,
    insert_biomedical_signal, insert_correlation_result, insert_health_metrics,
    insert_image_metadata, insert_patient_data, insert_spectrum_analysis, ping,
    retrieve_health_metrics, retrieve_patient_data, update_patient_data, ClinicalLevel,
    DatabaseConfig, DatabaseConnection, Gender, HealthMetricQuery, NewBiomedicalSignal,
    NewCorrelationResult, NewHealthMetric, NewMedicalImage, NewPatient, NewSpectrumAnalysis,
    PatientQuery, PatientUpdate, EXPECTED_TABLES,
};
use std::time::Instant;

/// Result of one harness phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub name: &'static str,
    pub passed: bool,
}

/// Runs every phase against the store described by `config`.
pub fn run_all(config: &DatabaseConfig) -> Vec<PhaseOutcome> {
    let mut outcomes = Vec::with_capacity(3);

    outcomes.push(record("Core linkage", check_linkage()));

    let initialized = check_initialization(config);
    let db = match initialized {
        Ok(db) => {
            outcomes.push(record("Database initialization", Ok(())));
            Some(db)
        }
        Err(err) => {
            outcomes.push(record("Database initialization", Err(err)));
            None
        }
    };

    let crud = match &db {
        Some(db) => run_crud_scenario(db),
        None => Err(anyhow!("skipped: database initialization did not succeed")),
    };
    outcomes.push(record("CRUD operations", crud));

    outcomes
}

/// Prints the per-phase summary and returns whether everything passed.
pub fn print_summary(outcomes: &[PhaseOutcome]) -> bool {
    println!();
    println!("== Summary ==");
    for outcome in outcomes {
        let status = if outcome.passed { "PASSED" } else { "FAILED" };
        println!("{}: {}", outcome.name, status);
    }

    let all_passed = outcomes.iter().all(|outcome| outcome.passed);
    if all_passed {
        println!("All phases passed.");
    } else {
        println!("Some phases failed; see the errors above.");
    }
    all_passed
}

fn record(name: &'static str, result: Result<()>) -> PhaseOutcome {
    match result {
        Ok(()) => PhaseOutcome { name, passed: true },
        Err(err) => {
            println!("  error: {err:#}");
            error!("event=harness_phase module=cli status=error phase={name:?} error={err:#}");
            PhaseOutcome {
                name,
                passed: false,
            }
        }
    }
}

fn check_linkage() -> Result<()> {
    println!("== Phase 1: core linkage ==");
    ensure!(ping() == "pong", "core ping returned an unexpected value");
    ensure!(!core_version().is_empty(), "core version is empty");
    println!("  core linked, version {}", core_version());
    Ok(())
}

fn check_initialization(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    println!();
    println!("== Phase 2: database initialization ==");
    let started_at = Instant::now();

    let db = get_db_connection(config).context("failed to open the store")?;
    println!("  store: {}", db.location());
    init_database(&db).context("failed to initialize the schema")?;

    let tables = db.table_names().context("failed to inspect the schema")?;
    println!("  tables present: {}", tables.len());
    for table in &tables {
        let marker = if EXPECTED_TABLES.contains(&table.as_str()) {
            "ok"
        } else {
            "extra"
        };
        println!("    [{marker}] {table}");
    }

    let missing: Vec<&str> = EXPECTED_TABLES
        .iter()
        .copied()
        .filter(|expected| !tables.iter().any(|table| table == expected))
        .collect();
    ensure!(missing.is_empty(), "missing tables: {}", missing.join(", "));

    info!(
        "event=harness_init module=cli status=ok duration_ms={} table_count={}",
        started_at.elapsed().as_millis(),
        tables.len()
    );
    Ok(db)
}

fn run_crud_scenario(db: &DatabaseConnection) -> Result<()> {
    println!();
    println!("== Phase 3: CRUD operations ==");
    let session = get_session(db).context("failed to open a session")?;

    let patient = insert_patient_data(
        &session,
        &NewPatient::new(18_393, Gender::Male, 175.0, 75.0).with_name("Test Patient"),
    )
    .context("insert_patient_data failed")?;
    println!("  1. patient inserted, id {}", patient.patient_id);

    let found = retrieve_patient_data(&session, &PatientQuery::by_id(patient.patient_id))
        .context("retrieve_patient_data failed")?;
    ensure!(
        found.len() == 1 && found[0].name.as_deref() == Some("Test Patient"),
        "expected one patient named `Test Patient`, got {} record(s)",
        found.len()
    );
    println!("  2. patient retrieved");

    let mut metric = NewHealthMetric::new(patient.patient_id);
    metric.systolic_bp = Some(120);
    metric.diastolic_bp = Some(80);
    metric.heart_rate = Some(72);
    metric.body_temperature = Some(36.5);
    metric.cholesterol = Some(ClinicalLevel::Normal);
    metric.glucose = Some(ClinicalLevel::Normal);
    let metric = insert_health_metrics(&session, &metric).context("insert_health_metrics failed")?;
    println!("  3. health metric inserted, id {}", metric.metric_id);

    let metrics_query = HealthMetricQuery::for_patient(patient.patient_id);
    let metrics = retrieve_health_metrics(&session, &metrics_query)
        .context("retrieve_health_metrics failed")?;
    ensure!(
        metrics.len() == 1,
        "expected one health metric, got {}",
        metrics.len()
    );
    println!("  4. health metrics retrieved: {}", metrics.len());

    let update = PatientUpdate {
        weight: Some(78.0),
        ..PatientUpdate::default()
    };
    let updated = update_patient_data(&session, patient.patient_id, &update)
        .context("update_patient_data failed")?;
    ensure!(
        updated.weight == 78.0,
        "expected weight 78.0 after update, got {}",
        updated.weight
    );
    println!("  5. patient updated, weight {} kg", updated.weight);

    let correlation = insert_correlation_result(
        &session,
        &NewCorrelationResult::new("systolic_bp", "cholesterol", 0.65),
    )
    .context("insert_correlation_result failed")?;
    println!(
        "  6. correlation result inserted, id {}",
        correlation.correlation_id
    );

    let image = insert_image_metadata(
        &session,
        &NewMedicalImage::new(
            patient.patient_id,
            "test_xray.jpg",
            "/data/images/test_xray.jpg",
        )
        .with_image_type("X-ray"),
    )
    .context("insert_image_metadata failed")?;
    println!("  7. image metadata inserted, id {}", image.image_id);

    let signal = insert_biomedical_signal(
        &session,
        &NewBiomedicalSignal::new(patient.patient_id, "ECG", "/data/signals/ecg.csv")
            .with_sampling_rate(250.0),
    )
    .context("insert_biomedical_signal failed")?;
    println!("  8. biomedical signal inserted, id {}", signal.signal_id);

    let analysis = insert_spectrum_analysis(
        &session,
        &NewSpectrumAnalysis::new(signal.signal_id, "/data/spectrum/freq.csv")
            .with_dominant_frequency(60.0),
    )
    .context("insert_spectrum_analysis failed")?;
    println!("  9. spectrum analysis inserted, id {}", analysis.analysis_id);

    let deleted =
        delete_patient_data(&session, patient.patient_id).context("delete_patient_data failed")?;
    ensure!(deleted, "delete_patient_data reported no row removed");
    let remaining = retrieve_health_metrics(&session, &metrics_query)
        .context("retrieve_health_metrics after delete failed")?;
    ensure!(
        remaining.is_empty(),
        "cascade delete left {} health metric(s)",
        remaining.len()
    );
    println!("  10. patient deleted, dependent health metrics removed");

    session.close().context("failed to close the session")?;
    Ok(())
}
