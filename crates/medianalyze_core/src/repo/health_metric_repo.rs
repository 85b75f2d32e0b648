//! Health metric repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `health_metrics` table.
//! - Enforce the owning-patient reference on insert.
//!
//! # Invariants
//! - A metric is only written when its patient exists (checked inside the
//!   same transaction as the insert).
//! - Listing is newest first: `recorded_at DESC, metric_id DESC`.

use crate::model::health_metric::{
    ClinicalLevel, HealthMetric, HealthMetricUpdate, MetricId, NewHealthMetric,
};
use crate::model::patient::PatientId;
use crate::model::validation::ValidationError;
use crate::repo::patient_repo::patient_exists;
use crate::repo::{
    bool_to_int, ensure_schema_ready, parse_bool, ColumnUpdates, EntityKind, ListFilter,
    RepoError, RepoResult, NOW_MS_SQL,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};

const METRIC_SELECT_SQL: &str = "SELECT
    metric_id,
    patient_id,
    recorded_at,
    systolic_bp,
    diastolic_bp,
    heart_rate,
    body_temperature,
    oxygen_saturation,
    cholesterol,
    glucose,
    smoking,
    alcohol_intake,
    physical_activity,
    cardiovascular_disease,
    created_at
FROM health_metrics";

/// Filter options for listing health metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthMetricQuery {
    pub patient_id: Option<PatientId>,
    /// Inclusive lower bound on `recorded_at` (epoch ms).
    pub recorded_from: Option<i64>,
    /// Inclusive upper bound on `recorded_at` (epoch ms).
    pub recorded_to: Option<i64>,
    pub limit: Option<u32>,
}

impl HealthMetricQuery {
    /// Matches every metric owned by one patient.
    pub fn for_patient(patient_id: PatientId) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }
}

/// Repository interface for health metric CRUD operations.
pub trait HealthMetricRepository {
    fn insert_metric(&self, metric: &NewHealthMetric) -> RepoResult<HealthMetric>;
    fn get_metric(&self, id: MetricId) -> RepoResult<Option<HealthMetric>>;
    fn list_metrics(&self, query: &HealthMetricQuery) -> RepoResult<Vec<HealthMetric>>;
    fn update_metric(&self, id: MetricId, update: &HealthMetricUpdate) -> RepoResult<HealthMetric>;
    fn delete_metric(&self, id: MetricId) -> RepoResult<bool>;
}

/// SQLite-backed health metric repository.
pub struct SqliteHealthMetricRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHealthMetricRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl HealthMetricRepository for SqliteHealthMetricRepository<'_> {
    fn insert_metric(&self, metric: &NewHealthMetric) -> RepoResult<HealthMetric> {
        metric.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !patient_exists(&tx, metric.patient_id)? {
            return Err(ValidationError::MissingPatient(metric.patient_id).into());
        }

        tx.execute(
            &format!(
                "INSERT INTO health_metrics (
                    patient_id,
                    recorded_at,
                    systolic_bp,
                    diastolic_bp,
                    heart_rate,
                    body_temperature,
                    oxygen_saturation,
                    cholesterol,
                    glucose,
                    smoking,
                    alcohol_intake,
                    physical_activity,
                    cardiovascular_disease
                ) VALUES (?1, COALESCE(?2, {NOW_MS_SQL}), ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);"
            ),
            params![
                metric.patient_id,
                metric.recorded_at,
                metric.systolic_bp,
                metric.diastolic_bp,
                metric.heart_rate,
                metric.body_temperature,
                metric.oxygen_saturation,
                metric.cholesterol.map(ClinicalLevel::code),
                metric.glucose.map(ClinicalLevel::code),
                bool_to_int(metric.smoking),
                bool_to_int(metric.alcohol_intake),
                bool_to_int(metric.physical_activity),
                metric.cardiovascular_disease.map(bool_to_int),
            ],
        )?;
        let id = tx.last_insert_rowid();
        let created = load_metric(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("health metric {id} missing right after insert"))
        })?;
        tx.commit()?;

        Ok(created)
    }

    fn get_metric(&self, id: MetricId) -> RepoResult<Option<HealthMetric>> {
        load_metric(self.conn, id)
    }

    fn list_metrics(&self, query: &HealthMetricQuery) -> RepoResult<Vec<HealthMetric>> {
        if let (Some(start), Some(end)) = (query.recorded_from, query.recorded_to) {
            if end < start {
                return Err(ValidationError::InvalidWindow { start, end }.into());
            }
        }

        let mut filter = ListFilter::new(METRIC_SELECT_SQL);
        filter.push_opt("patient_id = ?", query.patient_id);
        filter.push_opt("recorded_at >= ?", query.recorded_from);
        filter.push_opt("recorded_at <= ?", query.recorded_to);
        let (sql, values) = filter.finish("recorded_at DESC, metric_id DESC", query.limit);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut metrics = Vec::new();
        while let Some(row) = rows.next()? {
            metrics.push(parse_metric_row(row)?);
        }

        Ok(metrics)
    }

    fn update_metric(
        &self,
        id: MetricId,
        update: &HealthMetricUpdate,
    ) -> RepoResult<HealthMetric> {
        update.validate()?;

        let mut columns = ColumnUpdates::new();
        columns.set_opt("recorded_at", update.recorded_at);
        columns.set_opt("systolic_bp", update.systolic_bp);
        columns.set_opt("diastolic_bp", update.diastolic_bp);
        columns.set_opt("heart_rate", update.heart_rate);
        columns.set_opt("body_temperature", update.body_temperature);
        columns.set_opt("oxygen_saturation", update.oxygen_saturation);
        columns.set_opt("cholesterol", update.cholesterol.map(ClinicalLevel::code));
        columns.set_opt("glucose", update.glucose.map(ClinicalLevel::code));
        columns.set_opt("smoking", update.smoking.map(bool_to_int));
        columns.set_opt("alcohol_intake", update.alcohol_intake.map(bool_to_int));
        columns.set_opt(
            "physical_activity",
            update.physical_activity.map(bool_to_int),
        );
        columns.set_opt(
            "cardiovascular_disease",
            update.cardiovascular_disease.map(bool_to_int),
        );

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !columns.is_empty() {
            let (sql, values) = columns.into_sql("health_metrics", "metric_id", id);
            if tx.execute(&sql, params_from_iter(values))? == 0 {
                return Err(not_found(id));
            }
        }

        let updated = load_metric(&tx, id)?.ok_or_else(|| not_found(id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_metric(&self, id: MetricId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM health_metrics WHERE metric_id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn load_metric(conn: &Connection, id: MetricId) -> RepoResult<Option<HealthMetric>> {
    let mut stmt = conn.prepare(&format!("{METRIC_SELECT_SQL} WHERE metric_id = ?1;"))?;
    let row = stmt
        .query_row([id], |row| Ok(parse_metric_row(row)))
        .optional()?;
    row.transpose()
}

fn parse_metric_row(row: &Row<'_>) -> RepoResult<HealthMetric> {
    let cholesterol = parse_level(row.get("cholesterol")?, "health_metrics.cholesterol")?;
    let glucose = parse_level(row.get("glucose")?, "health_metrics.glucose")?;
    let cardiovascular_disease = row
        .get::<_, Option<i64>>("cardiovascular_disease")?
        .map(|value| parse_bool(value, "health_metrics.cardiovascular_disease"))
        .transpose()?;

    Ok(HealthMetric {
        metric_id: row.get("metric_id")?,
        patient_id: row.get("patient_id")?,
        recorded_at: row.get("recorded_at")?,
        systolic_bp: row.get("systolic_bp")?,
        diastolic_bp: row.get("diastolic_bp")?,
        heart_rate: row.get("heart_rate")?,
        body_temperature: row.get("body_temperature")?,
        oxygen_saturation: row.get("oxygen_saturation")?,
        cholesterol,
        glucose,
        smoking: parse_bool(row.get("smoking")?, "health_metrics.smoking")?,
        alcohol_intake: parse_bool(row.get("alcohol_intake")?, "health_metrics.alcohol_intake")?,
        physical_activity: parse_bool(
            row.get("physical_activity")?,
            "health_metrics.physical_activity",
        )?,
        cardiovascular_disease,
        created_at: row.get("created_at")?,
    })
}

fn parse_level(value: Option<i64>, column: &'static str) -> RepoResult<Option<ClinicalLevel>> {
    match value {
        Some(code) => ClinicalLevel::from_code(code).map(Some).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid clinical level `{code}` in {column}"))
        }),
        None => Ok(None),
    }
}

fn not_found(id: MetricId) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::HealthMetric,
        id,
    }
}
