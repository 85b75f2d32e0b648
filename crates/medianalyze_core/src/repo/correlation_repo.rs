//! Correlation result repository.
//!
//! Correlation rows are standalone: no foreign keys, untouched by patient
//! deletion.

use crate::model::correlation_result::{
    CorrelationId, CorrelationResult, CorrelationResultUpdate, NewCorrelationResult,
};
use crate::repo::{
    ensure_schema_ready, ColumnUpdates, EntityKind, ListFilter, RepoError, RepoResult,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};

const CORRELATION_SELECT_SQL: &str = "SELECT
    correlation_id,
    metric1,
    metric2,
    correlation_value,
    correlation_type,
    sample_size,
    p_value,
    notes,
    created_at
FROM correlation_results";

/// Filter options for listing correlation results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationResultQuery {
    pub correlation_id: Option<CorrelationId>,
    pub metric1: Option<String>,
    pub metric2: Option<String>,
    pub limit: Option<u32>,
}

/// Repository interface for correlation result CRUD operations.
pub trait CorrelationResultRepository {
    fn insert_correlation(&self, result: &NewCorrelationResult) -> RepoResult<CorrelationResult>;
    fn get_correlation(&self, id: CorrelationId) -> RepoResult<Option<CorrelationResult>>;
    fn list_correlations(
        &self,
        query: &CorrelationResultQuery,
    ) -> RepoResult<Vec<CorrelationResult>>;
    fn update_correlation(
        &self,
        id: CorrelationId,
        update: &CorrelationResultUpdate,
    ) -> RepoResult<CorrelationResult>;
    fn delete_correlation(&self, id: CorrelationId) -> RepoResult<bool>;
}

/// SQLite-backed correlation result repository.
pub struct SqliteCorrelationResultRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCorrelationResultRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CorrelationResultRepository for SqliteCorrelationResultRepository<'_> {
    fn insert_correlation(&self, result: &NewCorrelationResult) -> RepoResult<CorrelationResult> {
        result.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO correlation_results (
                metric1,
                metric2,
                correlation_value,
                correlation_type,
                sample_size,
                p_value,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                result.metric1.as_str(),
                result.metric2.as_str(),
                result.correlation_value,
                result.correlation_type.as_str(),
                result.sample_size,
                result.p_value,
                result.notes.as_deref(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        let created = load_correlation(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("correlation result {id} missing right after insert"))
        })?;
        tx.commit()?;

        Ok(created)
    }

    fn get_correlation(&self, id: CorrelationId) -> RepoResult<Option<CorrelationResult>> {
        load_correlation(self.conn, id)
    }

    fn list_correlations(
        &self,
        query: &CorrelationResultQuery,
    ) -> RepoResult<Vec<CorrelationResult>> {
        let mut filter = ListFilter::new(CORRELATION_SELECT_SQL);
        filter.push_opt("correlation_id = ?", query.correlation_id);
        filter.push_opt("metric1 = ?", query.metric1.clone());
        filter.push_opt("metric2 = ?", query.metric2.clone());
        let (sql, values) = filter.finish("created_at DESC, correlation_id DESC", query.limit);

        let mut stmt = self.conn.prepare(&sql)?;
        let results = stmt
            .query_map(params_from_iter(values), parse_correlation_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }

    fn update_correlation(
        &self,
        id: CorrelationId,
        update: &CorrelationResultUpdate,
    ) -> RepoResult<CorrelationResult> {
        update.validate()?;

        let mut columns = ColumnUpdates::new();
        columns.set_opt("metric1", update.metric1.clone());
        columns.set_opt("metric2", update.metric2.clone());
        columns.set_opt("correlation_value", update.correlation_value);
        columns.set_opt("correlation_type", update.correlation_type.clone());
        columns.set_opt("sample_size", update.sample_size);
        columns.set_opt("p_value", update.p_value);
        columns.set_opt("notes", update.notes.clone());

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !columns.is_empty() {
            let (sql, values) = columns.into_sql("correlation_results", "correlation_id", id);
            if tx.execute(&sql, params_from_iter(values))? == 0 {
                return Err(not_found(id));
            }
        }

        let updated = load_correlation(&tx, id)?.ok_or_else(|| not_found(id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_correlation(&self, id: CorrelationId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM correlation_results WHERE correlation_id = ?1;",
            [id],
        )?;
        Ok(changed > 0)
    }
}

fn load_correlation(conn: &Connection, id: CorrelationId) -> RepoResult<Option<CorrelationResult>> {
    let mut stmt = conn.prepare(&format!("{CORRELATION_SELECT_SQL} WHERE correlation_id = ?1;"))?;
    let result = stmt.query_row([id], parse_correlation_row).optional()?;
    Ok(result)
}

fn parse_correlation_row(row: &Row<'_>) -> rusqlite::Result<CorrelationResult> {
    Ok(CorrelationResult {
        correlation_id: row.get("correlation_id")?,
        metric1: row.get("metric1")?,
        metric2: row.get("metric2")?,
        correlation_value: row.get("correlation_value")?,
        correlation_type: row.get("correlation_type")?,
        sample_size: row.get("sample_size")?,
        p_value: row.get("p_value")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}

fn not_found(id: CorrelationId) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::CorrelationResult,
        id,
    }
}
