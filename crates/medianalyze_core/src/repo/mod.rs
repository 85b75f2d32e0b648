//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Isolate SQLite query details from the CRUD entry points.
//! - Provide the shared error type and SQL building helpers.
//!
//! # Invariants
//! - Repository writes run request `validate()` before any SQL mutation.
//! - Foreign-key checks and the write share one immediate transaction.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to DB transport errors.
//! - Repositories refuse connections whose schema is not fully migrated.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::validation::ValidationError;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod correlation_repo;
pub mod health_metric_repo;
pub mod medical_image_repo;
pub mod patient_repo;
pub mod signal_repo;
pub mod spectrum_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Record kind named in `NotFound` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Patient,
    HealthMetric,
    MedicalImage,
    BiomedicalSignal,
    CorrelationResult,
    SpectrumAnalysis,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::HealthMetric => "health_metric",
            Self::MedicalImage => "medical_image",
            Self::BiomedicalSignal => "biomedical_signal",
            Self::CorrelationResult => "correlation_result",
            Self::SpectrumAnalysis => "spectrum_analysis",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every repository and CRUD operation.
#[derive(Debug)]
pub enum RepoError {
    /// Input rejected before any write.
    Validation(ValidationError),
    /// Store transport or bootstrap failure.
    Db(DbError),
    /// Targeted record does not exist.
    NotFound { entity: EntityKind, id: i64 },
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted row cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}; run init_database first"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// Short stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Db(_) => "db_error",
            Self::NotFound { .. } => "not_found",
            Self::UninitializedConnection { .. } => "schema_not_ready",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

pub(crate) fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn row_exists(conn: &Connection, sql: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    Ok(exists == 1)
}

/// Accumulates optional `WHERE` predicates for list queries.
pub(crate) struct ListFilter {
    sql: String,
    values: Vec<Value>,
}

impl ListFilter {
    pub(crate) fn new(select_sql: &str) -> Self {
        Self {
            sql: format!("{select_sql} WHERE 1 = 1"),
            values: Vec::new(),
        }
    }

    /// Adds `AND <predicate>`; `predicate` holds exactly one `?`.
    pub(crate) fn push(&mut self, predicate: &str, value: impl Into<Value>) {
        self.sql.push_str(" AND ");
        self.sql.push_str(predicate);
        self.values.push(value.into());
    }

    pub(crate) fn push_opt<T: Into<Value>>(&mut self, predicate: &str, value: Option<T>) {
        if let Some(value) = value {
            self.push(predicate, value);
        }
    }

    /// Appends ordering and limit, returning the final SQL and bindings.
    pub(crate) fn finish(mut self, order_by: &str, limit: Option<u32>) -> (String, Vec<Value>) {
        self.sql.push_str(" ORDER BY ");
        self.sql.push_str(order_by);
        if let Some(limit) = limit {
            self.sql.push_str(" LIMIT ?");
            self.values.push(Value::Integer(i64::from(limit)));
        }
        self.sql.push(';');
        (self.sql, self.values)
    }
}

/// Accumulates `SET` assignments for partial updates.
pub(crate) struct ColumnUpdates {
    assignments: Vec<String>,
    values: Vec<Value>,
}

impl ColumnUpdates {
    pub(crate) fn new() -> Self {
        Self {
            assignments: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn set_opt<T: Into<Value>>(&mut self, column: &str, value: Option<T>) {
        if let Some(value) = value {
            self.assignments.push(format!("{column} = ?"));
            self.values.push(value.into());
        }
    }

    /// Adds a literal assignment with no binding, e.g. a timestamp refresh.
    pub(crate) fn set_raw(&mut self, assignment: &str) {
        self.assignments.push(assignment.to_string());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub(crate) fn into_sql(
        mut self,
        table: &str,
        id_column: &str,
        id: i64,
    ) -> (String, Vec<Value>) {
        let sql = format!(
            "UPDATE {table} SET {} WHERE {id_column} = ?;",
            self.assignments.join(", ")
        );
        self.values.push(Value::Integer(id));
        (sql, self.values)
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// `LIKE` pattern matching `needle` anywhere; pair with `ESCAPE '\\'`.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

pub(crate) const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

#[cfg(test)]
mod tests {
    use super::{contains_pattern, ColumnUpdates, ListFilter};
    use rusqlite::types::Value;

    #[test]
    fn list_filter_appends_predicates_in_order() {
        let mut filter = ListFilter::new("SELECT * FROM patients");
        filter.push("gender = ?", 2_i64);
        filter.push_opt::<i64>("age = ?", None);
        filter.push_opt("name LIKE ?", Some("%Test%".to_string()));
        let (sql, values) = filter.finish("created_at DESC", Some(5));

        assert_eq!(
            sql,
            "SELECT * FROM patients WHERE 1 = 1 AND gender = ? AND name LIKE ? ORDER BY created_at DESC LIMIT ?;"
        );
        assert_eq!(
            values,
            vec![
                Value::Integer(2),
                Value::Text("%Test%".to_string()),
                Value::Integer(5),
            ]
        );
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Smith"), "%Smith%");
        assert_eq!(contains_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }

    #[test]
    fn column_updates_bind_id_last() {
        let mut updates = ColumnUpdates::new();
        assert!(updates.is_empty());
        updates.set_opt("weight", Some(78.0_f64));
        updates.set_raw("updated_at = 1");
        let (sql, values) = updates.into_sql("patients", "patient_id", 9);

        assert_eq!(
            sql,
            "UPDATE patients SET weight = ?, updated_at = 1 WHERE patient_id = ?;"
        );
        assert_eq!(values, vec![Value::Real(78.0), Value::Integer(9)]);
    }
}
