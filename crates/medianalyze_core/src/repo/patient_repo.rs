//! Patient repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `patients` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `validate()` before SQL mutations.
//! - Deleting a patient cascades to metrics, images, signals and,
//!   through signals, spectrum analyses.
//! - `updated_at` is refreshed by every successful update.

use crate::model::patient::{Gender, NewPatient, Patient, PatientId, PatientUpdate};
use crate::repo::{
    contains_pattern, ensure_schema_ready, ColumnUpdates, EntityKind, ListFilter, RepoError,
    RepoResult, NOW_MS_SQL,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};

const PATIENT_SELECT_SQL: &str = "SELECT
    patient_id,
    name,
    age,
    gender,
    height,
    weight,
    created_at,
    updated_at
FROM patients";

/// Filter options for listing patients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientQuery {
    pub patient_id: Option<PatientId>,
    /// Substring match on `name`, ignoring ASCII case.
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub limit: Option<u32>,
}

impl PatientQuery {
    /// Matches exactly one patient id.
    pub fn by_id(patient_id: PatientId) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }
}

/// Repository interface for patient CRUD operations.
pub trait PatientRepository {
    fn insert_patient(&self, patient: &NewPatient) -> RepoResult<Patient>;
    fn get_patient(&self, id: PatientId) -> RepoResult<Option<Patient>>;
    fn list_patients(&self, query: &PatientQuery) -> RepoResult<Vec<Patient>>;
    fn update_patient(&self, id: PatientId, update: &PatientUpdate) -> RepoResult<Patient>;
    /// Returns `false` when no patient had this id.
    fn delete_patient(&self, id: PatientId) -> RepoResult<bool>;
}

/// SQLite-backed patient repository.
pub struct SqlitePatientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePatientRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PatientRepository for SqlitePatientRepository<'_> {
    fn insert_patient(&self, patient: &NewPatient) -> RepoResult<Patient> {
        patient.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO patients (
                name,
                age,
                gender,
                height,
                weight
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                patient.name.as_deref(),
                patient.age,
                patient.gender.code(),
                patient.height,
                patient.weight,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let created = load_patient(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("patient {id} missing right after insert"))
        })?;
        tx.commit()?;

        Ok(created)
    }

    fn get_patient(&self, id: PatientId) -> RepoResult<Option<Patient>> {
        load_patient(self.conn, id)
    }

    fn list_patients(&self, query: &PatientQuery) -> RepoResult<Vec<Patient>> {
        let mut filter = ListFilter::new(PATIENT_SELECT_SQL);
        filter.push_opt("patient_id = ?", query.patient_id);
        filter.push_opt(
            "name LIKE ? ESCAPE '\\'",
            query
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .map(contains_pattern),
        );
        filter.push_opt("gender = ?", query.gender.map(Gender::code));
        let (sql, values) = filter.finish("created_at DESC, patient_id DESC", query.limit);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut patients = Vec::new();
        while let Some(row) = rows.next()? {
            patients.push(parse_patient_row(row)?);
        }

        Ok(patients)
    }

    fn update_patient(&self, id: PatientId, update: &PatientUpdate) -> RepoResult<Patient> {
        update.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !update.is_empty() {
            let mut columns = ColumnUpdates::new();
            columns.set_opt("name", update.name.clone());
            columns.set_opt("age", update.age);
            columns.set_opt("gender", update.gender.map(Gender::code));
            columns.set_opt("height", update.height);
            columns.set_opt("weight", update.weight);
            columns.set_raw(&format!("updated_at = {NOW_MS_SQL}"));
            let (sql, values) = columns.into_sql("patients", "patient_id", id);

            let changed = tx.execute(&sql, params_from_iter(values))?;
            if changed == 0 {
                return Err(not_found(id));
            }
        }

        let updated = load_patient(&tx, id)?.ok_or_else(|| not_found(id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_patient(&self, id: PatientId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM patients WHERE patient_id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

pub(crate) fn patient_exists(conn: &Connection, id: PatientId) -> RepoResult<bool> {
    crate::repo::row_exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM patients WHERE patient_id = ?1);",
        id,
    )
}

fn load_patient(conn: &Connection, id: PatientId) -> RepoResult<Option<Patient>> {
    let mut stmt = conn.prepare(&format!("{PATIENT_SELECT_SQL} WHERE patient_id = ?1;"))?;
    let row = stmt
        .query_row([id], |row| Ok(parse_patient_row(row)))
        .optional()?;
    row.transpose()
}

fn parse_patient_row(row: &Row<'_>) -> RepoResult<Patient> {
    let gender_code: i64 = row.get("gender")?;
    let gender = Gender::from_code(gender_code).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid gender code `{gender_code}` in patients.gender"
        ))
    })?;

    Ok(Patient {
        patient_id: row.get("patient_id")?,
        name: row.get("name")?,
        age: row.get("age")?,
        gender,
        height: row.get("height")?,
        weight: row.get("weight")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn not_found(id: PatientId) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::Patient,
        id,
    }
}
