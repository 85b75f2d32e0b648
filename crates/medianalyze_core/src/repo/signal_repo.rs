//! Biomedical signal metadata repository.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `biomedical_signals` table.
//!
//! # Invariants
//! - Signal rows reference an existing patient at insert time.
//! - Deleting a signal cascades to its `spectrum_analysis` rows.

use crate::model::biomedical_signal::{
    BiomedicalSignal, BiomedicalSignalUpdate, NewBiomedicalSignal, SignalId,
};
use crate::model::patient::PatientId;
use crate::model::validation::ValidationError;
use crate::repo::patient_repo::patient_exists;
use crate::repo::{
    ensure_schema_ready, row_exists, ColumnUpdates, EntityKind, ListFilter, RepoError, RepoResult,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};

const SIGNAL_SELECT_SQL: &str = "SELECT
    signal_id,
    patient_id,
    signal_type,
    signal_data_path,
    sampling_rate,
    duration,
    number_of_channels,
    notes,
    recorded_at
FROM biomedical_signals";

/// Filter options for listing signals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiomedicalSignalQuery {
    pub signal_id: Option<SignalId>,
    pub patient_id: Option<PatientId>,
    pub signal_type: Option<String>,
    pub limit: Option<u32>,
}

/// Repository interface for signal metadata CRUD operations.
pub trait BiomedicalSignalRepository {
    fn insert_signal(&self, signal: &NewBiomedicalSignal) -> RepoResult<BiomedicalSignal>;
    fn get_signal(&self, id: SignalId) -> RepoResult<Option<BiomedicalSignal>>;
    fn list_signals(&self, query: &BiomedicalSignalQuery) -> RepoResult<Vec<BiomedicalSignal>>;
    fn update_signal(
        &self,
        id: SignalId,
        update: &BiomedicalSignalUpdate,
    ) -> RepoResult<BiomedicalSignal>;
    fn delete_signal(&self, id: SignalId) -> RepoResult<bool>;
}

/// SQLite-backed signal metadata repository.
pub struct SqliteBiomedicalSignalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBiomedicalSignalRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BiomedicalSignalRepository for SqliteBiomedicalSignalRepository<'_> {
    fn insert_signal(&self, signal: &NewBiomedicalSignal) -> RepoResult<BiomedicalSignal> {
        signal.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !patient_exists(&tx, signal.patient_id)? {
            return Err(ValidationError::MissingPatient(signal.patient_id).into());
        }

        tx.execute(
            "INSERT INTO biomedical_signals (
                patient_id,
                signal_type,
                signal_data_path,
                sampling_rate,
                duration,
                number_of_channels,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                signal.patient_id,
                signal.signal_type.as_str(),
                signal.signal_data_path.as_str(),
                signal.sampling_rate,
                signal.duration,
                signal.number_of_channels,
                signal.notes.as_deref(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        let created = load_signal(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("biomedical signal {id} missing right after insert"))
        })?;
        tx.commit()?;

        Ok(created)
    }

    fn get_signal(&self, id: SignalId) -> RepoResult<Option<BiomedicalSignal>> {
        load_signal(self.conn, id)
    }

    fn list_signals(&self, query: &BiomedicalSignalQuery) -> RepoResult<Vec<BiomedicalSignal>> {
        let mut filter = ListFilter::new(SIGNAL_SELECT_SQL);
        filter.push_opt("signal_id = ?", query.signal_id);
        filter.push_opt("patient_id = ?", query.patient_id);
        filter.push_opt("signal_type = ?", query.signal_type.clone());
        let (sql, values) = filter.finish("recorded_at DESC, signal_id DESC", query.limit);

        let mut stmt = self.conn.prepare(&sql)?;
        let signals = stmt
            .query_map(params_from_iter(values), parse_signal_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(signals)
    }

    fn update_signal(
        &self,
        id: SignalId,
        update: &BiomedicalSignalUpdate,
    ) -> RepoResult<BiomedicalSignal> {
        update.validate()?;

        let mut columns = ColumnUpdates::new();
        columns.set_opt("signal_type", update.signal_type.clone());
        columns.set_opt("signal_data_path", update.signal_data_path.clone());
        columns.set_opt("sampling_rate", update.sampling_rate);
        columns.set_opt("duration", update.duration);
        columns.set_opt("number_of_channels", update.number_of_channels);
        columns.set_opt("notes", update.notes.clone());

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !columns.is_empty() {
            let (sql, values) = columns.into_sql("biomedical_signals", "signal_id", id);
            if tx.execute(&sql, params_from_iter(values))? == 0 {
                return Err(not_found(id));
            }
        }

        let updated = load_signal(&tx, id)?.ok_or_else(|| not_found(id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_signal(&self, id: SignalId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM biomedical_signals WHERE signal_id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

pub(crate) fn signal_exists(conn: &Connection, id: SignalId) -> RepoResult<bool> {
    row_exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM biomedical_signals WHERE signal_id = ?1);",
        id,
    )
}

fn load_signal(conn: &Connection, id: SignalId) -> RepoResult<Option<BiomedicalSignal>> {
    let mut stmt = conn.prepare(&format!("{SIGNAL_SELECT_SQL} WHERE signal_id = ?1;"))?;
    let signal = stmt.query_row([id], parse_signal_row).optional()?;
    Ok(signal)
}

fn parse_signal_row(row: &Row<'_>) -> rusqlite::Result<BiomedicalSignal> {
    Ok(BiomedicalSignal {
        signal_id: row.get("signal_id")?,
        patient_id: row.get("patient_id")?,
        signal_type: row.get("signal_type")?,
        signal_data_path: row.get("signal_data_path")?,
        sampling_rate: row.get("sampling_rate")?,
        duration: row.get("duration")?,
        number_of_channels: row.get("number_of_channels")?,
        notes: row.get("notes")?,
        recorded_at: row.get("recorded_at")?,
    })
}

fn not_found(id: SignalId) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::BiomedicalSignal,
        id,
    }
}
