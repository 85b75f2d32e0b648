//! Spectrum analysis repository.
//!
//! # Invariants
//! - Analyses reference an existing biomedical signal at insert time.
//! - Rows disappear with their signal (and therefore with its patient).

use crate::model::biomedical_signal::SignalId;
use crate::model::spectrum_analysis::{
    AnalysisId, NewSpectrumAnalysis, SpectrumAnalysis, SpectrumAnalysisUpdate,
};
use crate::model::validation::ValidationError;
use crate::repo::signal_repo::signal_exists;
use crate::repo::{
    ensure_schema_ready, ColumnUpdates, EntityKind, ListFilter, RepoError, RepoResult,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};

const ANALYSIS_SELECT_SQL: &str = "SELECT
    analysis_id,
    signal_id,
    frequency_data_path,
    fft_size,
    frequency_resolution,
    dominant_frequency,
    power_spectrum_path,
    notes,
    created_at
FROM spectrum_analysis";

/// Filter options for listing spectrum analyses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpectrumAnalysisQuery {
    pub analysis_id: Option<AnalysisId>,
    pub signal_id: Option<SignalId>,
    pub limit: Option<u32>,
}

/// Repository interface for spectrum analysis CRUD operations.
pub trait SpectrumAnalysisRepository {
    fn insert_analysis(&self, analysis: &NewSpectrumAnalysis) -> RepoResult<SpectrumAnalysis>;
    fn get_analysis(&self, id: AnalysisId) -> RepoResult<Option<SpectrumAnalysis>>;
    fn list_analyses(&self, query: &SpectrumAnalysisQuery) -> RepoResult<Vec<SpectrumAnalysis>>;
    fn update_analysis(
        &self,
        id: AnalysisId,
        update: &SpectrumAnalysisUpdate,
    ) -> RepoResult<SpectrumAnalysis>;
    fn delete_analysis(&self, id: AnalysisId) -> RepoResult<bool>;
}

/// SQLite-backed spectrum analysis repository.
pub struct SqliteSpectrumAnalysisRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSpectrumAnalysisRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SpectrumAnalysisRepository for SqliteSpectrumAnalysisRepository<'_> {
    fn insert_analysis(&self, analysis: &NewSpectrumAnalysis) -> RepoResult<SpectrumAnalysis> {
        analysis.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !signal_exists(&tx, analysis.signal_id)? {
            return Err(ValidationError::MissingSignal(analysis.signal_id).into());
        }

        tx.execute(
            "INSERT INTO spectrum_analysis (
                signal_id,
                frequency_data_path,
                fft_size,
                frequency_resolution,
                dominant_frequency,
                power_spectrum_path,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                analysis.signal_id,
                analysis.frequency_data_path.as_str(),
                analysis.fft_size,
                analysis.frequency_resolution,
                analysis.dominant_frequency,
                analysis.power_spectrum_path.as_deref(),
                analysis.notes.as_deref(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        let created = load_analysis(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("spectrum analysis {id} missing right after insert"))
        })?;
        tx.commit()?;

        Ok(created)
    }

    fn get_analysis(&self, id: AnalysisId) -> RepoResult<Option<SpectrumAnalysis>> {
        load_analysis(self.conn, id)
    }

    fn list_analyses(&self, query: &SpectrumAnalysisQuery) -> RepoResult<Vec<SpectrumAnalysis>> {
        let mut filter = ListFilter::new(ANALYSIS_SELECT_SQL);
        filter.push_opt("analysis_id = ?", query.analysis_id);
        filter.push_opt("signal_id = ?", query.signal_id);
        let (sql, values) = filter.finish("created_at DESC, analysis_id DESC", query.limit);

        let mut stmt = self.conn.prepare(&sql)?;
        let analyses = stmt
            .query_map(params_from_iter(values), parse_analysis_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(analyses)
    }

    fn update_analysis(
        &self,
        id: AnalysisId,
        update: &SpectrumAnalysisUpdate,
    ) -> RepoResult<SpectrumAnalysis> {
        update.validate()?;

        let mut columns = ColumnUpdates::new();
        columns.set_opt("frequency_data_path", update.frequency_data_path.clone());
        columns.set_opt("fft_size", update.fft_size);
        columns.set_opt("frequency_resolution", update.frequency_resolution);
        columns.set_opt("dominant_frequency", update.dominant_frequency);
        columns.set_opt("power_spectrum_path", update.power_spectrum_path.clone());
        columns.set_opt("notes", update.notes.clone());

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !columns.is_empty() {
            let (sql, values) = columns.into_sql("spectrum_analysis", "analysis_id", id);
            if tx.execute(&sql, params_from_iter(values))? == 0 {
                return Err(not_found(id));
            }
        }

        let updated = load_analysis(&tx, id)?.ok_or_else(|| not_found(id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_analysis(&self, id: AnalysisId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM spectrum_analysis WHERE analysis_id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn load_analysis(conn: &Connection, id: AnalysisId) -> RepoResult<Option<SpectrumAnalysis>> {
    let mut stmt = conn.prepare(&format!("{ANALYSIS_SELECT_SQL} WHERE analysis_id = ?1;"))?;
    let analysis = stmt.query_row([id], parse_analysis_row).optional()?;
    Ok(analysis)
}

fn parse_analysis_row(row: &Row<'_>) -> rusqlite::Result<SpectrumAnalysis> {
    Ok(SpectrumAnalysis {
        analysis_id: row.get("analysis_id")?,
        signal_id: row.get("signal_id")?,
        frequency_data_path: row.get("frequency_data_path")?,
        fft_size: row.get("fft_size")?,
        frequency_resolution: row.get("frequency_resolution")?,
        dominant_frequency: row.get("dominant_frequency")?,
        power_spectrum_path: row.get("power_spectrum_path")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}

fn not_found(id: AnalysisId) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::SpectrumAnalysis,
        id,
    }
}
