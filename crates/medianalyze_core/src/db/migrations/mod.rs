//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Migration SQL only uses `IF NOT EXISTS` DDL, so unrelated tables that
//!   already live in the file are left alone and replaying a migration is
//!   harmless.
//! - `user_version` alone does not prove the schema is ours: when any
//!   application table is missing, the registry is replayed from version 0.

use crate::db::{DbError, DbResult, EXPECTED_TABLES};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// Returns the number of migrations applied (0 when already current).
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    let missing = missing_tables(conn)?;
    let replay_from = if missing.is_empty() { current_version } else { 0 };
    if replay_from == latest {
        debug!("event=db_migrate module=db status=skip version={current_version}");
        return Ok(0);
    }
    if replay_from != current_version {
        info!(
            "event=db_migrate module=db status=repair version={} missing_tables={}",
            current_version,
            missing.join(",")
        );
    }

    let tx = conn.transaction()?;
    let mut applied = 0;
    for migration in MIGRATIONS {
        if migration.version <= replay_from {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        applied += 1;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} applied={}",
        replay_from, latest, applied
    );
    Ok(applied)
}

/// Reads `PRAGMA user_version` from the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Application tables absent from the connection's schema.
pub(crate) fn missing_tables(conn: &Connection) -> DbResult<Vec<&'static str>> {
    let mut stmt = conn.prepare(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
    )?;
    let mut missing = Vec::new();
    for table in EXPECTED_TABLES {
        let exists: i64 = stmt.query_row([table], |row| row.get(0))?;
        if exists == 0 {
            missing.push(table);
        }
    }
    Ok(missing)
}
