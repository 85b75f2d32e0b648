//! Store handle, session factory and schema initialization.
//!
//! # Responsibility
//! - Turn a `DatabaseConfig` into an explicitly passed `DatabaseConnection`.
//! - Open independent `Session`s with the pragmas core behavior requires.
//! - Create (or reset) the schema and list the tables present.
//!
//! # Invariants
//! - Session connections have `foreign_keys=ON` and the configured busy
//!   timeout.
//! - In-memory stores live exactly as long as their `DatabaseConnection`;
//!   all sessions of one handle see the same data, other handles never do.
//! - Opening a session takes no lock at this layer.

use super::migrations::apply_migrations;
use super::session::Session;
use super::{DbError, DbResult, EXPECTED_TABLES};
use crate::config::{DatabaseConfig, DatabaseLocation};
use log::{error, info, warn};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone)]
enum StoreTarget {
    File(PathBuf),
    /// Shared-cache URI naming one private in-memory database.
    SharedMemory(String),
}

/// Handle to one configured store.
///
/// Constructed explicitly and passed to callers; there is no process-wide
/// instance.
pub struct DatabaseConnection {
    target: StoreTarget,
    busy_timeout: Duration,
    next_session_id: AtomicU64,
    // Keeps a shared-cache in-memory database alive between sessions.
    anchor: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("target", &self.target)
            .field("busy_timeout", &self.busy_timeout)
            .finish_non_exhaustive()
    }
}

/// Builds a store handle for `config`.
///
/// File stores get their parent directory created; the file itself is
/// created lazily by the first session or by `init_database`.
///
/// # Errors
/// - `DbError::StorageInit` when the parent directory cannot be created or
///   the in-memory store cannot be opened.
pub fn get_db_connection(config: &DatabaseConfig) -> DbResult<DatabaseConnection> {
    let started_at = Instant::now();
    let result = match &config.location {
        DatabaseLocation::File(path) => connect_file(path, config.busy_timeout),
        DatabaseLocation::Memory => connect_memory(config.busy_timeout),
    };

    match &result {
        Ok(db) => info!(
            "event=db_connect module=db status=ok mode={} duration_ms={}",
            db.mode(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_connect module=db status=error duration_ms={} error_code=db_connect_failed error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

/// Opens a new session on `db`. Shorthand for [`DatabaseConnection::session`].
pub fn get_session(db: &DatabaseConnection) -> DbResult<Session> {
    db.session()
}

/// Creates every missing table and returns the table names present.
///
/// Idempotent: existing rows and unrelated tables are preserved.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was written by a
///   newer binary.
/// - `DbError::StorageInit` for any other failure (unreachable file,
///   read-only location, DDL failure).
pub fn init_database(db: &DatabaseConnection) -> DbResult<Vec<String>> {
    let started_at = Instant::now();
    info!("event=db_init module=db status=start mode={}", db.mode());

    let result = db
        .open_connection()
        .map_err(DbError::from)
        .and_then(|mut conn| {
            apply_migrations(&mut conn)?;
            list_tables(&conn)
        })
        .map_err(|err| db.as_storage_init_error(err));

    match result {
        Ok(tables) => {
            let missing = missing_expected_tables(&tables);
            if !missing.is_empty() {
                let err = DbError::StorageInit {
                    location: db.location(),
                    reason: format!("tables missing after init: {}", missing.join(",")),
                };
                error!(
                    "event=db_init module=db status=error mode={} duration_ms={} error_code=db_schema_incomplete error={}",
                    db.mode(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
            info!(
                "event=db_init module=db status=ok mode={} duration_ms={} table_count={}",
                db.mode(),
                started_at.elapsed().as_millis(),
                tables.len()
            );
            Ok(tables)
        }
        Err(err) => {
            error!(
                "event=db_init module=db status=error mode={} duration_ms={} error_code=db_init_failed error={}",
                db.mode(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Drops the six application tables and recreates them empty.
///
/// Destroys all application data. Unrelated tables are kept.
pub fn reset_database(db: &DatabaseConnection) -> DbResult<Vec<String>> {
    warn!("event=db_reset module=db status=start mode={}", db.mode());

    let dropped = db.open_connection().map_err(DbError::from).and_then(|mut conn| {
        let tx = conn.transaction()?;
        // Children before parents so implicit cascades never see orphans.
        for table in EXPECTED_TABLES.iter().rev() {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        }
        tx.execute_batch("PRAGMA user_version = 0;")?;
        tx.commit()?;
        Ok(())
    });

    if let Err(err) = dropped {
        let err = db.as_storage_init_error(err);
        error!(
            "event=db_reset module=db status=error mode={} error_code=db_reset_failed error={}",
            db.mode(),
            err
        );
        return Err(err);
    }

    init_database(db)
}

impl DatabaseConnection {
    /// Opens a new, independent session.
    pub fn session(&self) -> DbResult<Session> {
        let conn = self.open_connection().map_err(|err| {
            error!(
                "event=session_open module=db status=error mode={} error_code=session_open_failed error={}",
                self.mode(),
                err
            );
            DbError::from(err)
        })?;
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        Ok(Session::new(conn, session_id))
    }

    /// Runs `work` inside a fresh session and always releases it.
    ///
    /// The error from `work` wins over a close error.
    pub fn with_session<T, E>(&self, work: impl FnOnce(&Session) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let session = self.session()?;
        match work(&session) {
            Ok(value) => {
                session.close()?;
                Ok(value)
            }
            Err(err) => {
                // Drop closes the connection; the work error is what matters.
                drop(session);
                Err(err)
            }
        }
    }

    /// Sorted names of the user tables currently present in the store.
    pub fn table_names(&self) -> DbResult<Vec<String>> {
        let conn = self.open_connection()?;
        list_tables(&conn)
    }

    /// Store location for diagnostics: a file path or `memory`.
    pub fn location(&self) -> String {
        match &self.target {
            StoreTarget::File(path) => path.display().to_string(),
            StoreTarget::SharedMemory(_) => "memory".to_string(),
        }
    }

    /// Releases the handle. In-memory stores are discarded.
    pub fn close(self) -> DbResult<()> {
        let anchor = match self.anchor.into_inner() {
            Ok(anchor) => anchor,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(conn) = anchor {
            conn.close().map_err(|(_conn, err)| DbError::from(err))?;
        }
        info!("event=db_close module=db status=ok");
        Ok(())
    }

    fn mode(&self) -> &'static str {
        match self.target {
            StoreTarget::File(_) => "file",
            StoreTarget::SharedMemory(_) => "memory",
        }
    }

    fn open_connection(&self) -> rusqlite::Result<Connection> {
        let conn = match &self.target {
            StoreTarget::File(path) => Connection::open(path)?,
            StoreTarget::SharedMemory(uri) => Connection::open_with_flags(uri, memory_flags())?,
        };
        configure_connection(&conn, self.busy_timeout)?;
        Ok(conn)
    }

    fn as_storage_init_error(&self, err: DbError) -> DbError {
        match err {
            DbError::Sqlite(inner) => DbError::StorageInit {
                location: self.location(),
                reason: inner.to_string(),
            },
            other => other,
        }
    }
}

fn connect_file(path: &Path, busy_timeout: Duration) -> DbResult<DatabaseConnection> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| DbError::StorageInit {
            location: path.display().to_string(),
            reason: format!("cannot create directory `{}`: {err}", parent.display()),
        })?;
    }

    Ok(DatabaseConnection {
        target: StoreTarget::File(path.to_path_buf()),
        busy_timeout,
        next_session_id: AtomicU64::new(1),
        anchor: Mutex::new(None),
    })
}

fn connect_memory(busy_timeout: Duration) -> DbResult<DatabaseConnection> {
    let uri = format!(
        "file:medianalyze-{}?mode=memory&cache=shared",
        Uuid::new_v4().simple()
    );
    let anchor = Connection::open_with_flags(&uri, memory_flags())
        .and_then(|conn| {
            configure_connection(&conn, busy_timeout)?;
            Ok(conn)
        })
        .map_err(|err| DbError::StorageInit {
            location: "memory".to_string(),
            reason: err.to_string(),
        })?;

    Ok(DatabaseConnection {
        target: StoreTarget::SharedMemory(uri),
        busy_timeout,
        next_session_id: AtomicU64::new(1),
        anchor: Mutex::new(Some(anchor)),
    })
}

fn memory_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

fn list_tables(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name
         FROM sqlite_master
         WHERE type = 'table'
           AND name NOT LIKE 'sqlite_%'
         ORDER BY name ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = Vec::new();
    while let Some(row) = rows.next()? {
        tables.push(row.get(0)?);
    }
    Ok(tables)
}

fn missing_expected_tables(tables: &[String]) -> Vec<&'static str> {
    EXPECTED_TABLES
        .iter()
        .copied()
        .filter(|expected| !tables.iter().any(|table| table == expected))
        .collect()
}
