//! Unit-of-work handle bound to one store.
//!
//! # Responsibility
//! - Own one SQLite connection for the lifetime of a unit of work.
//! - Release the connection on `close` or drop.
//!
//! # Invariants
//! - A session is `Send` but not `Sync`: it can move between threads but is
//!   never used by two callers at once.
//! - Every CRUD call commits before returning, so a session never carries an
//!   open transaction between calls.

use crate::db::DbResult;
use log::{debug, warn};
use rusqlite::Connection;

/// One unit of work against a `DatabaseConnection`.
pub struct Session {
    conn: Connection,
    session_id: u64,
}

impl Session {
    pub(crate) fn new(conn: Connection, session_id: u64) -> Self {
        debug!("event=session_open module=db status=ok session_id={session_id}");
        Self { conn, session_id }
    }

    /// Underlying connection, used by repositories.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Identifier unique within the owning `DatabaseConnection`.
    pub fn id(&self) -> u64 {
        self.session_id
    }

    /// Closes the session and reports close failures.
    ///
    /// Dropping a session also closes it, but swallows the error.
    pub fn close(self) -> DbResult<()> {
        let session_id = self.session_id;
        match self.conn.close() {
            Ok(()) => {
                debug!("event=session_close module=db status=ok session_id={session_id}");
                Ok(())
            }
            Err((_conn, err)) => {
                warn!(
                    "event=session_close module=db status=error session_id={} error={}",
                    session_id, err
                );
                Err(err.into())
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
