//! Connection setup for the proposal database.
//!
//! # Invariants
//! - Returned connections enforce foreign keys, so owner links cascade with
//!   their proposal.
//! - Returned connections are at `latest_version()`.
//! - File databases run in WAL mode; in-memory ones keep SQLite's default.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    File,
    Memory,
}

impl Storage {
    fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens (creating if needed) the proposal database at `path`.
///
/// The parent directory must already exist.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(DbError::MissingDirectory(parent.display().to_string()));
        }
    }
    connect(Storage::File, || Connection::open(path))
}

/// Opens a private in-memory proposal database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    connect(Storage::Memory, Connection::open_in_memory)
}

fn connect(
    storage: Storage,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = open()
        .map_err(DbError::from)
        .and_then(|mut conn| prepare(&mut conn, storage).map(|applied| (conn, applied)));

    match result {
        Ok((conn, applied)) => {
            info!(
                "event=db_open module=db status=ok storage={} migrations_applied={applied} duration_ms={}",
                storage.as_str(),
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error storage={} duration_ms={} error={err}",
                storage.as_str(),
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn prepare(conn: &mut Connection, storage: Storage) -> DbResult<usize> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if storage == Storage::File {
        // journal_mode returns a row, so it cannot go through execute_batch.
        conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
    }
    apply_migrations(conn)
}
