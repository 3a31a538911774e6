//! Proposal database bootstrap.
//!
//! # Responsibility
//! - Open configured SQLite connections for the repositories.
//! - Keep the proposal schema current through `migrations`.
//!
//! # Invariants
//! - Repositories only ever see connections returned by `open_db*`.
//! - Schema version lives in `PRAGMA user_version`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::{latest_version, schema_version};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The directory meant to hold the database file does not exist.
    MissingDirectory(String),
    MigrationFailed {
        version: u32,
        source: rusqlite::Error,
    },
    /// Migrated rows reference a missing parent in `table`.
    ForeignKeyViolation {
        table: String,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::MissingDirectory(dir) => write!(f, "database directory does not exist: {dir}"),
            Self::MigrationFailed { version, source } => {
                write!(f, "proposal schema migration {version} failed: {source}")
            }
            Self::ForeignKeyViolation { table } => {
                write!(f, "migration left dangling references in `{table}`")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "proposal database is at schema {db_version}, this build supports up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::MigrationFailed { source: err, .. } => Some(err),
            Self::MissingDirectory(_)
            | Self::ForeignKeyViolation { .. }
            | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
