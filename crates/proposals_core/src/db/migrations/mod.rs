//! Proposal schema migrations.
//!
//! # Responsibility
//! - Keep the ordered list of schema steps for users, events and proposals.
//! - Bring a connection up to the newest schema inside one transaction.
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one per step.
//! - `PRAGMA user_version` always equals the last applied step.
//! - A batch that leaves dangling foreign keys is rolled back.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

/// One schema step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    /// Short label used in logs and the CLI.
    pub name: &'static str,
    sql: &'static str,
}

const PROPOSAL_SCHEMA: &[Migration] = &[
    Migration {
        version: 1,
        name: "users_events_proposals",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "tracks_and_session_types",
        sql: include_str!("0002_tracks.sql"),
    },
];

/// Every known schema step, oldest first.
pub fn migrations() -> &'static [Migration] {
    PROPOSAL_SCHEMA
}

/// Newest schema version this build can open.
pub fn latest_version() -> u32 {
    PROPOSAL_SCHEMA.last().map_or(0, |step| step.version)
}

/// Schema version recorded in the database file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Steps not yet applied to `conn`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn pending_migrations(conn: &Connection) -> DbResult<Vec<Migration>> {
    let current = checked_version(conn)?;
    Ok(PROPOSAL_SCHEMA
        .iter()
        .filter(|step| step.version > current)
        .copied()
        .collect())
}

/// Applies pending steps and returns how many ran.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let pending = pending_migrations(conn)?;
    if pending.is_empty() {
        debug!("event=db_migrate module=db status=up_to_date version={}", latest_version());
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)
            .map_err(|source| DbError::MigrationFailed {
                version: step.version,
                source,
            })?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate module=db status=applied version={} name={}",
            step.version, step.name
        );
    }
    if let Some(table) = first_foreign_key_violation(&tx)? {
        return Err(DbError::ForeignKeyViolation { table });
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok applied={} version={}",
        pending.len(),
        latest_version()
    );
    Ok(pending.len())
}

fn checked_version(conn: &Connection) -> DbResult<u32> {
    let current = schema_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    Ok(current)
}

fn first_foreign_key_violation(conn: &Connection) -> DbResult<Option<String>> {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check;")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get::<_, String>(0)?)),
        None => Ok(None),
    }
}
