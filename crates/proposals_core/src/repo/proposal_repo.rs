//! Proposal repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist proposals together with their ordered owner list.
//! - Resolve track/session type titles on read.
//!
//! # Invariants
//! - Write paths call `Proposal::validate()` before SQL mutations.
//! - Owner lists are replaced atomically with the proposal row.
//! - Lists are ordered by `submitted_at ASC, uuid ASC`; callers re-sort.

use crate::model::event::{EventId, SessionType, Track};
use crate::model::proposal::{Proposal, ProposalId, ProposalStatus};
use crate::model::user::User;
use crate::repo::user_repo::parse_user_row;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PROPOSAL_SELECT_SQL: &str = "SELECT
    p.uuid,
    p.event_uuid,
    p.title,
    p.presenter,
    p.email,
    p.excerpt,
    p.description,
    p.note_to_organizers,
    p.submitted_at,
    p.start_time,
    p.end_time,
    p.status,
    p.track_uuid,
    t.title AS track_title,
    p.session_type_uuid,
    st.title AS session_type_title
FROM proposals p
LEFT JOIN tracks t ON t.uuid = p.track_uuid
LEFT JOIN session_types st ON st.uuid = p.session_type_uuid";

/// Query options for listing proposals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalListQuery {
    /// Restrict to one event; `None` lists every event.
    pub event_id: Option<EventId>,
    /// Restrict to these statuses; empty means any status.
    pub statuses: Vec<ProposalStatus>,
    /// Only proposals with a `start_time`.
    pub scheduled_only: bool,
}

/// Repository interface for proposal persistence.
pub trait ProposalRepository {
    fn create_proposal(&self, proposal: &Proposal) -> RepoResult<ProposalId>;
    /// Replaces every column and the owner list.
    fn update_proposal(&self, proposal: &Proposal) -> RepoResult<()>;
    fn get_proposal(&self, id: ProposalId) -> RepoResult<Option<Proposal>>;
    fn list_proposals(&self, query: &ProposalListQuery) -> RepoResult<Vec<Proposal>>;
    /// Hard delete; owner links cascade.
    fn delete_proposal(&self, id: ProposalId) -> RepoResult<()>;
}

/// SQLite-backed proposal repository.
pub struct SqliteProposalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProposalRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProposalRepository for SqliteProposalRepository<'_> {
    fn create_proposal(&self, proposal: &Proposal) -> RepoResult<ProposalId> {
        proposal.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO proposals (
                uuid,
                event_uuid,
                title,
                presenter,
                email,
                excerpt,
                description,
                note_to_organizers,
                submitted_at,
                start_time,
                end_time,
                status,
                track_uuid,
                session_type_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                proposal.id.to_string(),
                proposal.event_id.map(|id| id.to_string()),
                proposal.title.as_str(),
                proposal.presenter.as_str(),
                proposal.email.as_deref(),
                proposal.excerpt.as_str(),
                proposal.description.as_str(),
                proposal.note_to_organizers.as_deref(),
                proposal.submitted_at,
                proposal.start_time,
                proposal.end_time,
                proposal.status.as_str(),
                proposal.track.as_ref().map(|track| track.id.to_string()),
                proposal.session_type.as_ref().map(|st| st.id.to_string()),
            ],
        )?;
        replace_owners(&tx, proposal)?;
        tx.commit()?;

        Ok(proposal.id)
    }

    fn update_proposal(&self, proposal: &Proposal) -> RepoResult<()> {
        proposal.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE proposals
             SET
                event_uuid = ?2,
                title = ?3,
                presenter = ?4,
                email = ?5,
                excerpt = ?6,
                description = ?7,
                note_to_organizers = ?8,
                submitted_at = ?9,
                start_time = ?10,
                end_time = ?11,
                status = ?12,
                track_uuid = ?13,
                session_type_uuid = ?14
             WHERE uuid = ?1;",
            params![
                proposal.id.to_string(),
                proposal.event_id.map(|id| id.to_string()),
                proposal.title.as_str(),
                proposal.presenter.as_str(),
                proposal.email.as_deref(),
                proposal.excerpt.as_str(),
                proposal.description.as_str(),
                proposal.note_to_organizers.as_deref(),
                proposal.submitted_at,
                proposal.start_time,
                proposal.end_time,
                proposal.status.as_str(),
                proposal.track.as_ref().map(|track| track.id.to_string()),
                proposal.session_type.as_ref().map(|st| st.id.to_string()),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "proposal",
                id: proposal.id,
            });
        }
        replace_owners(&tx, proposal)?;
        tx.commit()?;

        Ok(())
    }

    fn get_proposal(&self, id: ProposalId) -> RepoResult<Option<Proposal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROPOSAL_SELECT_SQL} WHERE p.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut proposal = parse_proposal_row(row)?;
            proposal.users = load_owners(self.conn, proposal.id)?;
            return Ok(Some(proposal));
        }
        Ok(None)
    }

    fn list_proposals(&self, query: &ProposalListQuery) -> RepoResult<Vec<Proposal>> {
        let mut sql = format!("{PROPOSAL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(event_id) = query.event_id {
            sql.push_str(" AND p.event_uuid = ?");
            bind_values.push(Value::Text(event_id.to_string()));
        }

        if !query.statuses.is_empty() {
            let placeholders = vec!["?"; query.statuses.len()].join(", ");
            sql.push_str(&format!(" AND p.status IN ({placeholders})"));
            for status in &query.statuses {
                bind_values.push(Value::Text(status.as_str().to_string()));
            }
        }

        if query.scheduled_only {
            sql.push_str(" AND p.start_time IS NOT NULL");
        }

        sql.push_str(" ORDER BY p.submitted_at ASC, p.uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut proposals = Vec::new();
        while let Some(row) = rows.next()? {
            proposals.push(parse_proposal_row(row)?);
        }
        for proposal in &mut proposals {
            proposal.users = load_owners(self.conn, proposal.id)?;
        }

        Ok(proposals)
    }

    fn delete_proposal(&self, id: ProposalId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM proposals WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "proposal",
                id,
            });
        }
        Ok(())
    }
}

fn replace_owners(conn: &Connection, proposal: &Proposal) -> RepoResult<()> {
    let proposal_id = proposal.id.to_string();
    conn.execute(
        "DELETE FROM proposal_users WHERE proposal_uuid = ?1;",
        [proposal_id.as_str()],
    )?;
    for (position, user) in proposal.users.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| RepoError::InvalidData("too many proposal owners".to_string()))?;
        conn.execute(
            "INSERT INTO proposal_users (proposal_uuid, user_uuid, position)
             VALUES (?1, ?2, ?3);",
            params![proposal_id.as_str(), user.id.to_string(), position],
        )?;
    }
    Ok(())
}

fn load_owners(conn: &Connection, proposal_id: ProposalId) -> RepoResult<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT u.uuid, u.fullname, u.email, u.admin, u.complete_profile
         FROM proposal_users pu
         INNER JOIN users u ON u.uuid = pu.user_uuid
         WHERE pu.proposal_uuid = ?1
         ORDER BY pu.position ASC;",
    )?;
    let mut rows = stmt.query([proposal_id.to_string()])?;
    let mut users = Vec::new();
    while let Some(row) = rows.next()? {
        users.push(parse_user_row(row)?);
    }
    Ok(users)
}

fn parse_proposal_row(row: &Row<'_>) -> RepoResult<Proposal> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "proposals.uuid")?;

    let event_id = match row.get::<_, Option<String>>("event_uuid")? {
        Some(value) => Some(parse_uuid(&value, "proposals.event_uuid")?),
        None => None,
    };

    let status_text: String = row.get("status")?;
    let status = status_text.parse::<ProposalStatus>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in proposals.status"
        ))
    })?;

    let track = match row.get::<_, Option<String>>("track_uuid")? {
        Some(value) => Some(Track {
            id: parse_uuid(&value, "proposals.track_uuid")?,
            title: row.get::<_, Option<String>>("track_title")?.unwrap_or_default(),
        }),
        None => None,
    };
    let session_type = match row.get::<_, Option<String>>("session_type_uuid")? {
        Some(value) => Some(SessionType {
            id: parse_uuid(&value, "proposals.session_type_uuid")?,
            title: row
                .get::<_, Option<String>>("session_type_title")?
                .unwrap_or_default(),
        }),
        None => None,
    };

    let proposal = Proposal {
        id,
        event_id,
        title: row.get("title")?,
        presenter: row.get("presenter")?,
        email: row.get("email")?,
        excerpt: row.get("excerpt")?,
        description: row.get("description")?,
        note_to_organizers: row.get("note_to_organizers")?,
        submitted_at: row.get("submitted_at")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        status,
        users: Vec::new(),
        track,
        session_type,
    };
    proposal.validate()?;
    Ok(proposal)
}
