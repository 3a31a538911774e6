//! Event repository contracts and SQLite implementation.
//!
//! # Invariants
//! - An event is always loaded together with its tracks and session types.
//! - Slugs are unique; lookups by slug are exact.

use crate::model::event::{Event, EventId, EventPolicy, SessionType, Track};
use crate::repo::{bool_to_int, parse_flag, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const EVENT_SELECT_SQL: &str = "SELECT
    uuid,
    slug,
    title,
    accepting_proposals,
    proposal_status_published,
    schedule_published,
    proposal_titles_locked,
    show_proposal_confirmation_controls
FROM events";

pub trait EventRepository {
    /// Inserts the event with its tracks and session types.
    fn create_event(&self, event: &Event) -> RepoResult<EventId>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    fn find_event_by_slug(&self, slug: &str) -> RepoResult<Option<Event>>;
    fn update_event_policy(&self, id: EventId, policy: &EventPolicy) -> RepoResult<()>;
    fn add_track(&self, event_id: EventId, track: &Track) -> RepoResult<()>;
    fn add_session_type(&self, event_id: EventId, session_type: &SessionType) -> RepoResult<()>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_one(&self, where_sql: &str, value: &str) -> RepoResult<Option<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE {where_sql};"))?;
        let mut rows = stmt.query([value])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut event = parse_event_row(row)?;
        event.tracks = load_tracks(self.conn, event.id)?;
        event.session_types = load_session_types(self.conn, event.id)?;
        Ok(Some(event))
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&self, event: &Event) -> RepoResult<EventId> {
        event.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO events (
                uuid,
                slug,
                title,
                accepting_proposals,
                proposal_status_published,
                schedule_published,
                proposal_titles_locked,
                show_proposal_confirmation_controls
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                event.id.to_string(),
                event.slug.as_str(),
                event.title.as_str(),
                bool_to_int(event.policy.accepting_proposals),
                bool_to_int(event.policy.proposal_status_published),
                bool_to_int(event.policy.schedule_published),
                bool_to_int(event.policy.proposal_titles_locked),
                bool_to_int(event.policy.show_proposal_confirmation_controls),
            ],
        )?;
        for track in &event.tracks {
            insert_track(&tx, event.id, track)?;
        }
        for session_type in &event.session_types {
            insert_session_type(&tx, event.id, session_type)?;
        }
        tx.commit()?;

        Ok(event.id)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        self.load_one("uuid = ?1", &id.to_string())
    }

    fn find_event_by_slug(&self, slug: &str) -> RepoResult<Option<Event>> {
        self.load_one("slug = ?1", slug)
    }

    fn update_event_policy(&self, id: EventId, policy: &EventPolicy) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE events
             SET
                accepting_proposals = ?2,
                proposal_status_published = ?3,
                schedule_published = ?4,
                proposal_titles_locked = ?5,
                show_proposal_confirmation_controls = ?6
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                bool_to_int(policy.accepting_proposals),
                bool_to_int(policy.proposal_status_published),
                bool_to_int(policy.schedule_published),
                bool_to_int(policy.proposal_titles_locked),
                bool_to_int(policy.show_proposal_confirmation_controls),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "event", id });
        }
        Ok(())
    }

    fn add_track(&self, event_id: EventId, track: &Track) -> RepoResult<()> {
        insert_track(self.conn, event_id, track)
    }

    fn add_session_type(&self, event_id: EventId, session_type: &SessionType) -> RepoResult<()> {
        insert_session_type(self.conn, event_id, session_type)
    }
}

fn insert_track(conn: &Connection, event_id: EventId, track: &Track) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO tracks (uuid, event_uuid, title) VALUES (?1, ?2, ?3);",
        params![track.id.to_string(), event_id.to_string(), track.title.as_str()],
    )?;
    Ok(())
}

fn insert_session_type(
    conn: &Connection,
    event_id: EventId,
    session_type: &SessionType,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO session_types (uuid, event_uuid, title) VALUES (?1, ?2, ?3);",
        params![
            session_type.id.to_string(),
            event_id.to_string(),
            session_type.title.as_str()
        ],
    )?;
    Ok(())
}

fn load_tracks(conn: &Connection, event_id: EventId) -> RepoResult<Vec<Track>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, title FROM tracks WHERE event_uuid = ?1 ORDER BY title COLLATE NOCASE, uuid;",
    )?;
    let mut rows = stmt.query([event_id.to_string()])?;
    let mut tracks = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get("uuid")?;
        tracks.push(Track {
            id: parse_uuid(&uuid_text, "tracks.uuid")?,
            title: row.get("title")?,
        });
    }
    Ok(tracks)
}

fn load_session_types(conn: &Connection, event_id: EventId) -> RepoResult<Vec<SessionType>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, title FROM session_types
         WHERE event_uuid = ?1
         ORDER BY title COLLATE NOCASE, uuid;",
    )?;
    let mut rows = stmt.query([event_id.to_string()])?;
    let mut session_types = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get("uuid")?;
        session_types.push(SessionType {
            id: parse_uuid(&uuid_text, "session_types.uuid")?,
            title: row.get("title")?,
        });
    }
    Ok(session_types)
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let uuid_text: String = row.get("uuid")?;
    let policy = EventPolicy {
        accepting_proposals: parse_flag(
            row.get("accepting_proposals")?,
            "events.accepting_proposals",
        )?,
        proposal_status_published: parse_flag(
            row.get("proposal_status_published")?,
            "events.proposal_status_published",
        )?,
        schedule_published: parse_flag(
            row.get("schedule_published")?,
            "events.schedule_published",
        )?,
        proposal_titles_locked: parse_flag(
            row.get("proposal_titles_locked")?,
            "events.proposal_titles_locked",
        )?,
        show_proposal_confirmation_controls: parse_flag(
            row.get("show_proposal_confirmation_controls")?,
            "events.show_proposal_confirmation_controls",
        )?,
    };
    Ok(Event {
        id: parse_uuid(&uuid_text, "events.uuid")?,
        slug: row.get("slug")?,
        title: row.get("title")?,
        policy,
        tracks: Vec::new(),
        session_types: Vec::new(),
    })
}
