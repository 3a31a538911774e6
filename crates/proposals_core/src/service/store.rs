//! Storage seam used by the proposal service.
//!
//! # Responsibility
//! - Bundle the proposal, event and user repositories behind one bound.
//! - Provide the SQLite-backed store sharing one connection.

use crate::model::event::{Event, EventId, EventPolicy, SessionType, Track};
use crate::model::proposal::{Proposal, ProposalId};
use crate::model::user::{User, UserId};
use crate::repo::event_repo::{EventRepository, SqliteEventRepository};
use crate::repo::proposal_repo::{ProposalListQuery, ProposalRepository, SqliteProposalRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;

/// Every repository a proposal use-case may touch.
pub trait ProposalStore: ProposalRepository + EventRepository + UserRepository {}

impl<T> ProposalStore for T where T: ProposalRepository + EventRepository + UserRepository {}

/// SQLite store over one borrowed connection.
pub struct SqliteStore<'conn> {
    proposals: SqliteProposalRepository<'conn>,
    events: SqliteEventRepository<'conn>,
    users: SqliteUserRepository<'conn>,
}

impl<'conn> SqliteStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            proposals: SqliteProposalRepository::new(conn),
            events: SqliteEventRepository::new(conn),
            users: SqliteUserRepository::new(conn),
        }
    }
}

impl ProposalRepository for SqliteStore<'_> {
    fn create_proposal(&self, proposal: &Proposal) -> RepoResult<ProposalId> {
        self.proposals.create_proposal(proposal)
    }

    fn update_proposal(&self, proposal: &Proposal) -> RepoResult<()> {
        self.proposals.update_proposal(proposal)
    }

    fn get_proposal(&self, id: ProposalId) -> RepoResult<Option<Proposal>> {
        self.proposals.get_proposal(id)
    }

    fn list_proposals(&self, query: &ProposalListQuery) -> RepoResult<Vec<Proposal>> {
        self.proposals.list_proposals(query)
    }

    fn delete_proposal(&self, id: ProposalId) -> RepoResult<()> {
        self.proposals.delete_proposal(id)
    }
}

impl EventRepository for SqliteStore<'_> {
    fn create_event(&self, event: &Event) -> RepoResult<EventId> {
        self.events.create_event(event)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        self.events.get_event(id)
    }

    fn find_event_by_slug(&self, slug: &str) -> RepoResult<Option<Event>> {
        self.events.find_event_by_slug(slug)
    }

    fn update_event_policy(&self, id: EventId, policy: &EventPolicy) -> RepoResult<()> {
        self.events.update_event_policy(id, policy)
    }

    fn add_track(&self, event_id: EventId, track: &Track) -> RepoResult<()> {
        self.events.add_track(event_id, track)
    }

    fn add_session_type(&self, event_id: EventId, session_type: &SessionType) -> RepoResult<()> {
        self.events.add_session_type(event_id, session_type)
    }
}

impl UserRepository for SqliteStore<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        self.users.create_user(user)
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        self.users.update_user(user)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.users.get_user(id)
    }

    fn list_complete_profiles(&self) -> RepoResult<Vec<User>> {
        self.users.list_complete_profiles()
    }
}
