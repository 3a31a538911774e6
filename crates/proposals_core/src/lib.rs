//! Core domain logic for conference talk proposals.
//! This crate is the single source of truth for proposal lifecycle,
//! visibility and export rules.

pub mod config;
pub mod db;
pub mod export;
pub mod listing;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;

pub use config::{ProposalSettings, SettingsError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use export::{ExportError, ExportFormat};
pub use listing::{ProposalSort, SortDirection, SortKey};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{Event, EventId, EventPolicy, SessionType, Track};
pub use model::proposal::{Proposal, ProposalId, ProposalStatus, ProposalValidationError};
pub use model::user::{User, UserId};
pub use policy::transition::{InvalidTransitionError, TransitionEvent};
pub use policy::visibility::ShowRoute;
pub use repo::{RepoError, RepoResult};
pub use service::{
    Outcome, ProposalInput, ProposalService, Redirect, ServiceError, ServiceResult, SqliteStore,
    SubmitMode,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
