//! Event domain model and publication policy.
//!
//! # Responsibility
//! - Define the parent event of proposals with its tracks and session types.
//! - Carry publication/locking switches as one immutable `EventPolicy` value.
//!
//! # Invariants
//! - `slug` is lowercase `[a-z0-9][a-z0-9_-]*` and unique per event.
//! - Policy checks read `EventPolicy` only; nothing mutates it mid-request.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid slug regex"));

/// Stable identifier for events.
pub type EventId = Uuid;

/// Returns whether `value` is a well-formed event slug.
pub fn is_valid_slug(value: &str) -> bool {
    SLUG_RE.is_match(value)
}

/// Publication and editing switches of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPolicy {
    /// Whether new proposals are accepted (event is "open").
    pub accepting_proposals: bool,
    /// Whether review outcomes (and thus sessions) are public.
    pub proposal_status_published: bool,
    /// Whether session times are public.
    pub schedule_published: bool,
    /// Whether non-admins may still change proposal titles.
    pub proposal_titles_locked: bool,
    /// Whether speakers see confirm/decline controls on accepted proposals.
    pub show_proposal_confirmation_controls: bool,
}

impl Default for EventPolicy {
    fn default() -> Self {
        Self {
            accepting_proposals: true,
            proposal_status_published: false,
            schedule_published: false,
            proposal_titles_locked: false,
            show_proposal_confirmation_controls: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: Uuid,
    pub title: String,
}

impl Track {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionType {
    pub id: Uuid,
    pub title: String,
}

impl SessionType {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
        }
    }
}

/// Conference event that owns proposals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub slug: String,
    pub title: String,
    pub policy: EventPolicy,
    pub tracks: Vec<Track>,
    pub session_types: Vec<SessionType>,
}

impl Event {
    /// Creates an open event with default policy and no tracks.
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slug.into(),
            title: title.into(),
            policy: EventPolicy::default(),
            tracks: Vec::new(),
            session_types: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), EventValidationError> {
        if !is_valid_slug(&self.slug) {
            return Err(EventValidationError::InvalidSlug(self.slug.clone()));
        }
        if self.title.trim().is_empty() {
            return Err(EventValidationError::MissingTitle);
        }
        Ok(())
    }

    /// The only track, when exactly one exists.
    pub fn sole_track(&self) -> Option<&Track> {
        match self.tracks.as_slice() {
            [track] => Some(track),
            _ => None,
        }
    }

    /// The only session type, when exactly one exists.
    pub fn sole_session_type(&self) -> Option<&SessionType> {
        match self.session_types.as_slice() {
            [session_type] => Some(session_type),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    InvalidSlug(String),
    MissingTitle,
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSlug(slug) => write!(f, "invalid event slug `{slug}`"),
            Self::MissingTitle => write!(f, "event title can't be blank"),
        }
    }
}

impl Error for EventValidationError {}
