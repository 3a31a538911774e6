//! Proposal domain model.
//!
//! # Responsibility
//! - Define the canonical record for a submitted talk and its owners.
//! - Provide field validation used by create/update and repository writes.
//!
//! # Invariants
//! - `id` is stable and never reused for another proposal.
//! - `status` only changes through the transition table in `policy::transition`.
//! - `end_time` should not be earlier than `start_time` when both are set.
//! - `email` and `note_to_organizers` are private and never exported publicly.

use crate::model::event::{EventId, SessionType, Track};
use crate::model::user::{User, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for proposals.
pub type ProposalId = Uuid;

/// Review status of a proposal.
///
/// `Rejected`, `Junk`, `Confirmed` and `Declined` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProposalStatus {
    /// Submitted and awaiting review.
    Proposed,
    /// Accepted by organizers, awaiting speaker confirmation.
    Accepted,
    /// Rejected by organizers.
    Rejected,
    /// Spam or otherwise unusable submission.
    Junk,
    /// Speaker confirmed an accepted proposal.
    Confirmed,
    /// Speaker declined an accepted proposal.
    Declined,
}

impl ProposalStatus {
    /// Stable storage/wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Junk => "junk",
            Self::Confirmed => "confirmed",
            Self::Declined => "declined",
        }
    }

    /// Returns whether no transition leaves this status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Junk | Self::Confirmed | Self::Declined
        )
    }
}

impl Display for ProposalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = ProposalValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "proposed" => Ok(Self::Proposed),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "junk" => Ok(Self::Junk),
            "confirmed" => Ok(Self::Confirmed),
            "declined" => Ok(Self::Declined),
            other => Err(ProposalValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// Field-level validation failure for proposals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalValidationError {
    NilId,
    MissingTitle,
    MissingPresenter,
    InvalidTimeWindow { start: i64, end: i64 },
    IncompleteOwnerProfile(UserId),
    UnknownStatus(String),
}

impl ProposalValidationError {
    /// Form field the error should be displayed against.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NilId => "id",
            Self::MissingTitle => "title",
            Self::MissingPresenter => "presenter",
            Self::InvalidTimeWindow { .. } => "end_time",
            Self::IncompleteOwnerProfile(_) => "users",
            Self::UnknownStatus(_) => "status",
        }
    }
}

impl Display for ProposalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "proposal id must not be nil"),
            Self::MissingTitle => write!(f, "title can't be blank"),
            Self::MissingPresenter => write!(f, "presenter can't be blank"),
            Self::InvalidTimeWindow { start, end } => {
                write!(f, "end_time ({end}) must be >= start_time ({start})")
            }
            Self::IncompleteOwnerProfile(user_id) => {
                write!(f, "speaker {user_id} must complete their profile")
            }
            Self::UnknownStatus(value) => write!(f, "unknown proposal status `{value}`"),
        }
    }
}

impl Error for ProposalValidationError {}

/// Canonical record for a talk proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    /// `None` only for orphaned rows; such proposals cannot be shown.
    pub event_id: Option<EventId>,
    pub title: String,
    pub presenter: String,
    /// Private contact address.
    pub email: Option<String>,
    pub excerpt: String,
    pub description: String,
    /// Private notes visible to organizers only.
    pub note_to_organizers: Option<String>,
    /// Unix epoch milliseconds.
    pub submitted_at: i64,
    /// Unix epoch milliseconds. Set once the session is scheduled.
    pub start_time: Option<i64>,
    /// Unix epoch milliseconds. Should be >= `start_time` when set.
    pub end_time: Option<i64>,
    pub status: ProposalStatus,
    /// Owning speakers, in presentation order.
    pub users: Vec<User>,
    pub track: Option<Track>,
    pub session_type: Option<SessionType>,
}

impl Proposal {
    /// Creates a new `proposed` proposal with a generated stable ID.
    pub fn new(
        event_id: EventId,
        title: impl Into<String>,
        presenter: impl Into<String>,
        submitted_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: Some(event_id),
            title: title.into(),
            presenter: presenter.into(),
            email: None,
            excerpt: String::new(),
            description: String::new(),
            note_to_organizers: None,
            submitted_at,
            start_time: None,
            end_time: None,
            status: ProposalStatus::Proposed,
            users: Vec::new(),
            track: None,
            session_type: None,
        }
    }

    /// Returns the first validation failure, if any.
    pub fn validate(&self) -> Result<(), ProposalValidationError> {
        match self.validation_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Collects every field failure for form redisplay.
    pub fn validation_errors(&self) -> Vec<ProposalValidationError> {
        let mut errors = Vec::new();
        if self.id.is_nil() {
            errors.push(ProposalValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            errors.push(ProposalValidationError::MissingTitle);
        }
        if self.presenter.trim().is_empty() {
            errors.push(ProposalValidationError::MissingPresenter);
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end < start {
                errors.push(ProposalValidationError::InvalidTimeWindow { start, end });
            }
        }
        errors
    }

    /// Returns whether `user_id` is among the owning speakers.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.users.iter().any(|user| user.id == user_id)
    }

    /// Appends an owner unless already present.
    pub fn add_user(&mut self, user: User) -> bool {
        if self.is_owned_by(user.id) {
            return false;
        }
        self.users.push(user);
        true
    }

    /// Removes an owner; returns whether anything was removed.
    pub fn remove_user(&mut self, user_id: UserId) -> bool {
        let before = self.users.len();
        self.users.retain(|user| user.id != user_id);
        self.users.len() != before
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ProposalStatus::Confirmed
    }

    pub fn is_scheduled(&self) -> bool {
        self.start_time.is_some()
    }

    /// Owner full names joined for display, e.g. `"Ada, Grace"`.
    pub fn speaker_names(&self) -> String {
        self.users
            .iter()
            .map(|user| user.fullname.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
