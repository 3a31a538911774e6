//! Use-case outcomes and errors handed back to the web layer.
//!
//! # Invariants
//! - Recoverable failures map to exactly one `Redirection` with a flash.
//! - `InvalidTransition` and storage failures have no redirection; callers
//!   must surface them.

use crate::export::ExportError;
use crate::model::proposal::{Proposal, ProposalId, ProposalValidationError};
use crate::model::user::UserId;
use crate::policy::transition::{InvalidTransitionError, UnknownTransitionEvent};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MSG_PROPOSAL_NOT_FOUND: &str =
    "Sorry, that presentation proposal doesn't exist or has been deleted.";
pub const MSG_EVENT_NOT_FOUND: &str = "Sorry, that event doesn't exist.";
pub const MSG_SIGN_IN: &str = "Please sign in to continue.";
pub const MSG_COMPLETE_PROFILE: &str = "Please complete your profile before submitting a proposal.";
pub const MSG_EVENT_CLOSED: &str =
    "You cannot submit proposals because this event is not accepting proposals.";
pub const MSG_UNAUTHORIZED: &str = "Sorry, you can't change a proposal you don't own.";

/// Canonical redirect destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    SignIn,
    /// Proposals of every event.
    ProposalList,
    EventProposals(String),
    EventSessions(String),
    EventSchedule(String),
    Proposal(ProposalId),
    Session(ProposalId),
    /// Profile form flagged to require completion.
    EditProfile(UserId),
}

impl Redirect {
    /// Site-relative path of the destination.
    pub fn path(&self) -> String {
        match self {
            Self::SignIn => "/sign_in".to_string(),
            Self::ProposalList => "/proposals".to_string(),
            Self::EventProposals(slug) => format!("/events/{slug}/proposals"),
            Self::EventSessions(slug) => format!("/events/{slug}/sessions"),
            Self::EventSchedule(slug) => format!("/events/{slug}/schedule"),
            Self::Proposal(id) => format!("/proposals/{id}"),
            Self::Session(id) => format!("/sessions/{id}"),
            Self::EditProfile(id) => format!("/users/{id}/edit?require_complete_profile=true"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Notice,
    Failure,
}

/// One-shot message shown after a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Notice,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Failure,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub target: Redirect,
    pub flash: Option<Flash>,
}

impl Redirection {
    pub fn to(target: Redirect) -> Self {
        Self {
            target,
            flash: None,
        }
    }

    pub fn with_flash(target: Redirect, flash: Flash) -> Self {
        Self {
            target,
            flash: Some(flash),
        }
    }
}

/// Either a page to render or a redirect to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Render(T),
    Redirect(Redirection),
}

impl<T> Outcome<T> {
    /// Rendered value, if any.
    pub fn rendered(self) -> Option<T> {
        match self {
            Self::Render(value) => Some(value),
            Self::Redirect(_) => None,
        }
    }

    pub fn redirection(&self) -> Option<&Redirection> {
        match self {
            Self::Render(_) => None,
            Self::Redirect(redirection) => Some(redirection),
        }
    }
}

/// Proposal plus its field errors, for form (re)display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalForm {
    pub proposal: Proposal,
    pub errors: Vec<ProposalValidationError>,
    /// Whether the title input is editable for the viewer.
    pub title_editable: bool,
    /// Set when the form is rendered for a preview submission.
    pub preview: bool,
}

impl ProposalForm {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Errors from proposal use-case operations.
#[derive(Debug)]
pub enum ServiceError {
    /// No proposal with the requested id.
    ProposalNotFound(Option<ProposalId>),
    /// Proposal exists but has no parent event; carries the current event
    /// slug to fall back to.
    EventMissing {
        proposal_id: ProposalId,
        current_event: Option<String>,
    },
    EventNotFound(String),
    /// Viewer is signed in but not allowed to act on the proposal.
    Unauthorized(ProposalId),
    LoginRequired,
    IncompleteProfile(UserId),
    EventClosed(String),
    InvalidTransition(InvalidTransitionError),
    UnknownTransition(UnknownTransitionEvent),
    Repo(RepoError),
    Export(ExportError),
}

impl ServiceError {
    /// Recovery redirect for recoverable failures; `None` when the error must
    /// be surfaced.
    pub fn redirection(&self) -> Option<Redirection> {
        let redirection = match self {
            Self::ProposalNotFound(_) => Redirection::with_flash(
                Redirect::ProposalList,
                Flash::failure(MSG_PROPOSAL_NOT_FOUND),
            ),
            Self::EventMissing { current_event, .. } => {
                let target = match current_event {
                    Some(slug) => Redirect::EventProposals(slug.clone()),
                    None => Redirect::ProposalList,
                };
                Redirection::with_flash(target, Flash::failure(self.to_string()))
            }
            Self::EventNotFound(_) => Redirection::with_flash(
                Redirect::ProposalList,
                Flash::failure(MSG_EVENT_NOT_FOUND),
            ),
            Self::Unauthorized(id) => Redirection::with_flash(
                Redirect::Proposal(*id),
                Flash::failure(MSG_UNAUTHORIZED),
            ),
            Self::LoginRequired => {
                Redirection::with_flash(Redirect::SignIn, Flash::notice(MSG_SIGN_IN))
            }
            Self::IncompleteProfile(user_id) => Redirection::with_flash(
                Redirect::EditProfile(*user_id),
                Flash::notice(MSG_COMPLETE_PROFILE),
            ),
            Self::EventClosed(slug) => Redirection::with_flash(
                Redirect::EventProposals(slug.clone()),
                Flash::failure(MSG_EVENT_CLOSED),
            ),
            Self::InvalidTransition(_)
            | Self::UnknownTransition(_)
            | Self::Repo(_)
            | Self::Export(_) => return None,
        };
        Some(redirection)
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProposalNotFound(_) => write!(f, "{MSG_PROPOSAL_NOT_FOUND}"),
            Self::EventMissing { proposal_id, .. } => {
                write!(f, "Sorry, no event was associated with proposal #{proposal_id}")
            }
            Self::EventNotFound(slug) => write!(f, "event not found: {slug}"),
            Self::Unauthorized(id) => write!(f, "not allowed to change proposal {id}"),
            Self::LoginRequired => write!(f, "sign in required"),
            Self::IncompleteProfile(id) => write!(f, "user {id} has an incomplete profile"),
            Self::EventClosed(slug) => write!(f, "event `{slug}` is not accepting proposals"),
            Self::InvalidTransition(err) => write!(f, "{err}"),
            Self::UnknownTransition(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTransition(err) => Some(err),
            Self::UnknownTransition(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Export(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "proposal",
                id,
            } => Self::ProposalNotFound(Some(id)),
            other => Self::Repo(other),
        }
    }
}

impl From<InvalidTransitionError> for ServiceError {
    fn from(value: InvalidTransitionError) -> Self {
        Self::InvalidTransition(value)
    }
}

impl From<UnknownTransitionEvent> for ServiceError {
    fn from(value: UnknownTransitionEvent) -> Self {
        Self::UnknownTransition(value)
    }
}

impl From<ExportError> for ServiceError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}
