//! Schedule and session visibility.
//!
//! A confirmed proposal is presented as a "session" once its event publishes
//! proposal statuses. The show route is normalized so each proposal has one
//! canonical URL for the current viewer.

use crate::model::event::Event;
use crate::model::proposal::Proposal;
use crate::model::user::{is_admin, User};

/// Route a proposal was requested through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowRoute {
    Proposal,
    Session,
}

/// Result of normalizing a show request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowDecision {
    /// Render the requested page as is.
    Display,
    /// Redirect to the canonical route.
    RedirectTo(ShowRoute),
}

/// Whether session timing may be shown to `user`.
pub fn schedule_visible(event: &Event, user: Option<&User>) -> bool {
    event.policy.schedule_published || is_admin(user)
}

/// Whether the sessions listing of `event` may be shown to `user`.
pub fn sessions_visible(event: &Event, user: Option<&User>) -> bool {
    event.policy.proposal_status_published || is_admin(user)
}

/// Whether `proposal` may be rendered as a session for `user`.
///
/// `event` must be the proposal's own event, not the current one.
pub fn session_visible(event: &Event, proposal: &Proposal, user: Option<&User>) -> bool {
    proposal.is_confirmed() && sessions_visible(event, user)
}

/// Normalizes a show request to its canonical route.
///
/// - Session route: displays only a visible session, otherwise redirects to
///   the proposal route.
/// - Proposal route: redirects a confirmed proposal to the session route once
///   statuses are published, otherwise displays.
pub fn resolve_show_route(
    event: &Event,
    proposal: &Proposal,
    user: Option<&User>,
    route: ShowRoute,
) -> ShowDecision {
    match route {
        ShowRoute::Session if session_visible(event, proposal, user) => ShowDecision::Display,
        ShowRoute::Session => ShowDecision::RedirectTo(ShowRoute::Proposal),
        ShowRoute::Proposal
            if event.policy.proposal_status_published && proposal.is_confirmed() =>
        {
            ShowDecision::RedirectTo(ShowRoute::Session)
        }
        ShowRoute::Proposal => ShowDecision::Display,
    }
}
