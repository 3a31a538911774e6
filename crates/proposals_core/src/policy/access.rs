//! Authorization rules for proposal mutations.
//!
//! # Invariants
//! - Administrators pass every ownership check.
//! - Anonymous viewers (`None`) never pass an ownership check.
//! - Closed-event state is not consulted for owner edits.

use crate::model::event::Event;
use crate::model::proposal::{Proposal, ProposalStatus};
use crate::model::user::User;

/// Whether `user` may edit the proposal.
pub fn can_edit(user: Option<&User>, proposal: &Proposal) -> bool {
    match user {
        Some(user) => user.admin || proposal.is_owned_by(user.id),
        None => false,
    }
}

/// Whether `user` may delete the proposal.
pub fn can_delete(user: Option<&User>, proposal: &Proposal) -> bool {
    can_edit(user, proposal)
}

/// Whether `user` may apply review transitions (accept/reject/junk).
pub fn can_change_status(user: Option<&User>) -> bool {
    user.is_some_and(|user| user.admin)
}

/// Whether `user` may confirm or decline the proposal as its speaker.
///
/// Ownership is required even for administrators.
pub fn can_confirm_or_decline(user: Option<&User>, proposal: &Proposal) -> bool {
    user.is_some_and(|user| proposal.is_owned_by(user.id))
        && proposal.status == ProposalStatus::Accepted
}

/// Whether `user` may change the title of proposals in `event`.
pub fn can_edit_title(user: Option<&User>, event: &Event) -> bool {
    !event.policy.proposal_titles_locked || user.is_some_and(|user| user.admin)
}

/// Whether the acceptance notice should be shown to `user`.
pub fn notify_acceptance(user: Option<&User>, proposal: &Proposal, event: &Event) -> bool {
    event.policy.show_proposal_confirmation_controls && can_confirm_or_decline(user, proposal)
}
