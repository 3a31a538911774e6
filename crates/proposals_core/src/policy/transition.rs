//! Proposal status transitions.
//!
//! # Invariants
//! - A status changes only when `(from, event)` is listed in `TRANSITIONS`.
//! - A rejected transition leaves the proposal untouched.

use crate::model::proposal::{Proposal, ProposalStatus};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Named review/confirmation event applied to a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionEvent {
    Accept,
    Reject,
    MarkAsJunk,
    Confirm,
    Decline,
}

impl TransitionEvent {
    /// Stable event name as used by forms and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::MarkAsJunk => "mark_as_junk",
            Self::Confirm => "confirm",
            Self::Decline => "decline",
        }
    }

    /// Accept, reject and junk; confirm/decline belong to the speaker.
    pub fn is_review(self) -> bool {
        matches!(self, Self::Accept | Self::Reject | Self::MarkAsJunk)
    }
}

impl Display for TransitionEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionEvent {
    type Err = UnknownTransitionEvent;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            "mark_as_junk" => Ok(Self::MarkAsJunk),
            "confirm" => Ok(Self::Confirm),
            "decline" => Ok(Self::Decline),
            other => Err(UnknownTransitionEvent(other.to_string())),
        }
    }
}

/// Event name that is not part of the transition vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTransitionEvent(pub String);

impl Display for UnknownTransitionEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown transition event `{}`", self.0)
    }
}

impl Error for UnknownTransitionEvent {}

/// Requested event is not allowed from the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransitionError {
    pub from: ProposalStatus,
    pub event: TransitionEvent,
}

impl Display for InvalidTransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "event `{}` cannot transition from state `{}`",
            self.event, self.from
        )
    }
}

impl Error for InvalidTransitionError {}

/// `(from, event, to)` rows; anything absent is illegal.
const TRANSITIONS: &[(ProposalStatus, TransitionEvent, ProposalStatus)] = &[
    (
        ProposalStatus::Proposed,
        TransitionEvent::Accept,
        ProposalStatus::Accepted,
    ),
    (
        ProposalStatus::Proposed,
        TransitionEvent::Reject,
        ProposalStatus::Rejected,
    ),
    (
        ProposalStatus::Proposed,
        TransitionEvent::MarkAsJunk,
        ProposalStatus::Junk,
    ),
    (
        ProposalStatus::Accepted,
        TransitionEvent::Confirm,
        ProposalStatus::Confirmed,
    ),
    (
        ProposalStatus::Accepted,
        TransitionEvent::Decline,
        ProposalStatus::Declined,
    ),
];

/// Returns the target status for `(from, event)`, if the pair is allowed.
pub fn next_status(from: ProposalStatus, event: TransitionEvent) -> Option<ProposalStatus> {
    TRANSITIONS
        .iter()
        .find(|(row_from, row_event, _)| *row_from == from && *row_event == event)
        .map(|(_, _, to)| *to)
}

/// Events that may currently be applied from `from`.
pub fn allowed_events(from: ProposalStatus) -> Vec<TransitionEvent> {
    TRANSITIONS
        .iter()
        .filter(|(row_from, _, _)| *row_from == from)
        .map(|(_, event, _)| *event)
        .collect()
}

/// Applies `event` to the proposal status.
///
/// # Errors
/// - Returns `InvalidTransitionError` when the pair is not in the table; the
///   proposal is left unchanged.
pub fn attempt_transition(
    proposal: &mut Proposal,
    event: TransitionEvent,
) -> Result<ProposalStatus, InvalidTransitionError> {
    let from = proposal.status;
    let Some(to) = next_status(from, event) else {
        warn!(
            "event=proposal_transition module=policy status=rejected proposal_id={} from={} transition={}",
            proposal.id, from, event
        );
        return Err(InvalidTransitionError { from, event });
    };

    proposal.status = to;
    debug!(
        "event=proposal_transition module=policy status=ok proposal_id={} from={} to={}",
        proposal.id, from, to
    );
    Ok(to)
}

impl Proposal {
    pub fn accept(&mut self) -> Result<ProposalStatus, InvalidTransitionError> {
        attempt_transition(self, TransitionEvent::Accept)
    }

    pub fn reject(&mut self) -> Result<ProposalStatus, InvalidTransitionError> {
        attempt_transition(self, TransitionEvent::Reject)
    }

    pub fn mark_as_junk(&mut self) -> Result<ProposalStatus, InvalidTransitionError> {
        attempt_transition(self, TransitionEvent::MarkAsJunk)
    }

    pub fn confirm(&mut self) -> Result<ProposalStatus, InvalidTransitionError> {
        attempt_transition(self, TransitionEvent::Confirm)
    }

    pub fn decline(&mut self) -> Result<ProposalStatus, InvalidTransitionError> {
        attempt_transition(self, TransitionEvent::Decline)
    }
}

#[cfg(test)]
mod tests {
    use super::{allowed_events, attempt_transition, next_status, TransitionEvent};
    use crate::model::proposal::{Proposal, ProposalStatus};
    use uuid::Uuid;

    const ALL_STATUSES: [ProposalStatus; 6] = [
        ProposalStatus::Proposed,
        ProposalStatus::Accepted,
        ProposalStatus::Rejected,
        ProposalStatus::Junk,
        ProposalStatus::Confirmed,
        ProposalStatus::Declined,
    ];

    const ALL_EVENTS: [TransitionEvent; 5] = [
        TransitionEvent::Accept,
        TransitionEvent::Reject,
        TransitionEvent::MarkAsJunk,
        TransitionEvent::Confirm,
        TransitionEvent::Decline,
    ];

    fn proposal_in(status: ProposalStatus) -> Proposal {
        let mut proposal = Proposal::new(Uuid::new_v4(), "Widgets", "Quentin", 0);
        proposal.status = status;
        proposal
    }

    #[test]
    fn illegal_pairs_fail_and_leave_status_unchanged() {
        let mut illegal = 0;
        for status in ALL_STATUSES {
            for event in ALL_EVENTS {
                if next_status(status, event).is_some() {
                    continue;
                }
                illegal += 1;
                let mut proposal = proposal_in(status);
                let err = attempt_transition(&mut proposal, event).unwrap_err();
                assert_eq!(err.from, status);
                assert_eq!(err.event, event);
                assert_eq!(proposal.status, status);
            }
        }
        assert_eq!(illegal, 6 * 5 - 5);
    }

    #[test]
    fn accept_then_confirm_or_decline() {
        let mut confirmed = proposal_in(ProposalStatus::Proposed);
        confirmed.accept().unwrap();
        assert_eq!(confirmed.confirm().unwrap(), ProposalStatus::Confirmed);

        let mut declined = proposal_in(ProposalStatus::Proposed);
        declined.accept().unwrap();
        assert_eq!(declined.decline().unwrap(), ProposalStatus::Declined);
    }

    #[test]
    fn confirm_requires_prior_acceptance() {
        let mut proposal = proposal_in(ProposalStatus::Proposed);
        assert!(proposal.confirm().is_err());
        assert!(proposal.decline().is_err());
        assert_eq!(proposal.status, ProposalStatus::Proposed);
    }

    #[test]
    fn terminal_statuses_allow_no_events() {
        for status in ALL_STATUSES.into_iter().filter(|s| s.is_terminal()) {
            assert!(allowed_events(status).is_empty(), "{status} should be terminal");
        }
    }

    #[test]
    fn event_names_parse() {
        for event in ALL_EVENTS {
            assert_eq!(event.as_str().parse::<TransitionEvent>(), Ok(event));
        }
        assert!("destroy".parse::<TransitionEvent>().is_err());
    }

    #[test]
    fn speaker_events_are_not_review_events() {
        assert_eq!(
            allowed_events(ProposalStatus::Proposed)
                .into_iter()
                .filter(|event| event.is_review())
                .count(),
            3
        );
        assert!(!TransitionEvent::Confirm.is_review());
        assert!(!TransitionEvent::Decline.is_review());
    }
}
