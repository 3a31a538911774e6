//! Proposal list ordering.
//!
//! # Invariants
//! - Only whitelisted keys are honored; anything else falls back to
//!   `submitted_at` ascending without error.
//! - Text keys compare case-insensitively; ties break on `submitted_at`, then id.

use crate::model::proposal::Proposal;
use log::debug;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Title,
    Track,
    SessionType,
    Presenter,
    Status,
    #[default]
    SubmittedAt,
    StartTime,
}

impl SortKey {
    /// Parses a whitelisted key; `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "title" => Some(Self::Title),
            "track" => Some(Self::Track),
            "session_type" => Some(Self::SessionType),
            "presenter" => Some(Self::Presenter),
            "status" => Some(Self::Status),
            "submitted_at" => Some(Self::SubmittedAt),
            "start_time" => Some(Self::StartTime),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Requested ordering for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProposalSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl ProposalSort {
    /// Builds a sort from raw `sort`/`dir` request values.
    ///
    /// A key outside the whitelist yields the default (`submitted_at` asc)
    /// regardless of `dir`.
    pub fn from_params(sort: Option<&str>, dir: Option<&str>) -> Self {
        let Some(raw) = sort else {
            return Self::default();
        };
        let Some(key) = SortKey::parse(raw) else {
            debug!("event=proposal_sort module=listing status=fallback requested={raw}");
            return Self::default();
        };
        let direction = match dir.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        Self { key, direction }
    }

    /// Falls back to the default order when start times are hidden.
    pub fn visible_with(self, schedule_visible: bool) -> Self {
        if self.key == SortKey::StartTime && !schedule_visible {
            Self::default()
        } else {
            self
        }
    }
}

/// Sorts proposals in place.
pub fn sort_proposals(proposals: &mut [Proposal], sort: ProposalSort) {
    proposals.sort_by(|a, b| {
        let primary = compare_by_key(a, b, sort.key);
        let primary = match sort.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn compare_by_key(a: &Proposal, b: &Proposal, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => compare_text(&a.title, &b.title),
        SortKey::Presenter => compare_text(&a.presenter, &b.presenter),
        SortKey::Track => compare_text(
            a.track.as_ref().map_or("", |track| track.title.as_str()),
            b.track.as_ref().map_or("", |track| track.title.as_str()),
        ),
        SortKey::SessionType => compare_text(
            a.session_type.as_ref().map_or("", |st| st.title.as_str()),
            b.session_type.as_ref().map_or("", |st| st.title.as_str()),
        ),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        SortKey::SubmittedAt => a.submitted_at.cmp(&b.submitted_at),
        // Unscheduled proposals sort last.
        SortKey::StartTime => match (a.start_time, b.start_time) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
