//! Export field set per viewer.
//!
//! # Invariants
//! - `email` is the only field gated on administrator status.
//! - `note_to_organizers` has no export field at all.

use crate::model::user::{is_admin, User};

/// One exported column/key of a proposal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportField {
    Id,
    Title,
    Track,
    SessionType,
    Presenter,
    Excerpt,
    SubmittedAt,
    StartTime,
    EndTime,
    Email,
}

impl ExportField {
    /// Record key used by JSON/XML exports.
    pub fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Track => "track",
            Self::SessionType => "session_type",
            Self::Presenter => "presenter",
            Self::Excerpt => "excerpt",
            Self::SubmittedAt => "submitted_at",
            Self::StartTime => "start_time",
            Self::EndTime => "end_time",
            Self::Email => "email",
        }
    }

    /// CSV header label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Title => "Title",
            Self::Track => "Track",
            Self::SessionType => "Session Type",
            Self::Presenter => "Presenter",
            Self::Excerpt => "Excerpt",
            Self::SubmittedAt => "Submitted At",
            Self::StartTime => "Start Time",
            Self::EndTime => "End Time",
            Self::Email => "Emails",
        }
    }
}

const PUBLIC_FIELDS: &[ExportField] = &[
    ExportField::Id,
    ExportField::Title,
    ExportField::Track,
    ExportField::SessionType,
    ExportField::Presenter,
    ExportField::Excerpt,
    ExportField::SubmittedAt,
];

const SCHEDULE_FIELDS: &[ExportField] = &[ExportField::StartTime, ExportField::EndTime];

/// Ordered export fields for `user`.
///
/// `schedule_visible` is decided by the caller (see
/// `visibility::schedule_visible`) so it stays independent of the viewer
/// role here.
pub fn exportable_fields(user: Option<&User>, schedule_visible: bool) -> Vec<ExportField> {
    let mut fields = PUBLIC_FIELDS.to_vec();
    if schedule_visible {
        fields.extend_from_slice(SCHEDULE_FIELDS);
    }
    if is_admin(user) {
        fields.push(ExportField::Email);
    }
    fields
}
