//! Proposal export renderers.
//!
//! # Responsibility
//! - Render proposal lists as CSV, JSON, XML, Atom and iCalendar.
//! - Project each proposal onto the viewer's `ExportField` set.
//!
//! # Invariants
//! - Record renderers emit only the fields they are handed.
//! - Timestamps are rendered in UTC.

pub mod atom;
pub mod csv;
pub mod ical;
pub mod json;
pub mod xml;

use crate::model::proposal::Proposal;
use crate::policy::fields::ExportField;
use jiff::Timestamp;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use atom::{to_atom, AtomFeed};
pub use csv::to_csv;
pub use ical::{to_icalendar, CalendarOptions};
pub use json::to_json;
pub use xml::to_xml;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug)]
pub enum ExportError {
    Xml(String),
    /// The calendar skeleton could not be parsed back into events.
    Calendar(String),
    Json(serde_json::Error),
    Io(std::io::Error),
    Utf8(std::string::FromUtf8Error),
    InvalidTimestamp(i64),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml(message) => write!(f, "xml export failed: {message}"),
            Self::Calendar(message) => write!(f, "icalendar export failed: {message}"),
            Self::Json(err) => write!(f, "json export failed: {err}"),
            Self::Io(err) => write!(f, "export write failed: {err}"),
            Self::Utf8(err) => write!(f, "export produced invalid utf-8: {err}"),
            Self::InvalidTimestamp(value) => write!(f, "timestamp out of range: {value}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Utf8(err) => Some(err),
            Self::Xml(_) | Self::Calendar(_) | Self::InvalidTimestamp(_) => None,
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<quick_xml::Error> for ExportError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Xml(value.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ExportError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Self::Utf8(value)
    }
}

/// Output format requested by a listing caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Xml,
    Atom,
    ICalendar,
}

impl ExportFormat {
    /// Parses a request format extension such as `csv` or `ics`.
    pub fn from_extension(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "atom" => Some(Self::Atom),
            "ics" | "ical" => Some(Self::ICalendar),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
            Self::Xml => "application/xml; charset=utf-8",
            Self::Atom => "application/atom+xml",
            Self::ICalendar => "text/calendar; charset=utf-8",
        }
    }
}

/// Renders one field of `proposal` as text; `None` means the value is unset.
pub(crate) fn field_value(proposal: &Proposal, field: ExportField) -> ExportResult<Option<String>> {
    let value = match field {
        ExportField::Id => Some(proposal.id.to_string()),
        ExportField::Title => Some(proposal.title.clone()),
        ExportField::Track => proposal.track.as_ref().map(|track| track.title.clone()),
        ExportField::SessionType => proposal
            .session_type
            .as_ref()
            .map(|session_type| session_type.title.clone()),
        ExportField::Presenter => Some(proposal.presenter.clone()),
        ExportField::Excerpt => Some(proposal.excerpt.clone()),
        ExportField::SubmittedAt => Some(format_timestamp(proposal.submitted_at)?),
        ExportField::StartTime => proposal.start_time.map(format_timestamp).transpose()?,
        ExportField::EndTime => proposal.end_time.map(format_timestamp).transpose()?,
        ExportField::Email => {
            let emails = contact_emails(proposal);
            (!emails.is_empty()).then(|| emails.join(", "))
        }
    };
    Ok(value)
}

/// Contact address followed by owner addresses, deduplicated in order.
pub(crate) fn contact_emails(proposal: &Proposal) -> Vec<String> {
    let mut emails: Vec<String> = Vec::new();
    let candidates = proposal
        .email
        .iter()
        .chain(proposal.users.iter().map(|user| &user.email));
    for email in candidates {
        let trimmed = email.trim();
        if trimmed.is_empty() || emails.iter().any(|known| known.eq_ignore_ascii_case(trimmed)) {
            continue;
        }
        emails.push(trimmed.to_string());
    }
    emails
}

/// RFC 3339 UTC rendering of epoch milliseconds.
pub(crate) fn format_timestamp(epoch_ms: i64) -> ExportResult<String> {
    to_timestamp(epoch_ms).map(|ts| ts.to_string())
}

pub(crate) fn to_timestamp(epoch_ms: i64) -> ExportResult<Timestamp> {
    Timestamp::from_millisecond(epoch_ms).map_err(|_| ExportError::InvalidTimestamp(epoch_ms))
}
