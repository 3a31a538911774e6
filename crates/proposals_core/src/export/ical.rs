//! iCalendar (RFC 5545) rendering of scheduled sessions.
//!
//! # Invariants
//! - Only proposals with a `start_time` produce a `VEVENT`.
//! - Free text (titles, excerpts, speaker names) only enters the calendar as
//!   `ValueText`, so escaping and line folding stay with `aimcal_ical`.

use super::{to_timestamp, ExportError, ExportResult};
use crate::model::proposal::Proposal;
use aimcal_ical::{formatter, parse, CalendarComponent, ICalendar, ProductId, VEvent, ValueText};

const PRODID: &str = "-//proposals_core//Session Schedule//EN";
/// Stand-in for free text until the parsed event is filled in.
const TEXT_SLOT: &str = "-";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarOptions {
    /// Base URL; session URLs become `<base>/sessions/<id>`.
    pub base_url: Option<String>,
    /// Epoch milliseconds stamped as `DTSTAMP` on every event.
    pub generated_at: i64,
}

/// Renders a `VCALENDAR` with one `VEVENT` per scheduled proposal.
pub fn to_icalendar(proposals: &[Proposal], options: &CalendarOptions) -> ExportResult<String> {
    let scheduled = proposals
        .iter()
        .filter(|proposal| proposal.start_time.is_some())
        .collect::<Vec<_>>();

    let mut calendar = ICalendar::new();
    calendar.prod_id = ProductId {
        value: ValueText::new(PRODID.to_string()),
        x_parameters: Vec::new(),
        retained_parameters: Vec::new(),
        span: (),
    };
    if !scheduled.is_empty() {
        calendar.components = scheduled_events(&scheduled, options)?;
    }

    let events = calendar
        .components
        .iter_mut()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(event),
            _ => None,
        });
    for (event, proposal) in events.zip(&scheduled) {
        fill_text(event, proposal);
    }

    Ok(formatter::format(&calendar)?)
}

/// `"<speakers>: <excerpt>"`, or just the excerpt when nobody owns it.
pub fn session_description(proposal: &Proposal) -> String {
    if proposal.users.is_empty() {
        proposal.excerpt.clone()
    } else {
        format!("{}: {}", proposal.speaker_names(), proposal.excerpt)
    }
}

/// Parses one event per proposal carrying the identifiers, times and URL.
fn scheduled_events(
    scheduled: &[&Proposal],
    options: &CalendarOptions,
) -> ExportResult<Vec<CalendarComponent<String>>> {
    let dtstamp = format_utc(options.generated_at)?;
    let base = options
        .base_url
        .as_deref()
        .map(|base| base.trim_end_matches('/'));

    let mut source = format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:{PRODID}\r\n");
    for proposal in scheduled {
        let Some(start) = proposal.start_time else {
            continue;
        };
        source.push_str(&format!(
            "BEGIN:VEVENT\r\nUID:{}\r\nDTSTAMP:{dtstamp}\r\nDTSTART:{}\r\n",
            proposal.id,
            format_utc(start)?
        ));
        if let Some(end) = proposal.end_time {
            source.push_str(&format!("DTEND:{}\r\n", format_utc(end)?));
        }
        source.push_str(&format!("SUMMARY:{TEXT_SLOT}\r\nDESCRIPTION:{TEXT_SLOT}\r\n"));
        if let Some(base) = base {
            source.push_str(&format!("URL:{base}/sessions/{}\r\n", proposal.id));
        }
        source.push_str("END:VEVENT\r\n");
    }
    source.push_str("END:VCALENDAR\r\n");

    let parsed = parse(&source).map_err(|errors| ExportError::Calendar(format!("{errors:?}")))?;
    let skeleton = parsed
        .first()
        .ok_or_else(|| ExportError::Calendar("no calendar in event skeleton".to_string()))?;
    Ok(skeleton.to_owned().components)
}

fn fill_text(event: &mut VEvent<String>, proposal: &Proposal) {
    if let Some(summary) = event.summary.as_mut() {
        summary.content = ValueText::new(proposal.title.clone());
    }
    if let Some(description) = event.description.as_mut() {
        description.content = ValueText::new(session_description(proposal));
    }
}

fn format_utc(epoch_ms: i64) -> ExportResult<String> {
    Ok(to_timestamp(epoch_ms)?.strftime("%Y%m%dT%H%M%SZ").to_string())
}
