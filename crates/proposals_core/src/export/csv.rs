//! CSV rendering (RFC 4180 quoting, CRLF row terminators).

use super::{field_value, ExportResult};
use crate::model::proposal::Proposal;
use crate::policy::fields::ExportField;

/// Renders a header row of field labels followed by one row per proposal.
pub fn to_csv(proposals: &[Proposal], fields: &[ExportField]) -> ExportResult<String> {
    let mut out = String::new();
    push_row(&mut out, fields.iter().map(|field| field.label().to_string()));

    for proposal in proposals {
        let mut cells = Vec::with_capacity(fields.len());
        for field in fields {
            cells.push(field_value(proposal, *field)?.unwrap_or_default());
        }
        push_row(&mut out, cells.into_iter());
    }

    Ok(out)
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape_cell(&cell));
    }
    out.push_str("\r\n");
}

fn escape_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
