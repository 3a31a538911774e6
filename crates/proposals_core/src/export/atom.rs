//! Atom 1.0 feed rendering.

use super::{format_timestamp, ExportResult};
use crate::model::proposal::Proposal;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Feed-level metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomFeed {
    pub id: String,
    pub title: String,
    /// Absolute URL of the HTML listing this feed mirrors.
    pub link: Option<String>,
    /// Epoch milliseconds used when the feed has no entries.
    pub generated_at: i64,
}

/// Renders one entry per proposal; `updated` of the feed is the newest
/// submission.
pub fn to_atom(feed: &AtomFeed, proposals: &[Proposal]) -> ExportResult<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("feed");
    root.push_attribute(("xmlns", ATOM_NS));
    writer.write_event(Event::Start(root))?;

    write_text_element(&mut writer, "id", &feed.id)?;
    write_text_element(&mut writer, "title", &feed.title)?;
    if let Some(link) = feed.link.as_deref() {
        let mut element = BytesStart::new("link");
        element.push_attribute(("rel", "alternate"));
        element.push_attribute(("href", link));
        writer.write_event(Event::Empty(element))?;
    }
    let updated = proposals
        .iter()
        .map(|proposal| proposal.submitted_at)
        .max()
        .unwrap_or(feed.generated_at);
    write_text_element(&mut writer, "updated", &format_timestamp(updated)?)?;

    for proposal in proposals {
        writer.write_event(Event::Start(BytesStart::new("entry")))?;
        write_text_element(&mut writer, "id", &format!("urn:uuid:{}", proposal.id))?;
        write_text_element(&mut writer, "title", &proposal.title)?;
        write_text_element(
            &mut writer,
            "updated",
            &format_timestamp(proposal.submitted_at)?,
        )?;
        writer.write_event(Event::Start(BytesStart::new("author")))?;
        write_text_element(&mut writer, "name", &proposal.presenter)?;
        writer.write_event(Event::End(BytesEnd::new("author")))?;
        if !proposal.excerpt.is_empty() {
            write_text_element(&mut writer, "summary", &proposal.excerpt)?;
        }
        writer.write_event(Event::End(BytesEnd::new("entry")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("feed")))?;
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> ExportResult<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
