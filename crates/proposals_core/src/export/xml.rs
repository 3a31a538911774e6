//! XML rendering: `<proposals><proposal><title>...</title>...</proposal></proposals>`.

use super::{field_value, ExportResult};
use crate::model::proposal::Proposal;
use crate::policy::fields::ExportField;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

pub fn to_xml(proposals: &[Proposal], fields: &[ExportField]) -> ExportResult<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("proposals");
    root.push_attribute(("type", "array"));
    writer.write_event(Event::Start(root))?;

    for proposal in proposals {
        writer.write_event(Event::Start(BytesStart::new("proposal")))?;
        for field in fields {
            match field_value(proposal, *field)? {
                Some(value) => {
                    writer.write_event(Event::Start(BytesStart::new(field.key())))?;
                    writer.write_event(Event::Text(BytesText::new(&value)))?;
                    writer.write_event(Event::End(BytesEnd::new(field.key())))?;
                }
                None => {
                    let mut empty = BytesStart::new(field.key());
                    empty.push_attribute(("nil", "true"));
                    writer.write_event(Event::Empty(empty))?;
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new("proposal")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("proposals")))?;
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}
