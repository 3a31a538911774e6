//! JSON rendering: `[{"proposal": {...}}, ...]`.

use super::{field_value, ExportResult};
use crate::model::proposal::Proposal;
use crate::policy::fields::ExportField;
use serde_json::{Map, Value};

pub fn to_json(proposals: &[Proposal], fields: &[ExportField]) -> ExportResult<String> {
    let mut records = Vec::with_capacity(proposals.len());
    for proposal in proposals {
        let mut record = Map::new();
        for field in fields {
            let value = field_value(proposal, *field)?.map_or(Value::Null, Value::String);
            record.insert(field.key().to_string(), value);
        }
        let mut wrapper = Map::new();
        wrapper.insert("proposal".to_string(), Value::Object(record));
        records.push(Value::Object(wrapper));
    }
    Ok(serde_json::to_string(&Value::Array(records))?)
}
