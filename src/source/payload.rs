//! Decoding of backend response bodies into [`Item`]s.
//!
//! The backend answers in one of two shapes:
//!
//! * a flat array of item objects, each carrying its own `provider`;
//! * an object keyed by provider, whose values are arrays of item objects
//!   (the `provider` field may then be omitted) or of plain suggestion
//!   strings.
//!
//! For the grouped shape, key order is provider order.  `serde_json` is built
//! with `preserve_order` so that order survives decoding.

use serde_json::{Map, Value};

use super::Item;

/// Decode a response body.  An empty body or `null` decodes to no items.
pub fn decode(body: &[u8]) -> Result<Vec<Item>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_slice(body)?;
    from_value(value)
}

fn from_value(value: Value) -> Result<Vec<Item>, serde_json::Error> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(groups) => from_groups(groups),
        other => serde_json::from_value(other),
    }
}

fn from_groups(groups: Map<String, Value>) -> Result<Vec<Item>, serde_json::Error> {
    let mut items = Vec::new();
    for (provider, entries) in groups {
        let entries: Vec<Value> = serde_json::from_value(entries)?;
        for entry in entries {
            let item = match entry {
                Value::String(text) => Item::suggestion(provider.clone(), text),
                Value::Object(mut fields) => {
                    if !fields.contains_key("provider") && !fields.contains_key("originator") {
                        fields.insert("provider".into(), Value::String(provider.clone()));
                    }
                    serde_json::from_value(Value::Object(fields))?
                }
                other => serde_json::from_value(other)?,
            };
            items.push(item);
        }
    }
    Ok(items)
}
