use std::collections::BTreeSet;

use base64::{Engine as _, engine::general_purpose};
use serde_json::{Map, Value, json};

use crate::error::BridgeError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeFields(BTreeSet<String>);

impl DecodeFields {
    pub fn parse(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

// One level of nesting only. The field set is read, never consumed.
pub fn decode_base64(record: &mut Map<String, Value>, fields: &DecodeFields) -> Result<(), BridgeError> {
    if fields.is_empty() {
        return Ok(());
    }
    for (key, value) in record.iter_mut() {
        if let Value::Object(nested) = value {
            for (nested_key, nested_value) in nested.iter_mut() {
                if fields.contains(nested_key) {
                    decode_member(nested_key, nested_value)?;
                }
            }
        } else if fields.contains(key) {
            decode_member(key, value)?;
        }
    }
    Ok(())
}

fn decode_member(field: &str, value: &mut Value) -> Result<(), BridgeError> {
    match value {
        Value::String(encoded) => {
            let decoded = decode_text(field, encoded)?;
            *value = json!({ "text": decoded });
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                let encoded = item.get("text").and_then(Value::as_str).ok_or_else(|| {
                    BridgeError::Base64Decode {
                        field: field.to_string(),
                        message: "list entry has no text".to_string(),
                    }
                })?;
                let decoded = decode_text(field, encoded)?;
                *item = json!({ "text": decoded });
            }
        }
        _ => {}
    }
    Ok(())
}

fn decode_text(field: &str, encoded: &str) -> Result<String, BridgeError> {
    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|err| BridgeError::Base64Decode {
            field: field.to_string(),
            message: err.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|err| BridgeError::Base64Decode {
        field: field.to_string(),
        message: err.to_string(),
    })
}
