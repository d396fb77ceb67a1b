use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A typed value inside an otherwise free-form map (event payloads,
/// envelope metadata).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<AttributeValue>),
}

pub type Attributes = BTreeMap<String, AttributeValue>;

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Flattened string form, used by transports that only carry string
    /// attributes.
    pub fn to_attribute_string(&self) -> String {
        match self {
            AttributeValue::Flag(b) => b.to_string(),
            AttributeValue::Integer(i) => i.to_string(),
            AttributeValue::Float(f) => f.to_string(),
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::List(values) => values
                .iter()
                .map(AttributeValue::to_attribute_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Flag(value)
    }
}
