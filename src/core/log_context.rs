//! Correlation context attached to structured entries
//!
//! The buffer treats a `LogContext` as opaque: it is carried from the entry
//! builder to the sink untouched. Keys are kept sorted so text output is stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key under which [`LogContext::with_correlation_id`] stores its value
pub const CORRELATION_ID_KEY: &str = "correlation_id";

/// Value type for context fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON output
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
        }
    }

    fn estimated_size(&self) -> usize {
        match self {
            FieldValue::String(s) => s.len() + 2,
            FieldValue::Int(_) | FieldValue::Float(_) => 8,
            FieldValue::Bool(_) => 5,
            FieldValue::Null => 4,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Key-value correlation fields for a single entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogContext {
    fields: BTreeMap<String, FieldValue>,
}

impl LogContext {
    /// Create a new empty log context
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field to the context
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field to the context (mutable version)
    pub fn add_field<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    /// Tag the context with a correlation id
    pub fn with_correlation_id(self, id: impl Into<String>) -> Self {
        self.with_field(CORRELATION_ID_KEY, id.into())
    }

    /// The correlation id, if one was set as a string
    pub fn correlation_id(&self) -> Option<&str> {
        match self.fields.get(CORRELATION_ID_KEY) {
            Some(FieldValue::String(id)) => Some(id),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Get all fields
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Check if context has any fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rough byte size of the fields, used for buffer accounting
    pub fn estimated_size(&self) -> usize {
        self.fields
            .iter()
            .map(|(k, v)| k.len() + 3 + v.estimated_size())
            .sum()
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_creation() {
        let ctx = LogContext::new();
        assert!(ctx.is_empty());
        assert_eq!(ctx.estimated_size(), 0);
    }

    #[test]
    fn test_log_context_with_fields() {
        let ctx = LogContext::new()
            .with_field("user_id", 123)
            .with_field("username", "john_doe")
            .with_field("active", true);

        assert_eq!(ctx.fields().len(), 3);
        assert!(!ctx.is_empty());
        assert!(ctx.estimated_size() > 0);
    }

    #[test]
    fn test_log_context_format_is_sorted() {
        let ctx = LogContext::new()
            .with_field("key2", 42)
            .with_field("key1", "value1");

        assert_eq!(ctx.format_fields(), "key1=value1 key2=42");
    }

    #[test]
    fn test_correlation_id() {
        let ctx = LogContext::new().with_correlation_id("req-7f3a");
        assert_eq!(ctx.correlation_id(), Some("req-7f3a"));

        let ctx = LogContext::new().with_field(CORRELATION_ID_KEY, 7);
        assert_eq!(ctx.correlation_id(), None);
    }

    #[test]
    fn test_context_serializes_as_flat_object() {
        let ctx = LogContext::new()
            .with_field("request_id", "abc")
            .with_field("attempt", 2);

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json, serde_json::json!({"attempt": 2, "request_id": "abc"}));
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert_eq!(FieldValue::Float(f64::NAN).to_json_value(), serde_json::Value::Null);
        assert_eq!(FieldValue::Int(5).to_json_value(), serde_json::json!(5));
    }
}
