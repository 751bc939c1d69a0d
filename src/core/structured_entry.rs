//! Structured log entry handed to sinks

use super::log_context::LogContext;
use super::log_level::LogLevel;
use crate::serializer::estimate_json_size;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed per-entry overhead used in size estimates
const ENTRY_OVERHEAD_BYTES: usize = 64;

/// Error captured on an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// Capture a Rust error; the `source()` chain is recorded as the stack
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            name: short_type_name::<E>(),
            message: err.to_string(),
            stack: if chain.is_empty() {
                None
            } else {
                Some(chain.join("\n"))
            },
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    fn estimated_size(&self) -> usize {
        self.name.len() + self.message.len() + self.stack.as_ref().map_or(0, String::len)
    }
}

fn short_type_name<E: ?Sized>() -> String {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Immutable log record
///
/// Built once by [`StructuredLogBuilder`](crate::core::StructuredLogBuilder)
/// or [`StructuredLogEntry::new`]; the buffer only ever hands sinks a shared
/// reference to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredLogEntry {
    pub timestamp: DateTime<Utc>,

    pub level: LogLevel,

    /// Numeric rank of `level` from the default priority table
    pub level_value: u32,

    pub message: String,

    /// Payload, already bounded by the serializer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<LogContext>,
}

impl StructuredLogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            level_value: level.default_priority(),
            message: message.into(),
            data: None,
            error: None,
            context: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// Attach a context; empty contexts are not stored
    #[must_use]
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = if context.is_empty() { None } else { Some(context) };
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Entries without payload or error below the most severe level
    ///
    /// These qualify for the buffer's fast path.
    pub fn is_simple(&self) -> bool {
        self.error.is_none() && self.data.is_none() && !self.level.is_most_severe()
    }

    /// Rough byte size used for buffer memory accounting
    pub fn estimated_size(&self) -> usize {
        ENTRY_OVERHEAD_BYTES
            + self.message.len()
            + self.data.as_ref().map_or(0, estimate_json_size)
            + self.error.as_ref().map_or(0, ErrorInfo::estimated_size)
            + self.context.as_ref().map_or(0, LogContext::estimated_size)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
