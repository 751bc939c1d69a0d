//! Structured log builder for fluent log entry construction
//!
//! Payloads pass through a [`SafeSerializer`] before they are stored on the
//! entry, so whatever a caller attaches reaches the buffer bounded.

use super::async_buffer::AsyncLogBuffer;
use super::error::Result;
use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use super::structured_entry::{ErrorInfo, StructuredLogEntry};
use crate::serializer::{SafeSerializer, Value};
use std::sync::OnceLock;

static DEFAULT_SERIALIZER: OnceLock<SafeSerializer> = OnceLock::new();

/// Serializer used when the builder is not given one
///
/// Uses [`CircularPolicy::Replace`](crate::serializer::CircularPolicy) so that
/// building an entry never fails on cyclic payloads.
pub fn default_serializer() -> &'static SafeSerializer {
    DEFAULT_SERIALIZER.get_or_init(SafeSerializer::lossy)
}

/// Builder for structured log entries
///
/// # Example
///
/// ```
/// use rust_async_logger::core::{LogLevel, StructuredLogBuilder};
/// use rust_async_logger::serializer::Object;
///
/// let entry = StructuredLogBuilder::info()
///     .message("Request processed")
///     .data(Object::new().with("status", 200).with("latency_ms", 42.5))
///     .field("request_id", "req-1")
///     .build()
///     .unwrap();
///
/// assert_eq!(entry.level, LogLevel::Info);
/// assert_eq!(entry.data.unwrap()["status"], 200);
/// ```
pub struct StructuredLogBuilder<'a> {
    level: LogLevel,
    message: String,
    data: Option<Value>,
    serializer: Option<&'a SafeSerializer>,
    error: Option<ErrorInfo>,
    context: LogContext,
}

impl<'a> StructuredLogBuilder<'a> {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            message: String::new(),
            data: None,
            serializer: None,
            error: None,
            context: LogContext::new(),
        }
    }

    pub fn trace() -> Self {
        Self::new(LogLevel::Trace)
    }

    pub fn debug() -> Self {
        Self::new(LogLevel::Debug)
    }

    pub fn info() -> Self {
        Self::new(LogLevel::Info)
    }

    pub fn warn() -> Self {
        Self::new(LogLevel::Warn)
    }

    pub fn error() -> Self {
        Self::new(LogLevel::Error)
    }

    pub fn fatal() -> Self {
        Self::new(LogLevel::Fatal)
    }

    /// Set the log message
    ///
    /// Line breaks and tabs are escaped so one entry can never render as
    /// several lines.
    #[must_use]
    pub fn message(mut self, msg: impl AsRef<str>) -> Self {
        self.message = escape_message(msg.as_ref());
        self
    }

    /// Attach a payload; it is serialized when the entry is built
    #[must_use]
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Attach an already-built JSON payload
    #[must_use]
    pub fn json_data(self, data: serde_json::Value) -> Self {
        self.data(Value::from(data))
    }

    /// Serialize the payload with `serializer` instead of the default one
    #[must_use]
    pub fn serializer(mut self, serializer: &'a SafeSerializer) -> Self {
        self.serializer = Some(serializer);
        self
    }

    #[must_use]
    pub fn with_error<E>(mut self, err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        self.error = Some(ErrorInfo::from_error(err));
        self
    }

    #[must_use]
    pub fn error_info(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// Add a structured field to the entry's context
    #[must_use]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.context.add_field(key, value);
        self
    }

    /// Merge all fields of `context`, later values win
    #[must_use]
    pub fn context(mut self, context: LogContext) -> Self {
        for (key, value) in context.fields() {
            self.context.add_field(key.clone(), value.clone());
        }
        self
    }

    /// Produce the entry
    ///
    /// Fails only when the chosen serializer rejects a cyclic payload.
    pub fn build(self) -> Result<StructuredLogEntry> {
        let mut entry = StructuredLogEntry::new(self.level, self.message)
            .with_context(self.context);

        if let Some(data) = self.data {
            let serializer = self.serializer.unwrap_or_else(|| default_serializer());
            entry = entry.with_data(serializer.serialize(&data)?.value);
        }
        if let Some(error) = self.error {
            entry = entry.with_error(error);
        }
        Ok(entry)
    }

    /// Build the entry and hand it to `buffer`
    pub async fn log_to(self, buffer: &AsyncLogBuffer) -> Result<()> {
        let entry = self.build()?;
        buffer.log(entry).await
    }
}

fn escape_message(msg: &str) -> String {
    if !msg.contains(['\n', '\r', '\t']) {
        return msg.to_string();
    }

    let mut out = String::with_capacity(msg.len() + 8);
    for c in msg.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoggerError;
    use crate::serializer::{Object, SerializerConfig, SharedValue, CIRCULAR_MARKER};
    use serde_json::json;

    fn cyclic_payload() -> Value {
        let node = SharedValue::new(Value::from(Object::new().with("id", 1)));
        node.update(|v| v.insert("parent", node.clone()));
        Value::Shared(node)
    }

    #[test]
    fn test_builder_basic() {
        let entry = StructuredLogBuilder::warn()
            .message("Resource usage high")
            .field("cpu_percent", 85.5)
            .build()
            .unwrap();

        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.message, "Resource usage high");
        assert!(entry.is_simple());
        assert_eq!(
            entry.context.unwrap().get("cpu_percent"),
            Some(&FieldValue::Float(85.5))
        );
    }

    #[test]
    fn test_message_line_breaks_are_escaped() {
        let entry = StructuredLogBuilder::info()
            .message("user=bob\nERROR forged line\r\tend")
            .build()
            .unwrap();

        assert_eq!(entry.message, "user=bob\\nERROR forged line\\r\\tend");
    }

    #[test]
    fn test_data_is_bounded_by_serializer() {
        let serializer = SafeSerializer::new(SerializerConfig {
            max_array_length: 2,
            ..SerializerConfig::default()
        });

        let entry = StructuredLogBuilder::info()
            .message("batch")
            .data(Value::array([1, 2, 3, 4]))
            .serializer(&serializer)
            .build()
            .unwrap();

        assert_eq!(entry.data, Some(json!([1, 2, "[... 2 more items]"])));
        assert!(!entry.is_simple());
    }

    #[test]
    fn test_default_serializer_replaces_cycles() {
        let entry = StructuredLogBuilder::error()
            .message("cyclic")
            .data(cyclic_payload())
            .build()
            .unwrap();

        assert_eq!(entry.data.unwrap()["parent"], json!(CIRCULAR_MARKER));
    }

    #[test]
    fn test_strict_serializer_rejects_cycles() {
        let strict = SafeSerializer::default();
        let err = StructuredLogBuilder::error()
            .data(cyclic_payload())
            .serializer(&strict)
            .build()
            .unwrap_err();

        assert!(matches!(err, LoggerError::CircularReference { .. }));
    }

    #[test]
    fn test_error_and_context_merge() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timeout");
        let ctx = LogContext::new()
            .with_field("request_id", "abc-123")
            .with_field("attempt", 1);

        let entry = StructuredLogBuilder::error()
            .message("call failed")
            .with_error(&io)
            .context(ctx)
            .field("attempt", 2)
            .build()
            .unwrap();

        let error = entry.error.unwrap();
        assert_eq!(error.name, "Error");
        assert_eq!(error.message, "upstream timeout");

        let context = entry.context.unwrap();
        assert_eq!(context.get("attempt"), Some(&FieldValue::Int(2)));
        assert_eq!(context.get("request_id"), Some(&FieldValue::from("abc-123")));
    }

    #[test]
    fn test_json_data_passes_through_serializer() {
        let entry = StructuredLogBuilder::debug()
            .json_data(json!({"nested": {"ok": true}}))
            .build()
            .unwrap();

        assert_eq!(entry.data, Some(json!({"nested": {"ok": true}})));
    }
}
