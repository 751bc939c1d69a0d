//! Error types for the async logger

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// `log()` or `flush()` called after `destroy()`
    #[error("Log buffer has been destroyed")]
    BufferDestroyed,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Sink failed to accept an entry
    #[error("Sink '{sink}' failed: {message}")]
    Sink { sink: String, message: String },

    /// A shared value re-appeared on its own ancestor chain
    #[error("Circular reference detected at depth {depth}")]
    CircularReference { depth: usize },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a sink delivery error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Sink {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error reports use of a destroyed buffer
    pub fn is_destroyed(&self) -> bool {
        matches!(self, LoggerError::BufferDestroyed)
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extraction() {
        let payload = std::panic::catch_unwind(|| panic!("getter exploded")).unwrap_err();
        assert_eq!(panic_message(&*payload), "getter exploded");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(&*payload), "Unknown panic");
    }

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("AsyncConfig", "batch_size must be greater than zero");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::sink("console", "stdout closed");
        assert!(matches!(err, LoggerError::Sink { .. }));

        assert!(LoggerError::BufferDestroyed.is_destroyed());
        assert!(!LoggerError::other("x").is_destroyed());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::config("AsyncConfig", "flush_interval must be non-zero");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for AsyncConfig: flush_interval must be non-zero"
        );

        let err = LoggerError::sink("json_lines", "disk full");
        assert_eq!(err.to_string(), "Sink 'json_lines' failed: disk full");

        let err = LoggerError::CircularReference { depth: 3 };
        assert_eq!(err.to_string(), "Circular reference detected at depth 3");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: LoggerError = io_err.into();

        assert!(matches!(err, LoggerError::IoError(_)));
        assert!(err.to_string().contains("access denied"));
    }
}
