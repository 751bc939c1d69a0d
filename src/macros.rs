//! Logging macros for ergonomic log message formatting.
//!
//! Each macro formats its arguments like `format!` and returns the future of
//! [`AsyncLogBuffer::log_message`](crate::core::AsyncLogBuffer::log_message),
//! so the call has to be awaited.
//!
//! # Examples
//!
//! ```
//! use rust_async_logger::core::AsyncLogBuffer;
//! use rust_async_logger::info;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> rust_async_logger::Result<()> {
//! let buffer = AsyncLogBuffer::builder().build()?;
//!
//! // Basic logging
//! info!(buffer, "Server started").await?;
//!
//! // With format arguments
//! let port = 8080;
//! info!(buffer, "Server listening on port {}", port).await?;
//! # buffer.destroy().await;
//! # Ok(())
//! # }
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// # let buffer = AsyncLogBuffer::builder().build()?;
/// use rust_async_logger::log;
/// log!(buffer, LogLevel::Info, "Simple message").await?;
/// log!(buffer, LogLevel::Error, "Error code: {}", 500).await?;
/// # buffer.destroy().await;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! log {
    ($buffer:expr, $level:expr, $($arg:tt)+) => {
        $buffer.log_message($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log!($buffer, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log!($buffer, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log!($buffer, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log!($buffer, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// # let buffer = AsyncLogBuffer::builder().build()?;
/// use rust_async_logger::error;
/// error!(buffer, "Connection failed: {}", "timeout").await?;
/// # buffer.destroy().await;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! error {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log!($buffer, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($buffer:expr, $($arg:tt)+) => {
        $crate::log!($buffer, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::sink::sink_fn;
    use crate::core::{AsyncConfig, AsyncLogBuffer, StructuredLogEntry};
    use crate::LogLevel;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_macros_format_and_log() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let sink = sink_fn("collector", move |entry: &StructuredLogEntry| {
            captured.lock().push((entry.level, entry.message.clone()));
            Ok(())
        });
        let config = AsyncConfig {
            flush_interval_ms: 60_000,
            immediate_flush_level: LogLevel::Fatal,
            ..AsyncConfig::default()
        };
        let buffer = AsyncLogBuffer::with_sink(config, sink).unwrap();

        crate::trace!(buffer, "t{}", 1).await.unwrap();
        crate::debug!(buffer, "d{}", 2).await.unwrap();
        crate::info!(buffer, "i{}", 3).await.unwrap();
        crate::warn!(buffer, "w{}", 4).await.unwrap();
        crate::error!(buffer, "e{}", 5).await.unwrap();
        crate::log!(buffer, LogLevel::Info, "plain").await.unwrap();
        buffer.flush().await.unwrap();

        let seen = seen.lock().clone();
        assert_eq!(
            seen,
            vec![
                (LogLevel::Trace, "t1".to_string()),
                (LogLevel::Debug, "d2".to_string()),
                (LogLevel::Info, "i3".to_string()),
                (LogLevel::Warn, "w4".to_string()),
                (LogLevel::Error, "e5".to_string()),
                (LogLevel::Info, "plain".to_string()),
            ]
        );
        buffer.destroy().await;
    }
}
