//! Buffer configuration
//!
//! Durations are stored as milliseconds so that configurations round-trip
//! through JSON unchanged.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Numeric priority per level; higher values are more urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityLevels {
    pub trace: u32,
    pub debug: u32,
    pub info: u32,
    pub warn: u32,
    pub error: u32,
    pub fatal: u32,
}

impl Default for PriorityLevels {
    fn default() -> Self {
        Self {
            trace: LogLevel::Trace.default_priority(),
            debug: LogLevel::Debug.default_priority(),
            info: LogLevel::Info.default_priority(),
            warn: LogLevel::Warn.default_priority(),
            error: LogLevel::Error.default_priority(),
            fatal: LogLevel::Fatal.default_priority(),
        }
    }
}

impl PriorityLevels {
    pub fn priority(&self, level: LogLevel) -> u32 {
        match level {
            LogLevel::Trace => self.trace,
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
            LogLevel::Fatal => self.fatal,
        }
    }
}

/// Configuration of an [`AsyncLogBuffer`](crate::core::AsyncLogBuffer)
///
/// # Example
///
/// ```
/// use rust_async_logger::core::AsyncConfig;
///
/// let config = AsyncConfig {
///     max_buffer_size: 500,
///     flush_interval_ms: 250,
///     ..AsyncConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncConfig {
    /// Soft size; sync fallback engages above 90% of it
    pub buffer_size: usize,
    /// Hard bound on the main queue
    pub max_buffer_size: usize,
    pub flush_interval_ms: u64,
    pub batch_size: usize,
    /// Destroy the buffer when a registered shutdown signal fires
    pub sync_on_exit: bool,
    pub enable_backpressure: bool,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub priority_levels: PriorityLevels,
    /// Write straight to the sink when the buffer is under memory pressure
    pub sync_fallback: bool,
    /// Buffered bytes above which sync fallback engages
    pub sync_threshold: usize,
    /// Entries at or above this level's priority trigger a flush
    pub immediate_flush_level: LogLevel,
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            max_buffer_size: 10_000,
            flush_interval_ms: 1000,
            batch_size: 100,
            sync_on_exit: true,
            enable_backpressure: true,
            max_retries: 3,
            retry_delay_ms: 1000,
            priority_levels: PriorityLevels::default(),
            sync_fallback: true,
            sync_threshold: 50 * 1024 * 1024, // 50 MB
            immediate_flush_level: LogLevel::Error,
        }
    }
}

impl AsyncConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn priority(&self, level: LogLevel) -> u32 {
        self.priority_levels.priority(level)
    }

    /// Priority at or above which an entry triggers an out-of-band flush
    pub fn immediate_threshold(&self) -> u32 {
        self.priority(self.immediate_flush_level)
    }

    /// Main-queue length above which sync fallback engages
    pub(crate) fn sync_queue_threshold(&self) -> usize {
        self.buffer_size.saturating_mul(9) / 10
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(LoggerError::config("AsyncConfig", "buffer_size must be greater than zero"));
        }
        if self.max_buffer_size == 0 {
            return Err(LoggerError::config(
                "AsyncConfig",
                "max_buffer_size must be greater than zero",
            ));
        }
        if self.batch_size == 0 {
            return Err(LoggerError::config("AsyncConfig", "batch_size must be greater than zero"));
        }
        if self.flush_interval_ms == 0 {
            return Err(LoggerError::config("AsyncConfig", "flush_interval must be non-zero"));
        }
        Ok(())
    }
}

/// Partial update applied by [`AsyncLogBuffer::update_config`](crate::core::AsyncLogBuffer::update_config)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncConfigUpdate {
    pub buffer_size: Option<usize>,
    pub max_buffer_size: Option<usize>,
    pub flush_interval_ms: Option<u64>,
    pub batch_size: Option<usize>,
    pub sync_on_exit: Option<bool>,
    pub enable_backpressure: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub priority_levels: Option<PriorityLevels>,
    pub sync_fallback: Option<bool>,
    pub sync_threshold: Option<usize>,
    pub immediate_flush_level: Option<LogLevel>,
}

impl AsyncConfigUpdate {
    #[must_use]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Merge into `base`, returning the new configuration
    pub fn apply_to(&self, base: &AsyncConfig) -> AsyncConfig {
        AsyncConfig {
            buffer_size: self.buffer_size.unwrap_or(base.buffer_size),
            max_buffer_size: self.max_buffer_size.unwrap_or(base.max_buffer_size),
            flush_interval_ms: self.flush_interval_ms.unwrap_or(base.flush_interval_ms),
            batch_size: self.batch_size.unwrap_or(base.batch_size),
            sync_on_exit: self.sync_on_exit.unwrap_or(base.sync_on_exit),
            enable_backpressure: self.enable_backpressure.unwrap_or(base.enable_backpressure),
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            retry_delay_ms: self.retry_delay_ms.unwrap_or(base.retry_delay_ms),
            priority_levels: self.priority_levels.unwrap_or(base.priority_levels),
            sync_fallback: self.sync_fallback.unwrap_or(base.sync_fallback),
            sync_threshold: self.sync_threshold.unwrap_or(base.sync_threshold),
            immediate_flush_level: self
                .immediate_flush_level
                .unwrap_or(base.immediate_flush_level),
        }
    }
}
