//! Core buffer types and traits

pub mod async_buffer;
mod buffered_entry;
pub mod config;
pub mod error;
pub mod flush_strategy;
pub mod log_context;
pub mod log_level;
pub mod metrics;
mod queues;
pub mod sink;
pub mod structured_builder;
pub mod structured_entry;

pub use async_buffer::{AsyncLogBuffer, AsyncLogBufferBuilder, FlushReport};
pub use config::{AsyncConfig, AsyncConfigUpdate, PriorityLevels};
pub use error::{LoggerError, Result};
pub use flush_strategy::FlushStrategy;
pub use log_context::{FieldValue, LogContext, CORRELATION_ID_KEY};
pub use log_level::LogLevel;
pub use metrics::BufferMetrics;
pub use queues::{FAST_FLUSH_THRESHOLD, FAST_QUEUE_CAPACITY};
pub use sink::{sink_fn, AsyncFnSink, FnSink, LogSink, SharedSink};
pub use structured_builder::{default_serializer, StructuredLogBuilder};
pub use structured_entry::{ErrorInfo, StructuredLogEntry};
