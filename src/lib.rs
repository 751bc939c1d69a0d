//! # Rust Async Logger
//!
//! An asynchronous, bounded log buffer paired with a safe serializer.
//!
//! ## Features
//!
//! - **Bounded Memory**: priority-ordered main queue, fast path for simple
//!   entries, backpressure and synchronous fallback under pressure
//! - **Reliable Delivery**: batched flushes with retries and single-flight
//!   coordination
//! - **Safe Serialization**: depth, length and cycle bounds for arbitrary
//!   payloads, never panicking on hostile input
//! - **Observable**: metrics snapshots for buffer health

pub mod core;
pub mod macros;
pub mod serializer;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        AsyncConfig, AsyncConfigUpdate, AsyncLogBuffer, BufferMetrics, ErrorInfo, FieldValue,
        FlushReport, FlushStrategy, LogContext, LogLevel, LogSink, LoggerError, PriorityLevels,
        Result, StructuredLogBuilder, StructuredLogEntry,
    };
    pub use crate::serializer::{
        CircularPolicy, ErrorValue, Object, SafeSerializer, SerializerConfig, SharedValue, Value,
    };
    pub use crate::sinks::{ConsoleSink, JsonLinesSink};
}

pub use crate::core::{
    AsyncConfig, AsyncConfigUpdate, AsyncLogBuffer, BufferMetrics, ErrorInfo, FieldValue,
    FlushReport, FlushStrategy, LogContext, LogLevel, LogSink, LoggerError, PriorityLevels,
    Result, StructuredLogBuilder, StructuredLogEntry,
};
pub use crate::serializer::{SafeSerializer, SerializerConfig, Value};
pub use crate::sinks::{ConsoleSink, JsonLinesSink};
