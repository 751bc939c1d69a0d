//! Sink trait for log output destinations

use super::error::Result;
use super::structured_entry::StructuredLogEntry;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Downstream consumer of flushed entries
///
/// The buffer calls `write` once per entry and `flush` once per delivered
/// batch. Errors and panics are both treated as delivery failures and may
/// lead to retries; they never reach the caller of `log()`.
///
/// # Example
///
/// ```no_run
/// use rust_async_logger::core::{LogSink, Result, StructuredLogEntry};
/// use async_trait::async_trait;
///
/// struct StdoutSink;
///
/// #[async_trait]
/// impl LogSink for StdoutSink {
///     async fn write(&self, entry: &StructuredLogEntry) -> Result<()> {
///         println!("{}", entry.to_json()?);
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "stdout"
///     }
/// }
/// ```
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Deliver a single entry
    async fn write(&self, entry: &StructuredLogEntry) -> Result<()>;

    /// Called after each delivered batch
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Get the sink name
    fn name(&self) -> &str;
}

pub type SharedSink = Arc<dyn LogSink>;

/// Sink backed by a synchronous closure
pub struct FnSink<F> {
    name: String,
    f: F,
}

impl<F> FnSink<F>
where
    F: Fn(&StructuredLogEntry) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> LogSink for FnSink<F>
where
    F: Fn(&StructuredLogEntry) -> Result<()> + Send + Sync,
{
    async fn write(&self, entry: &StructuredLogEntry) -> Result<()> {
        (self.f)(entry)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Sink backed by a closure that returns a future
///
/// The closure receives an owned copy of the entry so the future can be
/// `'static`.
pub struct AsyncFnSink<F> {
    name: String,
    f: F,
}

impl<F, Fut> AsyncFnSink<F>
where
    F: Fn(StructuredLogEntry) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> LogSink for AsyncFnSink<F>
where
    F: Fn(StructuredLogEntry) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn write(&self, entry: &StructuredLogEntry) -> Result<()> {
        (self.f)(entry.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a plain closure into a shared sink
pub fn sink_fn<F>(name: impl Into<String>, f: F) -> SharedSink
where
    F: Fn(&StructuredLogEntry) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(FnSink::new(name, f))
}
