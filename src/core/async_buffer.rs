//! Asynchronous log buffer
//!
//! Entries are admitted on one of three paths: written straight to the sink
//! (sync fallback), parked in a pre-sized slot vector (fast path) or inserted
//! into the priority-ordered main queue. A single worker task owns every
//! timer-originated mutation: periodic flushes, retry landings and interval
//! changes. Flushes themselves run on their own task and are single-flight.

use super::buffered_entry::BufferedEntry;
use super::config::{AsyncConfig, AsyncConfigUpdate};
use super::error::{panic_message, LoggerError, Result};
use super::flush_strategy::{FlushInputs, FlushStrategy};
use super::log_level::LogLevel;
use super::metrics::BufferMetrics;
use super::queues::{FastQueue, MainQueue};
use super::sink::{LogSink, SharedSink};
use super::structured_builder::StructuredLogBuilder;
use super::structured_entry::StructuredLogEntry;
use crate::sinks::ConsoleSink;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Outcome of one flush cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Entries the sink accepted
    pub delivered: usize,
    /// Failed delivery attempts, including ones that will be retried
    pub failed: usize,
    /// Entries discarded after their last attempt
    pub dropped: usize,
    pub duration: Duration,
}

type FlushFuture = Shared<BoxFuture<'static, FlushReport>>;

struct InFlightFlush {
    generation: u64,
    future: FlushFuture,
}

/// Messages handled by the worker loop
#[derive(Debug)]
enum Control {
    /// A parked entry's retry delay elapsed
    Retry(u64),
    /// The flush interval changed
    Reconfigure(Duration),
}

#[derive(Default)]
struct BufferState {
    main: MainQueue,
    fast: FastQueue,
    metrics: BufferMetrics,
    /// Entries waiting for their retry delay, by sequence number
    retry_pending: HashMap<u64, BufferedEntry>,
}

struct Inner {
    config: RwLock<Arc<AsyncConfig>>,
    state: Mutex<BufferState>,
    sink: SharedSink,
    /// Runtime every internal task is spawned on
    runtime: Handle,
    in_flight: Mutex<Option<InFlightFlush>>,
    control_tx: mpsc::UnboundedSender<Control>,
    sync_mode: AtomicBool,
    destroyed: AtomicBool,
    next_seq: AtomicU64,
    flush_generation: AtomicU64,
    /// Stops the worker loop and every retry timer
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown: OnceCell<FlushReport>,
}

/// Bounded, asynchronously flushed log buffer
///
/// Cloning is cheap and every clone refers to the same buffer.
///
/// # Example
///
/// ```
/// use rust_async_logger::core::{AsyncConfig, AsyncLogBuffer, StructuredLogEntry};
/// use rust_async_logger::core::sink::sink_fn;
/// use rust_async_logger::LogLevel;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> rust_async_logger::Result<()> {
/// let sink = sink_fn("stdout", |entry: &StructuredLogEntry| {
///     println!("{}", entry.message);
///     Ok(())
/// });
/// let buffer = AsyncLogBuffer::with_sink(AsyncConfig::default(), sink)?;
///
/// buffer.info("service started").await?;
/// buffer.log_message(LogLevel::Warn, "cache cold").await?;
///
/// let report = buffer.flush().await?;
/// assert_eq!(report.delivered, 2);
///
/// buffer.destroy().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AsyncLogBuffer {
    inner: Arc<Inner>,
}

impl AsyncLogBuffer {
    /// Create a buffer that writes to the console
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: AsyncConfig) -> Result<Self> {
        Self::with_sink(config, Arc::new(ConsoleSink::new()))
    }

    /// Create a buffer delivering to `sink`
    ///
    /// Must be called inside a Tokio runtime. The buffer keeps a handle to it,
    /// so later calls may come from any thread.
    pub fn with_sink(config: AsyncConfig, sink: SharedSink) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| {
            LoggerError::config("AsyncLogBuffer", "must be created inside a Tokio runtime")
        })?;

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let period = config.flush_interval();
        let inner = Arc::new(Inner {
            config: RwLock::new(Arc::new(config)),
            state: Mutex::new(BufferState::default()),
            sink,
            runtime: runtime.clone(),
            in_flight: Mutex::new(None),
            control_tx,
            sync_mode: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            next_seq: AtomicU64::new(0),
            flush_generation: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            worker: Mutex::new(None),
            shutdown: OnceCell::new(),
        });

        let worker = Worker {
            inner: Arc::downgrade(&inner),
            control_rx,
            cancel: inner.cancel.clone(),
            ticker: flush_ticker(period),
        };
        *inner.worker.lock() = Some(runtime.spawn(worker.run()));

        Ok(Self { inner })
    }

    pub fn builder() -> AsyncLogBufferBuilder {
        AsyncLogBufferBuilder::new()
    }

    /// Admit an entry
    ///
    /// Capacity problems never surface here; they show up in the metrics.
    /// Fails only after [`destroy`](Self::destroy).
    pub async fn log(&self, entry: StructuredLogEntry) -> Result<()> {
        if self.is_destroyed() {
            return Err(LoggerError::BufferDestroyed);
        }

        let inner = &self.inner;
        let config = inner.config();
        let entry = Arc::new(entry);

        if inner.should_write_sync(&config) {
            inner.write_sync(&entry).await;
            return Ok(());
        }

        let priority = config.priority(entry.level);
        let urgent = priority >= config.immediate_threshold();

        if entry.is_simple() {
            let mut state = inner.state.lock();
            // destroy drains under this lock; nothing may land after it
            if self.is_destroyed() {
                return Err(LoggerError::BufferDestroyed);
            }
            if state.fast.has_room() {
                state.metrics.record_admitted(entry.estimated_size());
                state.fast.push(entry);
                let needs_flush = state.fast.needs_flush();
                drop(state);

                if needs_flush || urgent {
                    let _ = inner.start_flush();
                }
                return Ok(());
            }
        }

        let seq = inner.next_seq();
        inner.admit(BufferedEntry::new(seq, entry, priority), &config).await?;
        if urgent {
            let _ = inner.start_flush();
        }
        Ok(())
    }

    /// Log a plain message at `level`
    pub async fn log_message(&self, level: LogLevel, message: impl AsRef<str>) -> Result<()> {
        let entry = StructuredLogBuilder::new(level).message(message).build()?;
        self.log(entry).await
    }

    pub async fn trace(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_message(LogLevel::Trace, message).await
    }

    pub async fn debug(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_message(LogLevel::Debug, message).await
    }

    pub async fn info(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_message(LogLevel::Info, message).await
    }

    pub async fn warn(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_message(LogLevel::Warn, message).await
    }

    pub async fn error(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_message(LogLevel::Error, message).await
    }

    pub async fn fatal(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_message(LogLevel::Fatal, message).await
    }

    /// Drain both queues to the sink
    ///
    /// Concurrent callers share one flush. The flush runs on its own task, so
    /// dropping the returned future does not cancel it.
    pub async fn flush(&self) -> Result<FlushReport> {
        if self.is_destroyed() {
            return Err(LoggerError::BufferDestroyed);
        }
        Ok(self.inner.start_flush().await)
    }

    /// Start a flush if `strategy` calls for one; does not wait for it
    ///
    /// Returns whether a flush was started or joined.
    pub fn trigger_flush(&self, strategy: FlushStrategy) -> bool {
        !self.is_destroyed() && self.inner.request_flush(strategy)
    }

    /// Flush everything and stop all timers
    ///
    /// Idempotent: later and concurrent callers get the same report.
    /// Afterwards [`log`](Self::log) fails with [`LoggerError::BufferDestroyed`].
    pub async fn destroy(&self) -> FlushReport {
        let inner = Arc::clone(&self.inner);
        *self
            .inner
            .shutdown
            .get_or_init(|| async move {
                let runtime = inner.runtime.clone();
                runtime
                    .spawn(inner.shutdown_now())
                    .await
                    .unwrap_or_default()
            })
            .await
    }

    /// Destroy the buffer once `signal` resolves, if `sync_on_exit` is set
    ///
    /// The buffer is only weakly referenced while waiting, and the hook ends
    /// as soon as the buffer is destroyed by any other means.
    pub fn shutdown_on<S>(&self, signal: S) -> JoinHandle<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let weak = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.clone();
        self.inner.runtime.spawn(async move {
            tokio::select! {
                // buffer already destroyed or dropped
                _ = cancel.cancelled() => return,
                _ = signal => {}
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.config().sync_on_exit {
                let report = AsyncLogBuffer { inner }.destroy().await;
                debug!(
                    delivered = report.delivered,
                    dropped = report.dropped,
                    "log buffer destroyed on shutdown signal"
                );
            }
        })
    }

    /// [`shutdown_on`](Self::shutdown_on) wired to Ctrl-C
    pub fn shutdown_on_ctrl_c(&self) -> JoinHandle<()> {
        self.shutdown_on(async {
            if tokio::signal::ctrl_c().await.is_err() {
                // no signal handler available, never fire
                std::future::pending::<()>().await;
            }
        })
    }

    /// Merge `update` into the current configuration
    ///
    /// A changed flush interval restarts the periodic timer.
    pub fn update_config(&self, update: AsyncConfigUpdate) -> Result<()> {
        if self.is_destroyed() {
            return Err(LoggerError::BufferDestroyed);
        }

        let mut current = self.inner.config.write();
        let next = update.apply_to(&current);
        next.validate()?;
        let interval_changed = next.flush_interval_ms != current.flush_interval_ms;
        let period = next.flush_interval();
        *current = Arc::new(next);
        drop(current);

        if interval_changed {
            let _ = self.inner.control_tx.send(Control::Reconfigure(period));
        }
        Ok(())
    }

    pub fn config(&self) -> Arc<AsyncConfig> {
        self.inner.config()
    }

    pub fn get_metrics(&self) -> BufferMetrics {
        let max_buffer_size = self.inner.config().max_buffer_size;
        let state = self.inner.state.lock();
        let mut metrics = state.metrics.clone();
        metrics.main_queue_length = state.main.len();
        metrics.fast_queue_length = state.fast.len();
        metrics.pending_retries = state.retry_pending.len();
        metrics.buffer_utilization = state.main.len() as f64 / max_buffer_size as f64;
        metrics
    }

    /// Deliver every entry directly, bypassing both queues
    pub fn enable_sync_mode(&self) {
        self.inner.sync_mode.store(true, Ordering::Release);
    }

    pub fn disable_sync_mode(&self) {
        self.inner.sync_mode.store(false, Ordering::Release);
    }

    pub fn is_sync_mode(&self) -> bool {
        self.inner.sync_mode.load(Ordering::Acquire)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    pub fn sink_name(&self) -> &str {
        self.inner.sink.name()
    }
}

impl std::fmt::Debug for AsyncLogBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLogBuffer")
            .field("sink", &self.inner.sink.name())
            .field("sync_mode", &self.is_sync_mode())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl Inner {
    fn config(&self) -> Arc<AsyncConfig> {
        Arc::clone(&*self.config.read())
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    fn should_write_sync(&self, config: &AsyncConfig) -> bool {
        if self.sync_mode.load(Ordering::Acquire) {
            return true;
        }
        if !config.sync_fallback {
            return false;
        }
        let state = self.state.lock();
        state.metrics.total_buffered_bytes > config.sync_threshold as u64
            || state.main.len() > config.sync_queue_threshold()
    }

    /// Hand one entry straight to the sink; failures are counted, never returned
    async fn write_sync(&self, entry: &StructuredLogEntry) {
        self.state.lock().metrics.record_sync_fallback();

        if let Err(err) = self.deliver(entry).await {
            let mut state = self.state.lock();
            state.metrics.record_error();
            state.metrics.record_dropped();
            drop(state);
            warn!(sink = self.sink.name(), error = %err, "synchronous log write failed");
        }
    }

    /// Insert into the main queue, applying backpressure when it is full
    async fn admit(self: &Arc<Self>, item: BufferedEntry, config: &AsyncConfig) -> Result<()> {
        {
            let mut state = self.state.lock();
            if self.destroyed.load(Ordering::Acquire) {
                return Err(LoggerError::BufferDestroyed);
            }
            if state.main.len() < config.max_buffer_size {
                state.metrics.record_admitted(item.size);
                state.main.insert(item);
                return Ok(());
            }

            if !config.enable_backpressure {
                Self::evict_front(&mut state);
                state.metrics.record_admitted(item.size);
                state.main.insert(item);
                return Ok(());
            }
            state.metrics.record_backpressure();
        }

        // starts a flush, or joins the one already running
        self.start_flush().await;

        let mut state = self.state.lock();
        if self.destroyed.load(Ordering::Acquire) {
            return Err(LoggerError::BufferDestroyed);
        }
        if state.main.len() >= config.max_buffer_size {
            let warn_priority = config.priority(LogLevel::Warn);
            let shed = state.main.drain_below(warn_priority);
            if !shed.is_empty() {
                warn!(count = shed.len(), "buffer full, dropping entries below warn");
            }
            for dropped in shed {
                state.metrics.record_dropped_queued(dropped.size);
            }
        }
        if state.main.len() >= config.max_buffer_size {
            Self::evict_front(&mut state);
        }
        state.metrics.record_admitted(item.size);
        state.main.insert(item);
        Ok(())
    }

    fn evict_front(state: &mut BufferState) {
        if let Some(evicted) = state.main.evict_front() {
            state.metrics.record_dropped_queued(evicted.size);
            debug!(id = %evicted.id, "buffer full, evicted oldest lowest-priority entry");
        }
    }

    /// Apply `strategy` to the current contents and start a flush if it says so
    fn request_flush(self: &Arc<Self>, strategy: FlushStrategy) -> bool {
        let config = self.config();
        let inputs = {
            let state = self.state.lock();
            FlushInputs {
                main_len: state.main.len(),
                fast_len: state.fast.len(),
                batch_size: config.batch_size,
                has_urgent: state.main.has_priority_at_least(config.immediate_threshold()),
            }
        };

        if strategy.should_flush(inputs) {
            let _ = self.start_flush();
            true
        } else {
            false
        }
    }

    /// Start a flush or return the one in flight
    fn start_flush(self: &Arc<Self>) -> FlushFuture {
        let mut slot = self.in_flight.lock();
        if let Some(flush) = slot.as_ref() {
            return flush.future.clone();
        }

        let generation = self.flush_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let inner = Arc::clone(self);
        let handle = self.runtime.spawn(async move {
            let _guard = InFlightGuard {
                inner: Arc::clone(&inner),
                generation,
            };
            inner.perform_flush().await
        });
        let future = async move {
            handle.await.unwrap_or_else(|err| {
                warn!(error = %err, "flush task failed");
                FlushReport::default()
            })
        }
        .boxed()
        .shared();

        *slot = Some(InFlightFlush {
            generation,
            future: future.clone(),
        });
        future
    }

    async fn perform_flush(self: &Arc<Self>) -> FlushReport {
        let started = Instant::now();
        let config = self.config();
        let mut report = FlushReport::default();

        let fast: Vec<BufferedEntry> = {
            let slots = self.state.lock().fast.take_all();
            slots
                .into_iter()
                .map(|entry| {
                    let priority = config.priority(entry.level);
                    BufferedEntry::new(self.next_seq(), entry, priority)
                })
                .collect()
        };
        let mut fast = fast.into_iter().peekable();
        while fast.peek().is_some() {
            let batch: Vec<_> = fast.by_ref().take(config.batch_size).collect();
            self.flush_batch(batch, &config, &mut report).await;
        }

        loop {
            let batch = self.state.lock().main.take_front(config.batch_size);
            if batch.is_empty() {
                break;
            }
            self.flush_batch(batch, &config, &mut report).await;
        }

        report.duration = started.elapsed();
        if report.delivered > 0 {
            self.state.lock().metrics.record_flush(report.duration);
        }
        report
    }

    async fn flush_batch(
        self: &Arc<Self>,
        batch: Vec<BufferedEntry>,
        config: &AsyncConfig,
        report: &mut FlushReport,
    ) {
        let mut delivered_any = false;

        for mut item in batch {
            match self.deliver(&item.entry).await {
                Ok(()) => {
                    self.state.lock().metrics.record_delivered(item.size);
                    report.delivered += 1;
                    delivered_any = true;
                }
                Err(err) => {
                    report.failed += 1;
                    let retry = item.retry_count < config.max_retries && !self.cancel.is_cancelled();

                    let mut state = self.state.lock();
                    state.metrics.record_error();
                    if retry {
                        item.retry_count += 1;
                        state.metrics.record_released(item.size);
                        let seq = item.seq;
                        debug!(
                            id = %item.id,
                            attempt = item.retry_count,
                            error = %err,
                            "log delivery failed, retry scheduled"
                        );
                        state.retry_pending.insert(seq, item);
                        drop(state);
                        self.schedule_retry(seq, config.retry_delay());
                    } else {
                        state.metrics.record_dropped_queued(item.size);
                        drop(state);
                        report.dropped += 1;
                        warn!(
                            id = %item.id,
                            attempts = item.retry_count + 1,
                            age_ms = item.enqueue_time.elapsed().as_millis() as u64,
                            error = %err,
                            "log entry dropped after final delivery attempt"
                        );
                    }
                }
            }
        }

        if delivered_any {
            if let Err(err) = self.sink.flush().await {
                self.state.lock().metrics.record_error();
                warn!(sink = self.sink.name(), error = %err, "sink flush failed");
            }
        }
    }

    /// Call the sink, turning a panic into an error
    async fn deliver(&self, entry: &StructuredLogEntry) -> Result<()> {
        match AssertUnwindSafe(self.sink.write(entry)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(LoggerError::sink(
                self.sink.name(),
                format!("panicked: {}", panic_message(&*payload)),
            )),
        }
    }

    fn schedule_retry(&self, seq: u64, delay: Duration) {
        let control_tx = self.control_tx.clone();
        let cancel = self.cancel.child_token();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = control_tx.send(Control::Retry(seq));
                }
            }
        });
    }

    /// Put a parked entry back at the front of the main queue
    fn land_retry(&self, seq: u64) {
        let max_buffer_size = self.config().max_buffer_size;
        let mut state = self.state.lock();
        let Some(item) = state.retry_pending.remove(&seq) else {
            return;
        };

        if state.main.len() >= max_buffer_size {
            state.metrics.record_dropped();
            drop(state);
            warn!(id = %item.id, "buffer full, dropping entry awaiting retry");
        } else {
            state.metrics.record_admitted(item.size);
            state.main.push_front(item);
        }
    }

    async fn shutdown_now(self: Arc<Self>) -> FlushReport {
        self.destroyed.store(true, Ordering::Release);
        self.cancel.cancel();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }

        let pending = self.in_flight.lock().as_ref().map(|f| f.future.clone());
        if let Some(pending) = pending {
            pending.await;
        }

        {
            let mut state = self.state.lock();
            let mut parked: Vec<BufferedEntry> =
                state.retry_pending.drain().map(|(_, item)| item).collect();
            parked.sort_unstable_by(|a, b| b.seq.cmp(&a.seq));
            for item in parked {
                state.metrics.record_admitted(item.size);
                state.main.push_front(item);
            }
        }

        let report = self.start_flush().await;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut discarded = 0usize;
        for item in state.main.drain_all() {
            state.metrics.record_dropped_queued(item.size);
            discarded += 1;
        }
        for entry in state.fast.take_all() {
            state.metrics.record_dropped_queued(entry.estimated_size());
            discarded += 1;
        }
        for (_, item) in state.retry_pending.drain() {
            state.metrics.record_dropped_queued(item.size);
            discarded += 1;
        }
        drop(guard);

        debug!(
            delivered = report.delivered,
            dropped = report.dropped + discarded,
            "log buffer destroyed"
        );
        report
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if *self.destroyed.get_mut() {
            return;
        }
        self.cancel.cancel();

        let sync_on_exit = self.config.get_mut().sync_on_exit;
        let state = self.state.get_mut();
        let mut leftovers: Vec<Arc<StructuredLogEntry>> = state
            .main
            .drain_all()
            .into_iter()
            .chain(state.retry_pending.drain().map(|(_, item)| item))
            .map(|item| item.entry)
            .collect();
        leftovers.extend(state.fast.take_all());
        if leftovers.is_empty() {
            return;
        }

        if !sync_on_exit {
            warn!(
                discarded = leftovers.len(),
                "log buffer dropped without destroy(), buffered entries discarded"
            );
            return;
        }

        let sink = Arc::clone(&self.sink);
        // cancelled immediately if the runtime is already gone
        self.runtime.spawn(async move {
            for entry in &leftovers {
                if let Err(err) = sink.write(entry).await {
                    warn!(sink = sink.name(), error = %err, "final log write failed");
                }
            }
            let _ = sink.flush().await;
        });
    }
}

/// Clears the in-flight slot when its flush task ends, even by panic
struct InFlightGuard {
    inner: Arc<Inner>,
    generation: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut slot = self.inner.in_flight.lock();
        if slot.as_ref().is_some_and(|f| f.generation == self.generation) {
            *slot = None;
        }
    }
}

fn flush_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Worker loop owning the periodic timer
struct Worker {
    inner: Weak<Inner>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    cancel: CancellationToken,
    ticker: Interval,
}

impl Worker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    break;
                }

                _ = self.ticker.tick() => {
                    let Some(inner) = self.inner.upgrade() else {
                        break;
                    };
                    inner.request_flush(FlushStrategy::Interval);
                }

                msg = self.control_rx.recv() => {
                    let Some(msg) = msg else {
                        // buffer dropped
                        break;
                    };
                    match msg {
                        Control::Retry(seq) => {
                            let Some(inner) = self.inner.upgrade() else {
                                break;
                            };
                            inner.land_retry(seq);
                        }
                        Control::Reconfigure(period) => {
                            self.ticker = flush_ticker(period);
                        }
                    }
                }
            }
        }
    }
}

/// Builder for constructing an [`AsyncLogBuffer`] with a fluent API
///
/// # Example
///
/// ```
/// use rust_async_logger::core::AsyncLogBuffer;
/// use rust_async_logger::sinks::ConsoleSink;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let buffer = AsyncLogBuffer::builder()
///     .batch_size(50)
///     .flush_interval(std::time::Duration::from_millis(200))
///     .sink(ConsoleSink::json())
///     .build()
///     .unwrap();
/// assert_eq!(buffer.config().batch_size, 50);
/// # buffer.destroy().await;
/// # }
/// ```
pub struct AsyncLogBufferBuilder {
    config: AsyncConfig,
    sink: Option<SharedSink>,
}

impl AsyncLogBufferBuilder {
    pub fn new() -> Self {
        Self {
            config: AsyncConfig::default(),
            sink: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: AsyncConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn sink<S: LogSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    #[must_use]
    pub fn shared_sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.config.max_buffer_size = size;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    #[must_use]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn build(self) -> Result<AsyncLogBuffer> {
        match self.sink {
            Some(sink) => AsyncLogBuffer::with_sink(self.config, sink),
            None => AsyncLogBuffer::new(self.config),
        }
    }
}

impl Default for AsyncLogBufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}
