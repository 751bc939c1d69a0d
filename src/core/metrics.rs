//! Buffer metrics for observability
//!
//! The buffer owns one `BufferMetrics` under its state lock and hands out
//! copies. Every counter saturates at zero.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Snapshot of buffer health
///
/// # Example
///
/// ```
/// use rust_async_logger::core::BufferMetrics;
///
/// let metrics = BufferMetrics::default();
/// assert_eq!(metrics.drop_rate(), 0.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BufferMetrics {
    /// Entries currently held in the queues
    pub entries_buffered: u64,
    /// Entries delivered to the sink
    pub entries_flushed: u64,
    pub entries_dropped: u64,
    /// Admissions that found the main queue full
    pub backpressure_events: u64,
    /// Entries written directly to the sink, bypassing the queues
    pub sync_fallback_count: u64,
    /// Failed sink deliveries, retried or not
    pub error_count: u64,
    /// Flush cycles that delivered at least one entry
    pub flush_count: u64,
    pub average_flush_time_ms: f64,
    /// Main-queue length over `max_buffer_size`
    pub buffer_utilization: f64,
    /// Estimated bytes held in the queues
    pub total_buffered_bytes: u64,
    pub main_queue_length: usize,
    pub fast_queue_length: usize,
    pub pending_retries: usize,
    pub last_flush_at: Option<DateTime<Utc>>,
}

impl BufferMetrics {
    /// Dropped entries as a percentage of everything that left the buffer
    ///
    /// Returns 0.0 if nothing has been flushed or dropped.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.entries_dropped as f64;
        let total = self.entries_flushed as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    #[inline]
    pub(crate) fn record_admitted(&mut self, size: usize) {
        self.entries_buffered = self.entries_buffered.saturating_add(1);
        self.total_buffered_bytes = self.total_buffered_bytes.saturating_add(size as u64);
    }

    #[inline]
    pub(crate) fn record_released(&mut self, size: usize) {
        self.entries_buffered = self.entries_buffered.saturating_sub(1);
        self.total_buffered_bytes = self.total_buffered_bytes.saturating_sub(size as u64);
    }

    #[inline]
    pub(crate) fn record_delivered(&mut self, size: usize) {
        self.entries_flushed = self.entries_flushed.saturating_add(1);
        self.record_released(size);
    }

    /// A queued entry was discarded
    #[inline]
    pub(crate) fn record_dropped_queued(&mut self, size: usize) {
        self.record_dropped();
        self.record_released(size);
    }

    /// An entry that never made it into the queues was discarded
    #[inline]
    pub(crate) fn record_dropped(&mut self) {
        self.entries_dropped = self.entries_dropped.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_backpressure(&mut self) {
        self.backpressure_events = self.backpressure_events.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_sync_fallback(&mut self) {
        self.sync_fallback_count = self.sync_fallback_count.saturating_add(1);
    }

    /// Fold one flush cycle into the running mean
    pub(crate) fn record_flush(&mut self, elapsed: Duration) {
        self.flush_count = self.flush_count.saturating_add(1);
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.average_flush_time_ms += (ms - self.average_flush_time_ms) / self.flush_count as f64;
        self.last_flush_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = BufferMetrics::default();
        assert_eq!(metrics.entries_buffered, 0);
        assert_eq!(metrics.entries_flushed, 0);
        assert_eq!(metrics.entries_dropped, 0);
        assert_eq!(metrics.flush_count, 0);
        assert!(metrics.last_flush_at.is_none());
    }

    #[test]
    fn test_counters_saturate_at_zero() {
        let mut metrics = BufferMetrics::default();
        metrics.record_released(100);
        metrics.record_delivered(100);

        assert_eq!(metrics.entries_buffered, 0);
        assert_eq!(metrics.total_buffered_bytes, 0);
        assert_eq!(metrics.entries_flushed, 1);
    }

    #[test]
    fn test_admit_then_drop() {
        let mut metrics = BufferMetrics::default();
        metrics.record_admitted(80);
        metrics.record_admitted(20);
        metrics.record_dropped_queued(80);

        assert_eq!(metrics.entries_buffered, 1);
        assert_eq!(metrics.total_buffered_bytes, 20);
        assert_eq!(metrics.entries_dropped, 1);
    }

    #[test]
    fn test_average_flush_time_is_cumulative_mean() {
        let mut metrics = BufferMetrics::default();
        metrics.record_flush(Duration::from_millis(10));
        metrics.record_flush(Duration::from_millis(30));

        assert_eq!(metrics.flush_count, 2);
        assert!((metrics.average_flush_time_ms - 20.0).abs() < 1e-9);
        assert!(metrics.last_flush_at.is_some());
    }

    #[test]
    fn test_metrics_drop_rate() {
        let mut metrics = BufferMetrics::default();

        // 100 flushed, 10 dropped - ~9.09% drop rate
        for _ in 0..100 {
            metrics.record_delivered(0);
        }
        assert_eq!(metrics.drop_rate(), 0.0);
        for _ in 0..10 {
            metrics.record_dropped();
        }
        let rate = metrics.drop_rate();
        assert!(rate > 9.0 && rate < 10.0, "Drop rate was {}", rate);
    }
}
