//! Serializer performance counters
//!
//! Running totals kept with relaxed atomics so a shared `SafeSerializer`
//! can be used from many tasks without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters owned by a serializer
#[derive(Debug, Default)]
pub(crate) struct SerializerCounters {
    serializations: AtomicU64,
    total_nanos: AtomicU64,
    circular_detections: AtomicU64,
    truncations: AtomicU64,
    fast_path_hits: AtomicU64,
}

impl SerializerCounters {
    pub(crate) const fn new() -> Self {
        Self {
            serializations: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            circular_detections: AtomicU64::new(0),
            truncations: AtomicU64::new(0),
            fast_path_hits: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_serialization(&self, elapsed: Duration) {
        self.serializations.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_circular(&self, count: u64) {
        self.circular_detections.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_truncation(&self) {
        self.truncations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_fast_path(&self) {
        self.fast_path_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SerializerStats {
        SerializerStats {
            serializations: self.serializations.load(Ordering::Relaxed),
            total_time: Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed)),
            circular_detections: self.circular_detections.load(Ordering::Relaxed),
            truncations: self.truncations.load(Ordering::Relaxed),
            fast_path_hits: self.fast_path_hits.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        self.serializations.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
        self.circular_detections.store(0, Ordering::Relaxed);
        self.truncations.store(0, Ordering::Relaxed);
        self.fast_path_hits.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the serializer counters
///
/// # Example
///
/// ```
/// use rust_async_logger::serializer::{SafeSerializer, SerializerConfig, Value};
///
/// let serializer = SafeSerializer::new(SerializerConfig {
///     track_performance: true,
///     ..SerializerConfig::default()
/// });
/// serializer.serialize(&Value::from("hello")).unwrap();
///
/// let stats = serializer.stats();
/// assert_eq!(stats.serializations, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializerStats {
    pub serializations: u64,
    pub total_time: Duration,
    pub circular_detections: u64,
    pub truncations: u64,
    pub fast_path_hits: u64,
}

impl SerializerStats {
    /// Mean time per serialization, zero when nothing was recorded
    pub fn average_time(&self) -> Duration {
        if self.serializations == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total_time.as_nanos() / u128::from(self.serializations);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = SerializerCounters::new();
        assert_eq!(counters.snapshot(), SerializerStats::default());
        assert_eq!(counters.snapshot().average_time(), Duration::ZERO);
    }

    #[test]
    fn test_average_time() {
        let counters = SerializerCounters::new();
        counters.record_serialization(Duration::from_micros(10));
        counters.record_serialization(Duration::from_micros(30));

        let stats = counters.snapshot();
        assert_eq!(stats.serializations, 2);
        assert_eq!(stats.average_time(), Duration::from_micros(20));
    }

    #[test]
    fn test_reset() {
        let counters = SerializerCounters::new();
        counters.record_serialization(Duration::from_millis(1));
        counters.record_circular(2);
        counters.record_truncation();
        counters.record_fast_path();

        counters.reset();

        assert_eq!(counters.snapshot(), SerializerStats::default());
    }
}
