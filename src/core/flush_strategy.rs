//! Flush strategies for the async buffer
//!
//! A strategy decides whether a flush request actually starts a flush given
//! the buffer's current contents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// When a flush request should start a flush
///
/// # Example
///
/// ```
/// use rust_async_logger::core::FlushStrategy;
///
/// let strategy: FlushStrategy = serde_json::from_str("\"hybrid\"").unwrap();
/// assert_eq!(strategy, FlushStrategy::Hybrid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushStrategy {
    /// Always flush
    Immediate,
    /// Flush once the main queue holds at least `batch_size` entries
    Batch,
    /// Flush when anything is buffered; used by the periodic timer
    Interval,
    /// Batch condition, or an entry at/above the immediate threshold is queued
    #[default]
    Hybrid,
}

impl fmt::Display for FlushStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushStrategy::Immediate => write!(f, "Immediate"),
            FlushStrategy::Batch => write!(f, "Batch"),
            FlushStrategy::Interval => write!(f, "Interval"),
            FlushStrategy::Hybrid => write!(f, "Hybrid"),
        }
    }
}

/// Buffer contents a strategy decides on
#[derive(Debug, Clone, Copy)]
pub(crate) struct FlushInputs {
    pub main_len: usize,
    pub fast_len: usize,
    pub batch_size: usize,
    pub has_urgent: bool,
}

impl FlushStrategy {
    pub(crate) fn should_flush(&self, inputs: FlushInputs) -> bool {
        match self {
            FlushStrategy::Immediate => true,
            FlushStrategy::Batch => inputs.main_len >= inputs.batch_size,
            FlushStrategy::Interval => inputs.main_len + inputs.fast_len > 0,
            FlushStrategy::Hybrid => inputs.main_len >= inputs.batch_size || inputs.has_urgent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(main_len: usize, fast_len: usize, has_urgent: bool) -> FlushInputs {
        FlushInputs {
            main_len,
            fast_len,
            batch_size: 10,
            has_urgent,
        }
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(FlushStrategy::Immediate.to_string(), "Immediate");
        assert_eq!(FlushStrategy::Hybrid.to_string(), "Hybrid");
    }

    #[test]
    fn test_immediate_always_flushes() {
        assert!(FlushStrategy::Immediate.should_flush(inputs(0, 0, false)));
    }

    #[test]
    fn test_batch_waits_for_full_batch() {
        assert!(!FlushStrategy::Batch.should_flush(inputs(9, 50, true)));
        assert!(FlushStrategy::Batch.should_flush(inputs(10, 0, false)));
    }

    #[test]
    fn test_interval_skips_empty_buffer() {
        assert!(!FlushStrategy::Interval.should_flush(inputs(0, 0, false)));
        assert!(FlushStrategy::Interval.should_flush(inputs(0, 1, false)));
        assert!(FlushStrategy::Interval.should_flush(inputs(1, 0, false)));
    }

    #[test]
    fn test_hybrid_flushes_on_batch_or_urgent() {
        assert!(!FlushStrategy::Hybrid.should_flush(inputs(3, 0, false)));
        assert!(FlushStrategy::Hybrid.should_flush(inputs(3, 0, true)));
        assert!(FlushStrategy::Hybrid.should_flush(inputs(10, 0, false)));
    }
}
