//! Property-based tests for rust_async_logger using proptest

use parking_lot::Mutex;
use proptest::prelude::*;
use rust_async_logger::core::sink::sink_fn;
use rust_async_logger::prelude::*;
use rust_async_logger::serializer::{estimate_json_size, TRUNCATION_MARKER};
use serde_json::Value as Json;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

/// Levels below the immediate-flush threshold used in ordering tests
fn queued_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
    ]
}

/// Container nesting of a JSON tree; scalars count as zero
fn json_depth(value: &Json) -> usize {
    match value {
        Json::Array(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        Json::Object(map) => 1 + map.values().map(json_depth).max().unwrap_or(0),
        _ => 0,
    }
}

fn nested_arrays(depth: usize) -> Value {
    let mut value = Value::from("leaf");
    for _ in 0..depth {
        value = Value::Array(vec![value, Value::from(1)]);
    }
    value
}

fn nested_objects(depth: usize) -> Value {
    let mut value = Value::from(0);
    for level in 0..depth {
        value = Value::from(Object::new().with("child", value).with("level", level));
    }
    value
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Default priorities follow severity
    #[test]
    fn test_priority_ordering_matches_severity(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, a.default_priority() <= b.default_priority());
    }
}

// ============================================================================
// Serializer Bounds Tests
// ============================================================================

proptest! {
    /// Strings never exceed the limit plus the marker
    #[test]
    fn test_strings_respect_max_length(s in ".{0,300}", max_len in 1usize..100) {
        let serializer = SafeSerializer::new(SerializerConfig {
            max_string_length: max_len,
            ..SerializerConfig::default()
        });

        let result = serializer.serialize(&Value::from(s.clone())).unwrap();
        let out = result.value.as_str().unwrap();
        let char_count = s.chars().count();

        if char_count > max_len {
            prop_assert!(result.truncated);
            prop_assert!(out.ends_with(TRUNCATION_MARKER));
            prop_assert_eq!(out.chars().count(), max_len + TRUNCATION_MARKER.chars().count());
        } else {
            prop_assert!(!result.truncated);
            prop_assert_eq!(out, s.as_str());
        }
    }

    /// Arrays keep at most `max_array_length` items plus one summary
    #[test]
    fn test_arrays_respect_max_length(len in 0usize..400, max_len in 1usize..150) {
        let serializer = SafeSerializer::new(SerializerConfig {
            max_array_length: max_len,
            ..SerializerConfig::default()
        });

        let value = Value::array((0..len).map(|i| i as i64));
        let result = serializer.serialize(&value).unwrap();
        let items = result.value.as_array().unwrap();

        if len > max_len {
            prop_assert!(result.truncated);
            prop_assert_eq!(items.len(), max_len + 1);
        } else {
            prop_assert_eq!(items.len(), len);
        }
    }

    /// Objects keep at most `max_object_keys` keys plus the summary key
    #[test]
    fn test_objects_respect_max_keys(keys in 0usize..200, max_keys in 1usize..120) {
        let serializer = SafeSerializer::new(SerializerConfig {
            max_object_keys: max_keys,
            ..SerializerConfig::default()
        });

        let mut object = Object::new();
        for i in 0..keys {
            object.insert(format!("key_{}", i), i);
        }
        let result = serializer.serialize(&Value::from(object)).unwrap();
        let map = result.value.as_object().unwrap();

        prop_assert!(map.len() <= max_keys + 1);
        prop_assert_eq!(result.truncated, keys > max_keys);
    }

    /// No output nests deeper than `max_depth + 1` containers
    #[test]
    fn test_nesting_respects_max_depth(depth in 0usize..40, max_depth in 0usize..15, objects in any::<bool>()) {
        let serializer = SafeSerializer::new(SerializerConfig {
            max_depth,
            ..SerializerConfig::default()
        });

        let value = if objects { nested_objects(depth) } else { nested_arrays(depth) };
        let result = serializer.serialize(&value).unwrap();

        prop_assert!(json_depth(&result.value) <= max_depth + 1);
        prop_assert_eq!(result.truncated, depth > max_depth + 1);
    }

    /// Reported memory usage is the size estimate of the produced tree
    #[test]
    fn test_memory_usage_matches_estimate(len in 0usize..50, text in "[a-z]{0,20}") {
        let serializer = SafeSerializer::default();
        let value = Value::array((0..len).map(|_| Value::from(text.clone())));

        let result = serializer.serialize(&value).unwrap();
        prop_assert_eq!(result.memory_usage, estimate_json_size(&result.value));
    }
}

// ============================================================================
// Buffer Ordering Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The main queue delivers by ascending priority, stable within a level
    #[test]
    fn test_main_queue_delivery_order(levels in prop::collection::vec(queued_level(), 1..60)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let delivered = runtime.block_on(async {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let captured = Arc::clone(&seen);
            let sink = sink_fn("ordered", move |entry: &StructuredLogEntry| {
                captured.lock().push(entry.message.clone());
                Ok(())
            });
            let config = AsyncConfig {
                flush_interval_ms: 60_000,
                immediate_flush_level: LogLevel::Fatal,
                ..AsyncConfig::default()
            };
            let buffer = AsyncLogBuffer::with_sink(config, sink).unwrap();

            for (i, level) in levels.iter().enumerate() {
                let entry = StructuredLogEntry::new(*level, i.to_string())
                    .with_data(serde_json::json!({"i": i}));
                buffer.log(entry).await.unwrap();
            }
            buffer.flush().await.unwrap();
            buffer.destroy().await;

            let delivered = seen.lock().clone();
            delivered
        });

        let mut expected: Vec<(u32, usize)> = levels
            .iter()
            .enumerate()
            .map(|(i, level)| (level.default_priority(), i))
            .collect();
        expected.sort_by_key(|(priority, _)| *priority);
        let expected: Vec<String> = expected.into_iter().map(|(_, i)| i.to_string()).collect();

        prop_assert_eq!(delivered, expected);
    }

    /// Every admitted entry is either delivered or counted as dropped
    #[test]
    fn test_entries_are_accounted_for(
        count in 1usize..120,
        max_buffer_size in 1usize..20,
        backpressure in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (before_destroy, metrics, delivered) = runtime.block_on(async {
            let seen = Arc::new(Mutex::new(0usize));
            let captured = Arc::clone(&seen);
            let sink = sink_fn("counter", move |_: &StructuredLogEntry| {
                *captured.lock() += 1;
                Ok(())
            });
            let config = AsyncConfig {
                max_buffer_size,
                enable_backpressure: backpressure,
                sync_fallback: false,
                flush_interval_ms: 60_000,
                ..AsyncConfig::default()
            };
            let buffer = AsyncLogBuffer::with_sink(config, sink).unwrap();

            for i in 0..count {
                let level = LogLevel::ALL[i % LogLevel::ALL.len()];
                let entry = StructuredLogEntry::new(level, "load")
                    .with_data(serde_json::json!({"i": i}));
                buffer.log(entry).await.unwrap();
            }
            // without backpressure nothing above yields, so no flush has run
            let before_destroy = buffer.get_metrics();
            buffer.destroy().await;

            let delivered = *seen.lock();
            (before_destroy, buffer.get_metrics(), delivered)
        });

        if !backpressure {
            let kept = count.min(max_buffer_size);
            prop_assert_eq!(before_destroy.main_queue_length, kept);
            prop_assert_eq!(before_destroy.entries_dropped, (count - kept) as u64);
            prop_assert_eq!(before_destroy.backpressure_events, 0);
        }

        prop_assert_eq!(metrics.entries_flushed as usize, delivered);
        prop_assert_eq!(metrics.entries_flushed + metrics.entries_dropped, count as u64);
        prop_assert_eq!(metrics.entries_buffered, 0);
        prop_assert!(metrics.drop_rate() >= 0.0 && metrics.drop_rate() <= 100.0);
    }
}
