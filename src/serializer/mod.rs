//! Safe serialization of arbitrary values into bounded JSON

pub mod safe_serializer;
pub mod stats;
pub mod value;

pub use safe_serializer::{
    CircularPolicy, CustomSerializer, SafeSerializer, SerializationResult, SerializerConfig,
    CIRCULAR_MARKER, DEPTH_EXCEEDED_MARKER, OMITTED_KEYS_KEY, TRUNCATION_MARKER,
};
pub use stats::SerializerStats;
pub use value::{ErrorValue, Getter, Object, Property, SharedValue, TypedArray, TypedArrayKind, Value};

/// Approximate rendered size of a JSON tree in bytes
///
/// Numbers count as 8 bytes regardless of their textual length.
pub fn estimate_json_size(value: &serde_json::Value) -> usize {
    use serde_json::Value as Json;

    match value {
        Json::Null => 4,
        Json::Bool(_) => 5,
        Json::Number(_) => 8,
        Json::String(s) => s.len() + 2,
        Json::Array(items) => {
            2 + items.len().saturating_sub(1) + items.iter().map(estimate_json_size).sum::<usize>()
        }
        Json::Object(map) => {
            2 + map.len().saturating_sub(1)
                + map
                    .iter()
                    .map(|(k, v)| k.len() + 3 + estimate_json_size(v))
                    .sum::<usize>()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_estimate_json_size() {
        assert_eq!(estimate_json_size(&json!(null)), 4);
        assert_eq!(estimate_json_size(&json!("ab")), 4);
        assert_eq!(estimate_json_size(&json!([])), 2);
        // ["ab",null] -> 2 brackets + 1 comma + 4 + 4
        assert_eq!(estimate_json_size(&json!(["ab", null])), 11);
        // {"k":true} -> 2 braces + "k": (4) + 5
        assert_eq!(estimate_json_size(&json!({"k": true})), 11);
    }
}
