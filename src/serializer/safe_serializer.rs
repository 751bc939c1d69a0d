//! Bounded, cycle-aware conversion of [`Value`] trees into JSON

use super::stats::{SerializerCounters, SerializerStats};
use super::value::{ErrorValue, Getter, Object, Property, SharedValue, TypedArray, Value};
use super::estimate_json_size;
use crate::core::error::{panic_message, LoggerError, Result};
use chrono::SecondsFormat;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Appended to strings cut at `max_string_length`
pub const TRUNCATION_MARKER: &str = "...[truncated]";
/// Replaces containers nested deeper than `max_depth`
pub const DEPTH_EXCEEDED_MARKER: &str = "[Max Depth Exceeded]";
/// Replaces a cycle back-edge under [`CircularPolicy::Replace`]
pub const CIRCULAR_MARKER: &str = "[Circular Reference]";
/// Key that summarizes properties beyond `max_object_keys`
pub const OMITTED_KEYS_KEY: &str = "...";

const TYPE_TAG: &str = "__type";

/// Upper bound on `max_depth`; traversal recurses on the native stack
pub const HARD_DEPTH_LIMIT: usize = 256;

/// What to do when a shared node is met again on its own ancestor chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircularPolicy {
    /// Fail the whole call with [`LoggerError::CircularReference`]
    #[default]
    Error,
    /// Substitute [`CIRCULAR_MARKER`] and keep going
    Replace,
}

/// Limits applied by [`SafeSerializer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    pub max_depth: usize,
    pub max_string_length: usize,
    pub max_array_length: usize,
    pub max_object_keys: usize,
    /// Track shared-node identity along the current path
    ///
    /// When disabled a cyclic structure recurses until `max_depth` stops it.
    pub detect_circular: bool,
    pub circular_policy: CircularPolicy,
    pub enable_fast_path: bool,
    pub track_performance: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_string_length: 10_000,
            max_array_length: 100,
            max_object_keys: 100,
            detect_circular: true,
            circular_policy: CircularPolicy::Error,
            enable_fast_path: true,
            track_performance: false,
        }
    }
}

/// Handler producing the representation of objects carrying a given type tag
pub type CustomSerializer = Arc<dyn Fn(&Object) -> Json + Send + Sync>;

/// Output of one [`SafeSerializer::serialize`] call
#[derive(Debug, Clone, PartialEq)]
pub struct SerializationResult {
    pub value: Json,
    /// Any limit (string, array, keys, depth) cut something off
    pub truncated: bool,
    /// Back-edges replaced under [`CircularPolicy::Replace`]
    pub circular_references: usize,
    pub serialization_time: Duration,
    /// Estimated byte size of `value` once rendered
    pub memory_usage: usize,
}

/// Converts arbitrary [`Value`]s into bounded, JSON-safe trees
///
/// Never panics on hostile input: oversized strings, arrays and objects are
/// cut with markers, deep nesting is replaced past `max_depth`, failing
/// getters become inline error strings. The only error returned is
/// [`LoggerError::CircularReference`], and only under
/// [`CircularPolicy::Error`].
///
/// # Example
///
/// ```
/// use rust_async_logger::serializer::{Object, SafeSerializer, Value};
///
/// let serializer = SafeSerializer::default();
/// let value = Value::from(Object::new().with("user", "alice").with("attempts", 3));
///
/// let result = serializer.serialize(&value).unwrap();
/// assert_eq!(result.value, serde_json::json!({"user": "alice", "attempts": 3}));
/// assert!(!result.truncated);
/// ```
pub struct SafeSerializer {
    config: SerializerConfig,
    custom: RwLock<HashMap<String, CustomSerializer>>,
    counters: SerializerCounters,
}

impl SafeSerializer {
    pub fn new(mut config: SerializerConfig) -> Self {
        config.max_depth = config.max_depth.min(HARD_DEPTH_LIMIT);
        Self {
            config,
            custom: RwLock::new(HashMap::new()),
            counters: SerializerCounters::new(),
        }
    }

    /// Serializer that replaces cycles instead of failing
    pub fn lossy() -> Self {
        Self::new(SerializerConfig {
            circular_policy: CircularPolicy::Replace,
            ..SerializerConfig::default()
        })
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Register a handler for objects tagged `type_name`, replacing any previous one
    pub fn register_custom<F>(&self, type_name: impl Into<String>, handler: F)
    where
        F: Fn(&Object) -> Json + Send + Sync + 'static,
    {
        self.custom.write().insert(type_name.into(), Arc::new(handler));
    }

    /// Remove a handler; returns whether one was registered
    pub fn unregister_custom(&self, type_name: &str) -> bool {
        self.custom.write().remove(type_name).is_some()
    }

    pub fn has_custom(&self, type_name: &str) -> bool {
        self.custom.read().contains_key(type_name)
    }

    /// Convert `value` into a bounded JSON tree
    pub fn serialize(&self, value: &Value) -> Result<SerializationResult> {
        let started = Instant::now();
        let outcome = self.run(value);
        let elapsed = started.elapsed();

        let track = self.config.track_performance;
        if track {
            self.counters.record_serialization(elapsed);
        }

        let (json, truncated, circular_references) = match outcome {
            Ok(done) => done,
            Err(err) => {
                if track && matches!(err, LoggerError::CircularReference { .. }) {
                    self.counters.record_circular(1);
                }
                return Err(err);
            }
        };

        if track {
            if truncated {
                self.counters.record_truncation();
            }
            if circular_references > 0 {
                self.counters.record_circular(circular_references as u64);
            }
        }

        Ok(SerializationResult {
            memory_usage: estimate_json_size(&json),
            value: json,
            truncated,
            circular_references,
            serialization_time: elapsed,
        })
    }

    /// Serialize and render to a compact JSON string
    pub fn serialize_to_string(&self, value: &Value) -> Result<String> {
        let result = self.serialize(value)?;
        Ok(serde_json::to_string(&result.value)?)
    }

    pub fn stats(&self) -> SerializerStats {
        self.counters.snapshot()
    }

    pub fn reset_stats(&self) {
        self.counters.reset();
    }

    fn run(&self, value: &Value) -> Result<(Json, bool, usize)> {
        if self.config.enable_fast_path {
            if let Some(json) = self.try_fast_path(value) {
                if self.config.track_performance {
                    self.counters.record_fast_path();
                }
                return Ok((json, false, 0));
            }
        }

        let custom = self.custom.read();
        let mut traversal = Traversal {
            config: &self.config,
            custom: &custom,
            visiting: HashSet::new(),
            truncated: false,
            circular: 0,
        };
        let json = traversal.visit(value, 0)?;
        Ok((json, traversal.truncated, traversal.circular))
    }

    /// Flat values that need no bounding are converted directly
    fn try_fast_path(&self, value: &Value) -> Option<Json> {
        match value {
            Value::Array(items) if items.len() <= self.config.max_array_length => items
                .iter()
                .map(|item| self.fast_primitive(item))
                .collect::<Option<Vec<_>>>()
                .map(Json::Array),
            Value::Object(object)
                if object.type_name().is_none()
                    && object.len() <= self.config.max_object_keys =>
            {
                let mut map = Map::with_capacity(object.len());
                for (key, property) in object.properties() {
                    match property {
                        Property::Value(v) => {
                            map.insert(key.clone(), self.fast_primitive(v)?);
                        }
                        Property::Getter(_) => return None,
                    }
                }
                Some(Json::Object(map))
            }
            other => self.fast_primitive(other),
        }
    }

    fn fast_primitive(&self, value: &Value) -> Option<Json> {
        match value {
            Value::Undefined | Value::Null => Some(Json::Null),
            Value::Bool(b) => Some(Json::Bool(*b)),
            Value::Integer(i) => Some(Json::from(*i)),
            Value::Number(n) => Some(number(*n)),
            // byte length bounds the char count
            Value::String(s) if s.len() <= self.config.max_string_length => {
                Some(Json::String(s.clone()))
            }
            _ => None,
        }
    }
}

impl Default for SafeSerializer {
    fn default() -> Self {
        Self::new(SerializerConfig::default())
    }
}

impl std::fmt::Debug for SafeSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeSerializer")
            .field("config", &self.config)
            .field("custom", &self.custom.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// State of one full traversal
struct Traversal<'a> {
    config: &'a SerializerConfig,
    custom: &'a HashMap<String, CustomSerializer>,
    /// Shared nodes on the current ancestor chain
    visiting: HashSet<usize>,
    truncated: bool,
    circular: usize,
}

impl Traversal<'_> {
    fn visit(&mut self, value: &Value, depth: usize) -> Result<Json> {
        match value {
            Value::Undefined | Value::Null => Ok(Json::Null),
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::Integer(i) => Ok(Json::from(*i)),
            Value::Number(n) => Ok(number(*n)),
            Value::String(s) => Ok(Json::String(self.bounded_string(s))),
            Value::BigInt(i) => Ok(tagged("BigInt", [("value", Json::String(i.to_string()))])),
            Value::Symbol(description) => {
                let description = match description {
                    Some(d) => Json::String(self.bounded_string(d)),
                    None => Json::Null,
                };
                Ok(tagged("Symbol", [("description", description)]))
            }
            Value::Date(date) => Ok(Json::String(
                date.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            Value::RegExp { source, flags } => Ok(tagged(
                "RegExp",
                [
                    ("source", Json::String(self.bounded_string(source))),
                    ("flags", Json::String(flags.clone())),
                ],
            )),
            Value::Function { name, arity } => {
                let name = name.as_deref().unwrap_or("anonymous");
                Ok(tagged(
                    "Function",
                    [
                        ("name", Json::String(self.bounded_string(name))),
                        ("length", Json::from(*arity)),
                    ],
                ))
            }
            Value::Error(error) => self.visit_error(error, depth),
            Value::Map(entries) => self.visit_map(entries, depth),
            Value::Set(values) => self.visit_set(values, depth),
            Value::TypedArray(array) => Ok(self.visit_typed_array(array)),
            Value::Array(items) => self.visit_array(items, depth),
            Value::Object(object) => self.visit_object(object, depth),
            Value::Shared(node) => self.visit_shared(node, depth),
        }
    }

    fn exceeds_depth(&mut self, depth: usize) -> bool {
        if depth > self.config.max_depth {
            self.truncated = true;
            true
        } else {
            false
        }
    }

    fn bounded_string(&mut self, s: &str) -> String {
        match s.char_indices().nth(self.config.max_string_length) {
            Some((cut, _)) => {
                self.truncated = true;
                let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
                out.push_str(&s[..cut]);
                out.push_str(TRUNCATION_MARKER);
                out
            }
            None => s.to_string(),
        }
    }

    fn visit_array(&mut self, items: &[Value], depth: usize) -> Result<Json> {
        if self.exceeds_depth(depth) {
            return Ok(depth_marker());
        }

        let limit = self.config.max_array_length;
        let mut out = Vec::with_capacity(items.len().min(limit) + 1);
        for item in items.iter().take(limit) {
            out.push(self.visit(item, depth + 1)?);
        }
        if items.len() > limit {
            self.truncated = true;
            out.push(Json::String(format!(
                "[... {} more items]",
                items.len() - limit
            )));
        }
        Ok(Json::Array(out))
    }

    fn visit_object(&mut self, object: &Object, depth: usize) -> Result<Json> {
        if let Some(handler) = object.type_name().and_then(|name| self.custom.get(name)) {
            return Ok(run_custom(handler, object));
        }
        if self.exceeds_depth(depth) {
            return Ok(depth_marker());
        }

        let limit = self.config.max_object_keys;
        let total = object.len();
        let mut map = Map::with_capacity(total.min(limit) + 1);
        for (key, property) in object.properties().iter().take(limit) {
            let value = match property {
                Property::Value(v) => self.visit(v, depth + 1)?,
                Property::Getter(getter) => match read_getter(getter) {
                    Ok(v) => self.visit(&v, depth + 1)?,
                    Err(message) => {
                        Json::String(format!("[Error accessing property: {}]", message))
                    }
                },
            };
            map.insert(key.clone(), value);
        }
        if total > limit {
            self.truncated = true;
            map.insert(
                OMITTED_KEYS_KEY.to_string(),
                Json::String(format!("[{} more keys]", total - limit)),
            );
        }
        Ok(Json::Object(map))
    }

    fn visit_error(&mut self, error: &ErrorValue, depth: usize) -> Result<Json> {
        if self.exceeds_depth(depth) {
            return Ok(depth_marker());
        }

        let mut map = Map::new();
        map.insert(TYPE_TAG.to_string(), Json::String("Error".to_string()));
        map.insert("name".to_string(), Json::String(self.bounded_string(&error.name)));
        map.insert(
            "message".to_string(),
            Json::String(self.bounded_string(&error.message)),
        );
        if let Some(stack) = &error.stack {
            map.insert("stack".to_string(), Json::String(self.bounded_string(stack)));
        }
        for (key, value) in error.extra.iter().take(self.config.max_object_keys) {
            if map.contains_key(key) {
                continue;
            }
            let json = self.visit(value, depth + 1)?;
            map.insert(key.clone(), json);
        }
        if let Some(cause) = &error.cause {
            let json = self.visit(cause, depth + 1)?;
            map.insert("cause".to_string(), json);
        }
        Ok(Json::Object(map))
    }

    fn visit_map(&mut self, entries: &[(Value, Value)], depth: usize) -> Result<Json> {
        if self.exceeds_depth(depth) {
            return Ok(depth_marker());
        }

        let limit = self.config.max_array_length;
        let mut out = Vec::with_capacity(entries.len().min(limit));
        for (key, value) in entries.iter().take(limit) {
            let key = self.visit(key, depth + 1)?;
            let value = self.visit(value, depth + 1)?;
            out.push(Json::Array(vec![key, value]));
        }
        let truncated = entries.len() > limit;
        self.truncated |= truncated;
        Ok(tagged(
            "Map",
            [
                ("size", Json::from(entries.len())),
                ("entries", Json::Array(out)),
                ("truncated", Json::Bool(truncated)),
            ],
        ))
    }

    fn visit_set(&mut self, values: &[Value], depth: usize) -> Result<Json> {
        if self.exceeds_depth(depth) {
            return Ok(depth_marker());
        }

        let limit = self.config.max_array_length;
        let mut out = Vec::with_capacity(values.len().min(limit));
        for value in values.iter().take(limit) {
            out.push(self.visit(value, depth + 1)?);
        }
        let truncated = values.len() > limit;
        self.truncated |= truncated;
        Ok(tagged(
            "Set",
            [
                ("size", Json::from(values.len())),
                ("values", Json::Array(out)),
                ("truncated", Json::Bool(truncated)),
            ],
        ))
    }

    fn visit_typed_array(&mut self, array: &TypedArray) -> Json {
        let limit = self.config.max_array_length;
        let values = array.values.iter().take(limit).map(|v| number(*v)).collect();
        let truncated = array.values.len() > limit;
        self.truncated |= truncated;
        tagged(
            "TypedArray",
            [
                (
                    "constructor",
                    Json::String(array.kind.constructor_name().to_string()),
                ),
                ("length", Json::from(array.values.len())),
                ("values", Json::Array(values)),
                ("truncated", Json::Bool(truncated)),
            ],
        )
    }

    fn visit_shared(&mut self, node: &SharedValue, depth: usize) -> Result<Json> {
        if self.exceeds_depth(depth) {
            return Ok(depth_marker());
        }

        let id = node.id();
        if self.config.detect_circular && !self.visiting.insert(id) {
            return match self.config.circular_policy {
                CircularPolicy::Error => Err(LoggerError::CircularReference { depth }),
                CircularPolicy::Replace => {
                    self.circular += 1;
                    Ok(Json::String(CIRCULAR_MARKER.to_string()))
                }
            };
        }

        let inner = node.read();
        // a node holding another node directly still has to consume depth,
        // otherwise an undetected self-loop would never reach the bound
        let next_depth = if matches!(&*inner, Value::Shared(_)) {
            depth + 1
        } else {
            depth
        };
        let result = self.visit(&inner, next_depth);
        drop(inner);

        if self.config.detect_circular {
            self.visiting.remove(&id);
        }
        result
    }
}

fn number(n: f64) -> Json {
    serde_json::Number::from_f64(n)
        .map(Json::Number)
        .unwrap_or(Json::Null)
}

fn depth_marker() -> Json {
    Json::String(DEPTH_EXCEEDED_MARKER.to_string())
}

fn tagged<const N: usize>(type_name: &str, fields: [(&str, Json); N]) -> Json {
    let mut map = Map::with_capacity(N + 1);
    map.insert(TYPE_TAG.to_string(), Json::String(type_name.to_string()));
    for (key, value) in fields {
        map.insert(key.to_string(), value);
    }
    Json::Object(map)
}

fn read_getter(getter: &Getter) -> std::result::Result<Value, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| getter())) {
        Ok(result) => result,
        Err(payload) => Err(panic_message(&*payload)),
    }
}

fn run_custom(handler: &CustomSerializer, object: &Object) -> Json {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(object))) {
        Ok(json) => json,
        Err(payload) => Json::String(format!(
            "[Error in custom serializer: {}]",
            panic_message(&*payload)
        )),
    }
}
