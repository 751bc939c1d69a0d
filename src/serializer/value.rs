//! Runtime value model accepted by the safe serializer
//!
//! `Value` is a closed set of shapes. Owned trees cannot contain cycles; only
//! [`SharedValue`] nodes carry an identity and can therefore point back at
//! one of their ancestors.

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;
use std::sync::Arc;

/// Fallible property accessor, the equivalent of a getter that may throw
pub type Getter = Arc<dyn Fn() -> std::result::Result<Value, String> + Send + Sync>;

/// An arbitrary runtime value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    BigInt(i128),
    Symbol(Option<String>),
    Date(DateTime<Utc>),
    RegExp { source: String, flags: String },
    Function { name: Option<String>, arity: u32 },
    Error(ErrorValue),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    TypedArray(TypedArray),
    Array(Vec<Value>),
    Object(Object),
    Shared(SharedValue),
}

impl Value {
    /// An empty plain object
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    /// Shorthand for `Value::Array`
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Wrap this value in a new shared node
    pub fn into_shared(self) -> SharedValue {
        SharedValue::new(self)
    }

    /// Primitives are leaves with no children
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined
                | Value::Null
                | Value::Bool(_)
                | Value::Integer(_)
                | Value::Number(_)
                | Value::String(_)
        )
    }

    /// Insert a property when this value is an object; no-op otherwise
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if let Value::Object(object) = self {
            object.insert(key, value);
        }
    }

    /// Append an element when this value is an array; no-op otherwise
    pub fn push(&mut self, value: impl Into<Value>) {
        if let Value::Array(items) = self {
            items.push(value.into());
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        i64::try_from(i)
            .map(Value::Integer)
            .unwrap_or(Value::BigInt(i as i128))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Value::Error(e)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<TypedArray> for Value {
    fn from(t: TypedArray) -> Self {
        Value::TypedArray(t)
    }
}

impl From<SharedValue> for Value {
    fn from(s: SharedValue) -> Self {
        Value::Shared(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let mut object = Object::new();
                for (key, value) in map {
                    object.insert(key, Value::from(value));
                }
                Value::Object(object)
            }
        }
    }
}

/// A property slot: either a stored value or an accessor that may fail
#[derive(Clone)]
pub enum Property {
    Value(Value),
    Getter(Getter),
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Property::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

/// Object with insertion-ordered properties and an optional type tag
///
/// The type tag plays the role of a constructor name: custom serializers
/// are looked up by it.
#[derive(Debug, Clone, Default)]
pub struct Object {
    type_name: Option<String>,
    properties: Vec<(String, Property)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// An object tagged with a type name
    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_getter<F>(mut self, key: impl Into<String>, getter: F) -> Self
    where
        F: Fn() -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.properties
            .push((key.into(), Property::Getter(Arc::new(getter))));
        self
    }

    /// Insert or replace a property, keeping the original position on replace
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = Property::Value(value.into());
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn properties(&self) -> &[(String, Property)] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Stored value of a property; getters are not invoked
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.iter().find_map(|(k, p)| match p {
            Property::Value(v) if k == key => Some(v),
            _ => None,
        })
    }
}

/// Captured error: name, message, optional stack, extra own properties and cause
#[derive(Debug, Clone, Default)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
    pub extra: Vec<(String, Value)>,
    pub cause: Option<Box<Value>>,
}

impl ErrorValue {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Capture a Rust error; its `source()` chain becomes nested causes
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut value = Self::new("Error", err.to_string());
        if let Some(source) = err.source() {
            value.cause = Some(Box::new(Value::Error(Self::from_error(source))));
        }
        value
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Value>) -> Self {
        self.cause = Some(Box::new(cause.into()));
        self
    }
}

/// Element type of a typed array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedArrayKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
}

impl TypedArrayKind {
    pub fn constructor_name(&self) -> &'static str {
        match self {
            TypedArrayKind::Int8 => "Int8Array",
            TypedArrayKind::Uint8 => "Uint8Array",
            TypedArrayKind::Uint8Clamped => "Uint8ClampedArray",
            TypedArrayKind::Int16 => "Int16Array",
            TypedArrayKind::Uint16 => "Uint16Array",
            TypedArrayKind::Int32 => "Int32Array",
            TypedArrayKind::Uint32 => "Uint32Array",
            TypedArrayKind::Float32 => "Float32Array",
            TypedArrayKind::Float64 => "Float64Array",
            TypedArrayKind::BigInt64 => "BigInt64Array",
            TypedArrayKind::BigUint64 => "BigUint64Array",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypedArray {
    pub kind: TypedArrayKind,
    pub values: Vec<f64>,
}

impl TypedArray {
    pub fn new(kind: TypedArrayKind, values: Vec<f64>) -> Self {
        Self { kind, values }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(
            TypedArrayKind::Uint8,
            bytes.iter().map(|b| f64::from(*b)).collect(),
        )
    }
}

/// Shared, mutable node with pointer identity
///
/// Cloning shares the node. A node stored inside its own subtree forms a
/// cycle; such cycles are never freed, so they belong in tests and in
/// values that live for the program's lifetime.
#[derive(Clone, Default)]
pub struct SharedValue(Arc<RwLock<Value>>);

impl SharedValue {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Identity of the node, stable for its lifetime
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Replace the node's content
    pub fn set(&self, value: Value) {
        *self.0.write() = value;
    }

    /// Mutate the node's content in place
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.0.write())
    }

    /// Read access that tolerates re-entrant reads of the same node
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read_recursive()
    }

    pub fn ptr_eq(&self, other: &SharedValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedValue {
    // Never descend: the node may be part of a cycle
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedValue({:#x})", self.id())
    }
}
