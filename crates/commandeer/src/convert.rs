//! Argument type converters.
//!
//! A [`ConverterRegistry`] maps a type name (as written in an
//! [`Argument`](crate::Argument) declaration) to a function turning the raw
//! option string into a [`Value`].
//!
//! Registries are plain values owned by a dispatcher. [`ConverterRegistry::new`]
//! comes with the built-in types:
//!
//! | Name | Result |
//! |------|--------|
//! | `String` | the raw text |
//! | `Int64` | signed base-10 integer |
//! | `Uint64` | unsigned base-10 integer |
//! | `StringList` | comma separated list (`StringArray[]` is accepted too) |
//! | `FilePath` | the raw text, if the path exists |
//!
//! # Custom types
//!
//! ```rust
//! use commandeer::{ConvertError, ConverterRegistry, Value};
//!
//! struct Endpoint { host: String, port: u64 }
//!
//! let mut registry = ConverterRegistry::new();
//! registry.register("Endpoint", |raw| {
//!     let (host, port) = raw
//!         .split_once(':')
//!         .ok_or_else(|| ConvertError::invalid("expected HOST:PORT"))?;
//!     let port = port.parse().map_err(|_| ConvertError::invalid("port must be a number"))?;
//!     Ok(Value::custom(Endpoint { host: host.to_string(), port }))
//! });
//!
//! let value = registry.convert("Endpoint", "localhost:8080").unwrap();
//! let endpoint = value.downcast::<Endpoint>().unwrap();
//! assert_eq!(endpoint.port, 8080);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::rc::Rc;

use crate::error::ConvertError;

/// A converted argument value.
#[derive(Clone)]
pub enum Value {
    /// Plain text (`String`, `FilePath`).
    Text(String),
    /// Signed integer (`Int64`).
    Int(i64),
    /// Unsigned integer (`Uint64`).
    Uint(u64),
    /// Text sequence (`StringList`).
    List(Vec<String>),
    /// Anything produced by a user-registered converter.
    Custom(Rc<dyn Any>),
}

impl Value {
    /// Wraps an arbitrary value for custom converters.
    pub fn custom<T: 'static>(value: T) -> Self {
        Value::Custom(Rc::new(value))
    }

    /// Short name of the variant, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::List(_) => "list",
            Value::Custom(_) => "custom",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the custom payload if it is a `T`.
    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        match self {
            Value::Custom(inner) => Rc::clone(inner).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Uint(n) => f.debug_tuple("Uint").field(n).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Custom(_) => f.debug_tuple("Custom").finish_non_exhaustive(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Custom payloads are opaque; only the same allocation is equal.
            (Value::Custom(a), Value::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Typed extraction from a [`Value`].
pub trait FromValue: Sized {
    /// The [`Value::kind`] this type is extracted from.
    const KIND: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    const KIND: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for i64 {
    const KIND: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for u64 {
    const KIND: &'static str = "uint";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_u64()
    }
}

impl FromValue for Vec<String> {
    const KIND: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_list().map(<[String]>::to_vec)
    }
}

/// The converter function signature.
pub type ConverterFn = Rc<dyn Fn(&str) -> Result<Value, ConvertError>>;

/// Mapping from type name to converter.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, ConverterFn>,
}

impl ConverterRegistry {
    /// Creates a registry with the built-in converters.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("String", |raw| Ok(Value::Text(raw.to_string())));
        registry.register("Int64", |raw| {
            raw.parse::<i64>()
                .map(Value::Int)
                .map_err(|e| ConvertError::invalid(e.to_string()))
        });
        registry.register("Uint64", |raw| {
            raw.parse::<u64>()
                .map(Value::Uint)
                .map_err(|e| ConvertError::invalid(e.to_string()))
        });
        registry.register("StringList", string_list);
        registry.register("StringArray[]", string_list);
        registry.register("FilePath", file_path);
        registry
    }

    /// Creates a registry without any converters.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registers a converter, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, converter: F)
    where
        F: Fn(&str) -> Result<Value, ConvertError> + 'static,
    {
        self.converters.insert(name.into(), Rc::new(converter));
    }

    /// Returns true if a converter is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    /// Converts `raw` with the converter registered for `name`.
    pub fn convert(&self, name: &str, raw: &str) -> Result<Value, ConvertError> {
        let converter = self
            .converters
            .get(name)
            .ok_or_else(|| ConvertError::UnknownType(name.to_string()))?;
        converter(raw)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("types", &self.names())
            .finish()
    }
}

fn string_list(raw: &str) -> Result<Value, ConvertError> {
    Ok(Value::List(raw.split(',').map(String::from).collect()))
}

fn file_path(raw: &str) -> Result<Value, ConvertError> {
    match fs::metadata(raw) {
        Ok(_) => Ok(Value::Text(raw.to_string())),
        Err(e) => {
            tracing::warn!(path = raw, error = %e, "file path check failed");
            Err(ConvertError::invalid(format!("{}: {}", raw, e)))
        }
    }
}
