//! Dynamically-typed blackboard payloads and the shared-identity cells that
//! hold them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A value a blackboard [`Pointer`] can hold.
///
/// XML attribute text always parses into `Value::String`; code that writes a
/// blackboard entry directly may store any variant, matching the reference
/// implementation where a cell transparently holds a native type or its
/// string form.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Coerce a string-valued cell into a bool, matching the special-cased
    /// `bool` converter used by node port resolution: `"true"`/`"false"`
    /// parse, an already-boolean or null value passes through unchanged,
    /// anything else is left alone (callers treat that as a missing port).
    pub fn coerce_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Null => None,
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// A shared-identity, interior-mutable cell. Two holders of the same
/// `Pointer` (e.g. a parent port and its `{alias}`-remapped child port)
/// observe each other's writes.
///
/// Single-writer, single-threaded by design (spec's Concurrency & Resource
/// Model): `Rc<RefCell<_>>`, not `Arc<Mutex/RwLock>`.
pub type Pointer = Rc<RefCell<Value>>;

/// Build a fresh, unshared pointer holding `value`.
pub fn new_pointer(value: Value) -> Pointer {
    Rc::new(RefCell::new(value))
}
