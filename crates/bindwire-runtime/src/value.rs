//! Host-side structured values
//!
//! `HostValue` models what a dynamically-typed runtime hands to a binding:
//! integers are 64-bit signed, floats are `f64`, dictionaries are keyed by
//! hashable host values.

use std::collections::BTreeMap;
use std::fmt;

/// Dictionary key on the host side
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostKey {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl HostKey {
    /// Host type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            HostKey::Int(_) => "int",
            HostKey::Bool(_) => "bool",
            HostKey::Str(_) => "str",
        }
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKey::Int(i) => write!(f, "{}", i),
            HostKey::Bool(b) => write!(f, "{}", b),
            HostKey::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for HostKey {
    fn from(i: i64) -> Self {
        HostKey::Int(i)
    }
}

impl From<bool> for HostKey {
    fn from(b: bool) -> Self {
        HostKey::Bool(b)
    }
}

impl From<&str> for HostKey {
    fn from(s: &str) -> Self {
        HostKey::Str(s.to_string())
    }
}

impl From<String> for HostKey {
    fn from(s: String) -> Self {
        HostKey::Str(s)
    }
}

/// Host runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<HostValue>),
    List(Vec<HostValue>),
    Dict(BTreeMap<HostKey, HostValue>),
}

impl HostValue {
    /// Host type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::None => "None",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "str",
            HostValue::Tuple(_) => "tuple",
            HostValue::List(_) => "list",
            HostValue::Dict(_) => "dict",
        }
    }

    /// True for tuples, lists and dictionaries
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            HostValue::Tuple(_) | HostValue::List(_) | HostValue::Dict(_)
        )
    }

    /// Build a dictionary from key/value pairs
    pub fn dict<K, V, I>(entries: I) -> Self
    where
        K: Into<HostKey>,
        V: Into<HostValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        HostValue::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Int(i)
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(s)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(items: Vec<T>) -> Self {
        HostValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<HostKey> for HostValue {
    fn from(key: HostKey) -> Self {
        match key {
            HostKey::Int(i) => HostValue::Int(i),
            HostKey::Bool(b) => HostValue::Bool(b),
            HostKey::Str(s) => HostValue::Str(s),
        }
    }
}
