//! Runtime value representation.

use std::collections::BTreeMap;

use crate::partition::Partition;
use crate::proxy::ProxyObject;

/// Argument or return value of a host entry point.
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// A materialized partition.
    Partition(Partition),
    /// A partition behind a spill-aware proxy.
    Proxy(ProxyObject),
    /// Array of values.
    Array(Vec<Value>),
    /// Map of string keys to values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value is a proxy.
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    /// Try to get as a materialized partition.
    pub fn as_partition(&self) -> Option<&Partition> {
        match self {
            Self::Partition(p) => Some(p),
            _ => None,
        }
    }

    /// Try to get as a proxy.
    pub fn as_proxy(&self) -> Option<&ProxyObject> {
        match self {
            Self::Proxy(p) => Some(p),
            _ => None,
        }
    }

    /// Partition behind this value, looking through a proxy.
    pub fn referenced_partition(&self) -> Option<&Partition> {
        match self {
            Self::Partition(p) => Some(p),
            Self::Proxy(proxy) => Some(proxy.partition()),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as array slice.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Number of proxies reachable from this value.
    pub fn count_proxies(&self) -> usize {
        match self {
            Self::Proxy(_) => 1,
            Self::Array(values) => values.iter().map(Self::count_proxies).sum(),
            Self::Map(entries) => entries.values().map(Self::count_proxies).sum(),
            _ => 0,
        }
    }

    /// Get the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int64(_) => "Int64",
            Self::Float64(_) => "Float64",
            Self::String(_) => "String",
            Self::Partition(_) => "Partition",
            Self::Proxy(_) => "Proxy",
            Self::Array(_) => "Array",
            Self::Map(_) => "Map",
        }
    }
}

impl From<Partition> for Value {
    fn from(p: Partition) -> Self {
        Self::Partition(p)
    }
}

impl From<ProxyObject> for Value {
    fn from(p: ProxyObject) -> Self {
        Self::Proxy(p)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Array(values)
    }
}
