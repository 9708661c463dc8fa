//! Key-value lookup over process configuration.

use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

use common_error::{SpillwayError, SpillwayResult};

use crate::{QueryPlanning, SpillwayConfig, EXPLICIT_COMMS_KEY, QUERY_PLANNING_KEY};

/// A raw configuration value as stored by a [`ConfigSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// Explicitly unset.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Unparsed string, e.g. from an environment variable.
    String(String),
}

impl ConfigValue {
    /// Interpret this value as an optional boolean flag.
    ///
    /// Accepts booleans, `0`/`1`, and the usual textual spellings. `null`,
    /// `none` and the empty string mean unset.
    pub fn as_flag(&self, key: &str) -> SpillwayResult<Option<bool>> {
        match self {
            Self::Null => Ok(None),
            Self::Bool(b) => Ok(Some(*b)),
            Self::Int(0) => Ok(Some(false)),
            Self::Int(1) => Ok(Some(true)),
            Self::Int(other) => Err(SpillwayError::value_error(format!(
                "config key '{key}' expects a boolean, got integer {other}"
            ))),
            Self::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "" | "null" | "none" => Ok(None),
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(SpillwayError::value_error(format!(
                    "config key '{key}' expects a boolean, got '{raw}'"
                ))),
            },
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Option<bool>> for ConfigValue {
    fn from(flag: Option<bool>) -> Self {
        flag.map_or(Self::Null, Self::Bool)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// Read-only key-value view of process configuration.
///
/// Implementations must answer from the current state on every call.
pub trait ConfigSource: Send + Sync + Debug {
    /// Look up a key. `None` means the key is absent.
    fn get(&self, key: &str) -> Option<ConfigValue>;
}

/// Whether the explicit-comms flag is set. Absent keys default to `false`.
pub fn explicit_comms_enabled(source: &dyn ConfigSource) -> SpillwayResult<bool> {
    match source.get(EXPLICIT_COMMS_KEY) {
        Some(value) => Ok(value.as_flag(EXPLICIT_COMMS_KEY)?.unwrap_or(false)),
        None => Ok(false),
    }
}

/// Current query-planning mode. Absent keys are [`QueryPlanning::Unspecified`].
pub fn query_planning(source: &dyn ConfigSource) -> SpillwayResult<QueryPlanning> {
    let flag = match source.get(QUERY_PLANNING_KEY) {
        Some(value) => value.as_flag(QUERY_PLANNING_KEY)?,
        None => None,
    };
    Ok(QueryPlanning::from_flag(flag))
}

impl ConfigSource for SpillwayConfig {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        match key {
            EXPLICIT_COMMS_KEY => Some(ConfigValue::Bool(self.explicit_comms)),
            QUERY_PLANNING_KEY => Some(self.dataframe.query_planning.into()),
            _ => None,
        }
    }
}

/// Configuration shared with an owner that may change it between calls.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<SpillwayConfig>>,
}

impl SharedConfig {
    /// Wrap a configuration for shared access.
    pub fn new(config: SpillwayConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Apply a change. Readers observe it on their next lookup.
    pub fn update(&self, change: impl FnOnce(&mut SpillwayConfig)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut *guard);
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> SpillwayConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ConfigSource for SharedConfig {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
    }
}

/// Configuration read from environment variables at lookup time.
///
/// `explicit-comms` maps to `SPILLWAY_EXPLICIT_COMMS` and
/// `dataframe.query-planning` to `SPILLWAY_DATAFRAME__QUERY_PLANNING`.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    prefix: String,
}

impl EnvConfig {
    /// Default variable prefix.
    pub const DEFAULT_PREFIX: &'static str = "SPILLWAY";

    /// Create an environment source with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for a config key.
    pub fn var_name(&self, key: &str) -> String {
        let suffix = key
            .split('.')
            .map(|segment| segment.replace('-', "_").to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join("__");
        format!("{}_{}", self.prefix, suffix)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }
}

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        std::env::var(self.var_name(key))
            .ok()
            .map(ConfigValue::String)
    }
}

/// Layered lookup: the first layer that has a key wins.
#[derive(Debug, Clone, Default)]
pub struct ConfigStack {
    layers: Vec<Arc<dyn ConfigSource>>,
}

impl ConfigStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer below the existing ones.
    pub fn layer(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.layers.push(source);
        self
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl ConfigSource for ConfigStack {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}
