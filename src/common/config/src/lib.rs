//! Configuration management for Spillway.
//!
//! Configuration is owned by the host process and read through the
//! [`ConfigSource`] lookup. Spillway never writes to it; every decision reads
//! the current value at call time.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use common_error::SpillwayResult;

mod source;

pub use source::{
    explicit_comms_enabled, query_planning, ConfigSource, ConfigStack, ConfigValue, EnvConfig,
    SharedConfig,
};

/// Key of the explicit-comms enable flag.
pub const EXPLICIT_COMMS_KEY: &str = "explicit-comms";

/// Key of the dataframe query-planning mode flag.
pub const QUERY_PLANNING_KEY: &str = "dataframe.query-planning";

/// Global Spillway configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpillwayConfig {
    /// Route column rearranges through the explicit-comms transport.
    #[serde(default)]
    pub explicit_comms: bool,
    /// Dataframe engine configuration.
    #[serde(default)]
    pub dataframe: DataFrameConfig,
}

/// Dataframe engine settings consulted by the interception layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataFrameConfig {
    /// Query-planning mode. `None` leaves it unspecified.
    #[serde(default)]
    pub query_planning: Option<bool>,
}

impl SpillwayConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> SpillwayResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SpillwayResult<Self> {
        let path = path.as_ref();
        let config = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Enable or disable explicit-comms.
    pub fn with_explicit_comms(mut self, enabled: bool) -> Self {
        self.explicit_comms = enabled;
        self
    }

    /// Set the query-planning mode (`None` leaves it unspecified).
    pub fn with_query_planning(mut self, mode: Option<bool>) -> Self {
        self.dataframe.query_planning = mode;
        self
    }
}

/// Query-planning mode of the host dataframe engine.
///
/// The host enables query planning unless it is switched off, so an
/// unspecified setting counts as enabled. Only an explicit `false`
/// disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryPlanning {
    /// Explicitly enabled.
    Enabled,
    /// Explicitly disabled.
    Disabled,
    /// Not set; treated as enabled.
    Unspecified,
}

impl QueryPlanning {
    /// Build the mode from an optional flag.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Self::Enabled,
            Some(false) => Self::Disabled,
            None => Self::Unspecified,
        }
    }

    /// Whether query planning is in effect.
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl std::fmt::Display for QueryPlanning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}
