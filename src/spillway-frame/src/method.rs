//! Shuffle methods and the call sites that resolve them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use common_error::{SpillwayError, SpillwayResult};

/// Redistribution strategy used by a column rearrange.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShuffleMethod {
    /// Generic task-graph shuffle native to the engine.
    #[default]
    Tasks,
    /// Point-to-point transfer between workers.
    ExplicitComms,
}

impl ShuffleMethod {
    /// Wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::ExplicitComms => "explicit-comms",
        }
    }
}

impl std::fmt::Display for ShuffleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShuffleMethod {
    type Err = SpillwayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tasks" => Ok(Self::Tasks),
            "explicit-comms" => Ok(Self::ExplicitComms),
            other => Err(SpillwayError::value_error(format!(
                "unknown shuffle method '{other}'"
            ))),
        }
    }
}

/// Decides which shuffle method an operation uses.
pub trait ShuffleMethodResolver: Send + Sync + std::fmt::Debug {
    /// The method to use for the operation being planned.
    fn shuffle_method(&self) -> SpillwayResult<ShuffleMethod>;
}

/// The engine's built-in resolver: always the task-based shuffle.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskShuffleResolver;

impl ShuffleMethodResolver for TaskShuffleResolver {
    fn shuffle_method(&self) -> SpillwayResult<ShuffleMethod> {
        Ok(ShuffleMethod::Tasks)
    }
}

/// Engine module that resolves a shuffle method on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CallSite {
    /// Dataframe shuffles (`shuffle`, `set_index`-style redistribution).
    Shuffle,
    /// Multi-frame operations (joins and co-partitioning).
    Multi,
    /// Bag grouping.
    Bag,
}

impl CallSite {
    /// Every call site known to the engine.
    pub const ALL: [Self; 3] = [Self::Shuffle, Self::Multi, Self::Bag];

    /// Dotted module name of the call site.
    pub fn module(self) -> &'static str {
        match self {
            Self::Shuffle => "dataframe.shuffle",
            Self::Multi => "dataframe.multi",
            Self::Bag => "bag.core",
        }
    }
}

impl std::fmt::Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.module())
    }
}
