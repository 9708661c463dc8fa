//! Entry-point signatures of the host engine.
//!
//! Each entry point is a shared function value held by the
//! [`DispatchTable`](crate::DispatchTable). Interceptions replace a slot with
//! a function of the same type that calls the previous one.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow_schema::SchemaRef;

use common_error::SpillwayResult;
use spillway_core::{ProxyCapability, ProxyTree, Value};

use crate::frame::PartitionedFrame;
use crate::table::DispatchTable;

/// Pieces of one input partition, keyed by output partition.
pub type ShuffleGroups = BTreeMap<usize, Value>;

/// Redistribute a collection by key columns.
pub type RearrangeFn =
    Arc<dyn Fn(&DispatchTable, RearrangeArgs) -> SpillwayResult<PartitionedFrame> + Send + Sync>;

/// Split one partition into per-output pieces.
pub type ShuffleGroupFn = Arc<dyn Fn(ShuffleGroupArgs) -> SpillwayResult<ShuffleGroups> + Send + Sync>;

/// Concatenate pieces into one partition.
pub type ConcatFn = Arc<dyn Fn(ConcatArgs) -> SpillwayResult<Value> + Send + Sync>;

/// Arguments of a column rearrange.
#[derive(Debug, Clone)]
pub struct RearrangeArgs {
    /// Collection to redistribute.
    pub frame: PartitionedFrame,
    /// Key columns.
    pub columns: Vec<String>,
    /// Output partition count; defaults to the input count.
    pub npartitions: Option<usize>,
    /// Method requested by the caller, if any.
    pub shuffle_method: Option<String>,
}

impl RearrangeArgs {
    /// Rearrange `frame` by `columns` with default options.
    pub fn new<I, S>(frame: PartitionedFrame, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            frame,
            columns: columns.into_iter().map(Into::into).collect(),
            npartitions: None,
            shuffle_method: None,
        }
    }

    /// Set the output partition count.
    pub fn with_npartitions(mut self, npartitions: usize) -> Self {
        self.npartitions = Some(npartitions);
        self
    }

    /// Request a specific shuffle method.
    pub fn with_shuffle_method(mut self, method: impl Into<String>) -> Self {
        self.shuffle_method = Some(method.into());
        self
    }

    /// Output partition count after applying the default.
    pub fn output_partitions(&self) -> usize {
        self.npartitions
            .unwrap_or_else(|| self.frame.num_partitions().max(1))
    }
}

impl ProxyTree for RearrangeArgs {
    fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        Ok(Self {
            frame: self.frame.proxify_with(proxies)?,
            ..self
        })
    }

    fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        Ok(Self {
            frame: self.frame.unproxify_with(proxies)?,
            ..self
        })
    }
}

/// Arguments of a partition split.
#[derive(Debug, Clone)]
pub struct ShuffleGroupArgs {
    /// Partition to split.
    pub partition: Value,
    /// Key columns.
    pub columns: Vec<String>,
    /// Number of output partitions.
    pub npartitions: usize,
}

impl ProxyTree for ShuffleGroupArgs {
    fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        Ok(Self {
            partition: self.partition.proxify_with(proxies)?,
            ..self
        })
    }

    fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        Ok(Self {
            partition: self.partition.unproxify_with(proxies)?,
            ..self
        })
    }
}

/// Arguments of a partition concatenation.
#[derive(Debug, Clone)]
pub struct ConcatArgs {
    /// Pieces to concatenate, in order.
    pub parts: Vec<Value>,
    /// Schema of the result, used when `parts` is empty.
    pub schema: SchemaRef,
}

impl ProxyTree for ConcatArgs {
    fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        Ok(Self {
            parts: self.parts.proxify_with(proxies)?,
            schema: self.schema,
        })
    }

    fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        Ok(Self {
            parts: self.parts.unproxify_with(proxies)?,
            schema: self.schema,
        })
    }
}
