//! Collection operations of the engine.

use common_error::SpillwayResult;

use crate::entry::RearrangeArgs;
use crate::frame::PartitionedFrame;
use crate::method::{CallSite, ShuffleMethod};
use crate::table::DispatchTable;

/// Runs collection operations against a finished dispatch table.
///
/// Every operation resolves its shuffle method at the call site it belongs
/// to, then calls the table's rearrange entry point with that method.
#[derive(Debug, Clone, Default)]
pub struct FrameEngine {
    table: DispatchTable,
}

impl FrameEngine {
    /// Take ownership of an assembled table.
    pub fn new(table: DispatchTable) -> Self {
        Self { table }
    }

    /// The engine's dispatch table.
    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Shuffle method the given call site would use right now.
    pub fn shuffle_method(&self, site: CallSite) -> SpillwayResult<ShuffleMethod> {
        self.table.resolver(site)?.shuffle_method()
    }

    /// Hash-shuffle a frame so rows with equal keys share a partition.
    pub fn shuffle(
        &self,
        frame: PartitionedFrame,
        on: &[&str],
        npartitions: Option<usize>,
    ) -> SpillwayResult<PartitionedFrame> {
        self.rearrange(CallSite::Shuffle, frame, on, npartitions)
    }

    /// Shuffle two frames onto the same partitioning ahead of a join.
    pub fn copartition(
        &self,
        left: PartitionedFrame,
        right: PartitionedFrame,
        on: &[&str],
        npartitions: Option<usize>,
    ) -> SpillwayResult<(PartitionedFrame, PartitionedFrame)> {
        let npartitions = npartitions
            .unwrap_or_else(|| left.num_partitions().max(right.num_partitions()).max(1));
        let left = self.rearrange(CallSite::Multi, left, on, Some(npartitions))?;
        let right = self.rearrange(CallSite::Multi, right, on, Some(npartitions))?;
        Ok((left, right))
    }

    /// Group bag records by key into `npartitions` partitions.
    pub fn bag_groupby(
        &self,
        frame: PartitionedFrame,
        key: &str,
        npartitions: Option<usize>,
    ) -> SpillwayResult<PartitionedFrame> {
        self.rearrange(CallSite::Bag, frame, &[key], npartitions)
    }

    fn rearrange(
        &self,
        site: CallSite,
        frame: PartitionedFrame,
        on: &[&str],
        npartitions: Option<usize>,
    ) -> SpillwayResult<PartitionedFrame> {
        let method = self.shuffle_method(site)?;
        let mut args = RearrangeArgs::new(frame, on.iter().copied()).with_shuffle_method(method.as_str());
        args.npartitions = npartitions;
        self.table.rearrange_by_column(args)
    }
}
