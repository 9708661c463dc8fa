//! The engine's dispatch table.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use common_error::{SpillwayError, SpillwayResult};
use spillway_core::Value;

use crate::entry::{
    ConcatArgs, ConcatFn, RearrangeArgs, RearrangeFn, ShuffleGroupArgs, ShuffleGroupFn,
    ShuffleGroups,
};
use crate::frame::PartitionedFrame;
use crate::method::{CallSite, ShuffleMethodResolver, TaskShuffleResolver};
use crate::tasks;

/// A set of replacements installed into the table as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interception {
    /// Shuffle-method dispatch: wrapped rearrange plus every resolver slot.
    ShuffleDispatch,
    /// Proxy wrapping around partition split and concat.
    Proxification,
}

impl std::fmt::Display for Interception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShuffleDispatch => write!(f, "shuffle-dispatch"),
            Self::Proxification => write!(f, "proxification"),
        }
    }
}

/// Every replaceable entry point of the engine.
///
/// The table is assembled and intercepted before a [`FrameEngine`] takes
/// ownership of it, after which it is only read.
///
/// [`FrameEngine`]: crate::FrameEngine
#[derive(Clone)]
pub struct DispatchTable {
    rearrange_by_column: RearrangeFn,
    shuffle_group: ShuffleGroupFn,
    concat: ConcatFn,
    resolvers: BTreeMap<CallSite, Arc<dyn ShuffleMethodResolver>>,
    interceptions: BTreeSet<Interception>,
}

impl DispatchTable {
    /// Table with the task-based implementations at every call site.
    pub fn new() -> Self {
        let builtin: Arc<dyn ShuffleMethodResolver> = Arc::new(TaskShuffleResolver);
        Self {
            rearrange_by_column: Arc::new(tasks::rearrange_by_column),
            shuffle_group: Arc::new(tasks::shuffle_group),
            concat: Arc::new(tasks::concat),
            resolvers: CallSite::ALL
                .iter()
                .map(|&site| (site, Arc::clone(&builtin)))
                .collect(),
            interceptions: BTreeSet::new(),
        }
    }

    /// Drop a call site, as an engine build without that module would.
    pub fn without_call_site(mut self, site: CallSite) -> Self {
        self.resolvers.remove(&site);
        self
    }

    /// Call sites present in this table.
    pub fn call_sites(&self) -> impl Iterator<Item = CallSite> + '_ {
        self.resolvers.keys().copied()
    }

    /// Whether a call site holds a resolver slot.
    pub fn has_call_site(&self, site: CallSite) -> bool {
        self.resolvers.contains_key(&site)
    }

    /// Resolver currently bound at a call site.
    pub fn resolver(&self, site: CallSite) -> SpillwayResult<&Arc<dyn ShuffleMethodResolver>> {
        self.resolvers.get(&site).ok_or_else(|| {
            SpillwayError::internal(format!(
                "no shuffle-method resolver registered at call site '{site}'"
            ))
        })
    }

    /// Point an existing call site at a different resolver.
    pub fn rebind_resolver(
        &mut self,
        site: CallSite,
        resolver: Arc<dyn ShuffleMethodResolver>,
    ) -> SpillwayResult<()> {
        match self.resolvers.get_mut(&site) {
            Some(slot) => {
                *slot = resolver;
                Ok(())
            }
            None => Err(SpillwayError::missing_rebind_target(format!(
                "engine has no shuffle-method resolver at '{site}'"
            ))),
        }
    }

    /// Current rearrange entry point.
    pub fn rearrange_by_column_fn(&self) -> RearrangeFn {
        Arc::clone(&self.rearrange_by_column)
    }

    /// Replace the rearrange entry point, returning the previous one.
    pub fn replace_rearrange_by_column(&mut self, f: RearrangeFn) -> RearrangeFn {
        std::mem::replace(&mut self.rearrange_by_column, f)
    }

    /// Current partition-split entry point.
    pub fn shuffle_group_fn(&self) -> ShuffleGroupFn {
        Arc::clone(&self.shuffle_group)
    }

    /// Replace the partition-split entry point, returning the previous one.
    pub fn replace_shuffle_group(&mut self, f: ShuffleGroupFn) -> ShuffleGroupFn {
        std::mem::replace(&mut self.shuffle_group, f)
    }

    /// Current concatenation entry point.
    pub fn concat_fn(&self) -> ConcatFn {
        Arc::clone(&self.concat)
    }

    /// Replace the concatenation entry point, returning the previous one.
    pub fn replace_concat(&mut self, f: ConcatFn) -> ConcatFn {
        std::mem::replace(&mut self.concat, f)
    }

    /// Whether an interception has been installed.
    pub fn is_intercepted(&self, interception: Interception) -> bool {
        self.interceptions.contains(&interception)
    }

    /// Record an interception. Returns `false` if it was already recorded.
    pub fn mark_intercepted(&mut self, interception: Interception) -> bool {
        self.interceptions.insert(interception)
    }

    /// Run the rearrange entry point.
    pub fn rearrange_by_column(&self, args: RearrangeArgs) -> SpillwayResult<PartitionedFrame> {
        (self.rearrange_by_column)(self, args)
    }

    /// Run the partition-split entry point.
    pub fn shuffle_group(&self, args: ShuffleGroupArgs) -> SpillwayResult<ShuffleGroups> {
        (self.shuffle_group)(args)
    }

    /// Run the concatenation entry point.
    pub fn concat(&self, args: ConcatArgs) -> SpillwayResult<Value> {
        (self.concat)(args)
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("resolvers", &self.resolvers)
            .field("interceptions", &self.interceptions)
            .finish()
    }
}
