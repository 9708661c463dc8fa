//! Reference host dataframe engine for Spillway.
//!
//! This crate models the parts of a distributed dataframe engine that the
//! interception layer plugs into: a [`DispatchTable`] of replaceable entry
//! points, per-module shuffle-method resolvers ([`CallSite`]), and a
//! task-based shuffle built from `shuffle_group` and `concat`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  resolve   ┌──────────────────────┐
//! │ FrameEngine  │ ─────────▶ │ resolver @ CallSite  │
//! │              │            └──────────────────────┘
//! │              │  rearrange ┌──────────────────────┐  split  ┌───────────────┐
//! │              │ ─────────▶ │ rearrange_by_column  │ ──────▶ │ shuffle_group │
//! └──────────────┘            │                      │  merge  ├───────────────┤
//!                             │                      │ ──────▶ │ concat        │
//!                             └──────────────────────┘         └───────────────┘
//! ```

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::return_self_not_must_use)] // Builder patterns don't always need must_use
#![allow(clippy::cast_possible_truncation)] // Hash buckets are bounded by npartitions

mod engine;
mod entry;
mod frame;
mod method;
pub mod partitioning;
mod table;
pub mod tasks;

pub use engine::FrameEngine;
pub use entry::{
    ConcatArgs, ConcatFn, RearrangeArgs, RearrangeFn, ShuffleGroupArgs, ShuffleGroupFn,
    ShuffleGroups,
};
pub use frame::PartitionedFrame;
pub use method::{CallSite, ShuffleMethod, ShuffleMethodResolver, TaskShuffleResolver};
pub use partitioning::HashPartitioner;
pub use table::{DispatchTable, Interception};
