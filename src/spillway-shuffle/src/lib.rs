//! Shuffle-method dispatch for Spillway.
//!
//! A [`ShuffleDispatcher`] reads the `explicit-comms` flag from live
//! configuration and decides whether a rearrange runs on the engine's
//! task-based shuffle or on an explicit-comms transport. A
//! [`ShuffleInterception`] installs it into a host [`DispatchTable`]:
//!
//! ```text
//!                     ┌────────────────────────────┐
//!   rearrange ──────▶ │ wrap_rearrange_by_column   │── Tasks ─────────▶ original
//!                     │   dispatcher.resolve()     │── ExplicitComms ─▶ transport
//!                     └────────────────────────────┘
//!   resolver @ dataframe.shuffle ┐
//!   resolver @ dataframe.multi   ├──▶ Arc<ShuffleDispatcher>
//!   resolver @ bag.core          ┘
//! ```
//!
//! [`LocalExplicitComms`] is an in-process transport that can stand in for a
//! networked one.
//!
//! [`DispatchTable`]: spillway_frame::DispatchTable

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)] // Row and byte counts fit in u64

pub mod comms;
mod dispatcher;
mod install;
mod rearrange;

pub use comms::{CommsConfig, CommsTotals, ExchangeStats, IpcCodec, LocalExplicitComms};
pub use dispatcher::{validate_config, ShuffleDispatcher};
pub use install::ShuffleInterception;
pub use rearrange::wrap_rearrange_by_column;
