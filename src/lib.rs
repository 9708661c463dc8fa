//! Spillway - shuffle dispatch and device-object proxification for GPU
//! dataframe workers.
//!
//! Spillway plugs into a host engine's [`DispatchTable`] before the engine is
//! built. It routes column rearranges to an explicit-comms transport while the
//! `explicit-comms` flag is on, and it wraps device partitions in spill-aware
//! proxies between the partition splitter and the concatenator.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

mod init;

// Re-export component crates
pub use common_config as config;
pub use common_error as error;
pub use spillway_core as core;
pub use spillway_frame as frame;
pub use spillway_proxify as proxify;
pub use spillway_shuffle as shuffle;

pub use common_error::{SpillwayError, SpillwayResult};
pub use init::{ensure_supported_platform, initialize, Interceptors};
pub use spillway_frame::DispatchTable;

/// Spillway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit the library was built from, if `SPILLWAY_GIT_COMMIT` was set at
/// build time.
pub const GIT_COMMIT: Option<&str> = option_env!("SPILLWAY_GIT_COMMIT");
