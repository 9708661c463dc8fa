//! One-shot installation of every interception into a host engine.

use std::sync::Arc;

use log::info;

use common_config::{explicit_comms_enabled, ConfigSource};
use common_error::{SpillwayError, SpillwayResult};
use spillway_core::ProxyCapability;
use spillway_frame::{DispatchTable, RearrangeFn};
use spillway_proxify::{DeviceProxies, ProxifyGate};
use spillway_shuffle::{validate_config, LocalExplicitComms, ShuffleDispatcher, ShuffleInterception};

/// Downstream collaborators the interceptions delegate to.
#[derive(Clone)]
pub struct Interceptors {
    /// Rearrange used while explicit-comms is on.
    pub transport: RearrangeFn,
    /// Capability that wraps device partitions.
    pub proxies: Arc<dyn ProxyCapability>,
}

impl Interceptors {
    /// Pair a transport with a proxy capability.
    pub fn new(transport: RearrangeFn, proxies: Arc<dyn ProxyCapability>) -> Self {
        Self { transport, proxies }
    }
}

impl Default for Interceptors {
    fn default() -> Self {
        Self {
            transport: Arc::new(LocalExplicitComms::default()).into_rearrange_fn(),
            proxies: Arc::new(DeviceProxies::new()),
        }
    }
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("proxies", &self.proxies)
            .finish_non_exhaustive()
    }
}

/// Fail unless running on a platform the device stack supports.
pub fn ensure_supported_platform() -> SpillwayResult<()> {
    if cfg!(target_os = "linux") {
        Ok(())
    } else {
        Err(SpillwayError::unsupported_platform(format!(
            "spillway requires Linux, running on {}",
            std::env::consts::OS
        )))
    }
}

/// Install shuffle dispatch and proxification into `table`.
///
/// Runs once before the engine takes the table. Any error leaves the table
/// without shuffle dispatch; configuration conflicts and missing call sites
/// are detected before anything is rebound.
pub fn initialize(
    config: Arc<dyn ConfigSource>,
    table: &mut DispatchTable,
    interceptors: Interceptors,
) -> SpillwayResult<()> {
    ensure_supported_platform()?;
    validate_config(config.as_ref())?;

    let dispatcher = Arc::new(ShuffleDispatcher::new(Arc::clone(&config)));
    ShuffleInterception::new(dispatcher, interceptors.transport).install(table)?;
    ProxifyGate::new(interceptors.proxies).install(table);

    info!(
        "spillway {} initialized (explicit-comms: {})",
        crate::VERSION,
        explicit_comms_enabled(config.as_ref())?
    );
    Ok(())
}
