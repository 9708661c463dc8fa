//! Function decorators that proxify results and unproxify arguments.

use std::sync::Arc;

use log::{info, warn};

use common_error::SpillwayResult;
use spillway_core::{ProxyCapability, ProxyTree};
use spillway_frame::{ConcatArgs, DispatchTable, Interception, ShuffleGroupArgs};

/// Decorate `original` so device partitions in its result come back proxied.
///
/// Arguments are passed through untouched. Errors from `original` or from
/// the capability are returned as-is.
pub fn proxify<A, R, F>(
    proxies: Arc<dyn ProxyCapability>,
    original: F,
) -> impl Fn(A) -> SpillwayResult<R> + Send + Sync
where
    F: Fn(A) -> SpillwayResult<R> + Send + Sync,
    R: ProxyTree,
{
    move |args| original(args)?.proxify_with(proxies.as_ref())
}

/// Decorate `original` so it receives arguments with every proxy unwrapped.
///
/// The result is returned untouched.
pub fn unproxify<A, R, F>(
    proxies: Arc<dyn ProxyCapability>,
    original: F,
) -> impl Fn(A) -> SpillwayResult<R> + Send + Sync
where
    F: Fn(A) -> SpillwayResult<R> + Send + Sync,
    A: ProxyTree,
{
    move |args| original(args.unproxify_with(proxies.as_ref())?)
}

/// Installs proxification around the engine's split and concat functions.
#[derive(Debug, Clone)]
pub struct ProxifyGate {
    proxies: Arc<dyn ProxyCapability>,
}

impl ProxifyGate {
    /// Create a gate over a proxy capability.
    pub fn new(proxies: Arc<dyn ProxyCapability>) -> Self {
        Self { proxies }
    }

    /// The capability used by this gate.
    pub fn proxies(&self) -> &Arc<dyn ProxyCapability> {
        &self.proxies
    }

    /// [`proxify`] with this gate's capability.
    pub fn proxify<A, R, F>(&self, original: F) -> impl Fn(A) -> SpillwayResult<R> + Send + Sync
    where
        F: Fn(A) -> SpillwayResult<R> + Send + Sync,
        R: ProxyTree,
    {
        proxify(Arc::clone(&self.proxies), original)
    }

    /// [`unproxify`] with this gate's capability.
    pub fn unproxify<A, R, F>(&self, original: F) -> impl Fn(A) -> SpillwayResult<R> + Send + Sync
    where
        F: Fn(A) -> SpillwayResult<R> + Send + Sync,
        A: ProxyTree,
    {
        unproxify(Arc::clone(&self.proxies), original)
    }

    /// Rebind `shuffle_group` to its proxified form and `concat` to its
    /// unproxified form.
    ///
    /// Returns `false` without touching the table if the gate was already
    /// installed.
    pub fn install(&self, table: &mut DispatchTable) -> bool {
        if !table.mark_intercepted(Interception::Proxification) {
            warn!("proxification already installed; skipping");
            return false;
        }

        let split = table.shuffle_group_fn();
        table.replace_shuffle_group(Arc::new(
            self.proxify(move |args: ShuffleGroupArgs| split(args)),
        ));

        let concat = table.concat_fn();
        table.replace_concat(Arc::new(self.unproxify(move |args: ConcatArgs| concat(args))));

        info!("installed proxification around shuffle_group and concat");
        true
    }
}
