//! Reference proxy capability.

use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;

use common_error::{SpillwayError, SpillwayResult};
use spillway_core::{Partition, ProxyCapability, ProxyId, ProxyObject};

/// Wrap/unwrap counters of a [`DeviceProxies`] capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyStats {
    /// Proxies created.
    pub wrapped: u64,
    /// Proxies unwrapped.
    pub unwrapped: u64,
}

impl ProxyStats {
    /// Proxies created but not yet unwrapped.
    pub fn outstanding(&self) -> u64 {
        self.wrapped.saturating_sub(self.unwrapped)
    }
}

/// Proxy capability that substitutes partitions by reference.
///
/// Ids are unique per capability and increase monotonically.
#[derive(Debug, Default)]
pub struct DeviceProxies {
    next_id: AtomicU64,
    unwrapped: AtomicU64,
}

impl DeviceProxies {
    /// Create a capability with fresh counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> ProxyStats {
        ProxyStats {
            wrapped: self.next_id.load(Ordering::SeqCst),
            unwrapped: self.unwrapped.load(Ordering::SeqCst),
        }
    }
}

impl ProxyCapability for DeviceProxies {
    fn wrap(&self, partition: Partition) -> SpillwayResult<ProxyObject> {
        if !partition.is_device() {
            return Err(SpillwayError::type_error(format!(
                "only device partitions can be proxied, got {} partition",
                partition.residency()
            )));
        }
        let id = ProxyId(self.next_id.fetch_add(1, Ordering::SeqCst));
        trace!(
            "wrapped {} rows ({} bytes) from {} as {id}",
            partition.num_rows(),
            partition.nbytes(),
            partition.residency()
        );
        Ok(ProxyObject::new(id, partition))
    }

    fn unwrap(&self, proxy: ProxyObject) -> SpillwayResult<Partition> {
        self.unwrapped.fetch_add(1, Ordering::SeqCst);
        trace!("unwrapped {}", proxy.id());
        Ok(proxy.into_partition())
    }
}
