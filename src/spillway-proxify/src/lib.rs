//! Proxification gate for Spillway.
//!
//! [`proxify`] and [`unproxify`] decorate a function without changing its
//! signature. The first wraps device partitions in the function's result so
//! they become spill-eligible; the second unwraps proxies in the arguments
//! so the function only sees materialized data. [`ProxifyGate`] installs both
//! around the engine's partition split and concat entry points.

#![allow(clippy::module_name_repetitions)]

mod capability;
mod gate;

pub use capability::{DeviceProxies, ProxyStats};
pub use gate::{proxify, unproxify, ProxifyGate};
