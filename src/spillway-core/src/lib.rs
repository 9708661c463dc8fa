//! Core value model for Spillway.
//!
//! Host entry points exchange [`Value`]s. Device-resident data travels as
//! [`Partition`]s, and the proxification layer substitutes them with
//! [`ProxyObject`]s by reference. The [`ProxyTree`] trait describes how any
//! argument or return type is walked to find those leaves.

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::return_self_not_must_use)] // Builder patterns don't always need must_use

mod partition;
mod proxy;
mod value;

pub use partition::{Partition, Residency};
pub use proxy::{ProxyCapability, ProxyId, ProxyObject, ProxyTree};
pub use value::Value;
