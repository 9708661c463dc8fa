//! Error types and result aliases for Spillway.
//!
//! Every crate in the workspace reports failures through [`SpillwayError`].
//! The interception layer never translates errors raised by the functions it
//! wraps, so the same type flows from the host engine, the transport and the
//! proxy capability up to the caller.

mod error;

pub use error::{SpillwayError, SpillwayResult};
