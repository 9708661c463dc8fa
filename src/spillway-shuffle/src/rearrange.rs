//! The dispatching wrapper around the engine's rearrange entry point.

use std::sync::Arc;

use log::debug;

use spillway_frame::{DispatchTable, RearrangeArgs, RearrangeFn, ShuffleMethod};

use crate::dispatcher::ShuffleDispatcher;

/// Whether a caller-requested method may be overridden by explicit-comms.
///
/// Engine-specific methods other than the two known ones are left to the
/// original implementation.
fn transport_accepts(requested: Option<&str>) -> bool {
    match requested {
        None => true,
        Some(method) => {
            method == ShuffleMethod::Tasks.as_str()
                || method == ShuffleMethod::ExplicitComms.as_str()
        }
    }
}

/// Wrap `original` so rearranges go to `transport` while explicit-comms is on.
///
/// The method is resolved on every call. Both delegates receive the
/// arguments unchanged, and their results and errors are returned as-is.
pub fn wrap_rearrange_by_column(
    dispatcher: Arc<ShuffleDispatcher>,
    original: RearrangeFn,
    transport: RearrangeFn,
) -> RearrangeFn {
    Arc::new(move |table: &DispatchTable, args: RearrangeArgs| {
        let method = dispatcher.resolve_shuffle_method()?;
        if method == ShuffleMethod::ExplicitComms && transport_accepts(args.shuffle_method.as_deref())
        {
            debug!(
                "routing rearrange of {} partitions on {:?} to explicit-comms",
                args.frame.num_partitions(),
                args.columns
            );
            transport(table, args)
        } else {
            original(table, args)
        }
    })
}
