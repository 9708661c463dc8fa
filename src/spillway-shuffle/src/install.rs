//! Installing shuffle dispatch into an engine's dispatch table.

use std::sync::Arc;

use log::{info, warn};

use common_error::{SpillwayError, SpillwayResult};
use spillway_frame::{CallSite, DispatchTable, Interception, RearrangeFn, ShuffleMethodResolver};

use crate::dispatcher::{validate_config, ShuffleDispatcher};
use crate::rearrange::wrap_rearrange_by_column;

/// Shuffle dispatch ready to be installed into a [`DispatchTable`].
#[derive(Clone)]
pub struct ShuffleInterception {
    dispatcher: Arc<ShuffleDispatcher>,
    transport: RearrangeFn,
}

impl ShuffleInterception {
    /// Pair a dispatcher with the explicit-comms transport it routes to.
    pub fn new(dispatcher: Arc<ShuffleDispatcher>, transport: RearrangeFn) -> Self {
        Self {
            dispatcher,
            transport,
        }
    }

    /// The shared dispatcher.
    pub fn dispatcher(&self) -> &Arc<ShuffleDispatcher> {
        &self.dispatcher
    }

    /// Install the wrapped rearrange and point every call site at the dispatcher.
    ///
    /// Validation and the call-site check run before anything is rebound, so
    /// a failed install leaves the table as it was. Returns `Ok(false)` if
    /// shuffle dispatch was already installed.
    pub fn install(&self, table: &mut DispatchTable) -> SpillwayResult<bool> {
        validate_config(self.dispatcher.config().as_ref())?;

        if table.is_intercepted(Interception::ShuffleDispatch) {
            warn!("shuffle dispatch already installed; skipping");
            return Ok(false);
        }

        if let Some(missing) = CallSite::ALL.iter().find(|&&site| !table.has_call_site(site)) {
            return Err(SpillwayError::missing_rebind_target(format!(
                "engine has no shuffle-method resolver at '{missing}'"
            )));
        }

        let original = table.rearrange_by_column_fn();
        table.replace_rearrange_by_column(wrap_rearrange_by_column(
            Arc::clone(&self.dispatcher),
            original,
            Arc::clone(&self.transport),
        ));

        let resolver: Arc<dyn ShuffleMethodResolver> = self.dispatcher.clone();
        for site in CallSite::ALL {
            table.rebind_resolver(site, Arc::clone(&resolver))?;
        }
        table.mark_intercepted(Interception::ShuffleDispatch);

        info!(
            "installed shuffle dispatch at {} call sites",
            CallSite::ALL.len()
        );
        Ok(true)
    }
}

impl std::fmt::Debug for ShuffleInterception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShuffleInterception")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
