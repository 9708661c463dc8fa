//! Shuffle-method resolution from live configuration.

use std::sync::Arc;

use common_config::{explicit_comms_enabled, query_planning, ConfigSource};
use common_error::{SpillwayError, SpillwayResult};
use spillway_frame::{ShuffleMethod, ShuffleMethodResolver};

/// Resolves the shuffle method from configuration on every call.
///
/// One dispatcher is shared by every call site of an engine, so all of them
/// agree on the method for a given configuration state.
#[derive(Debug, Clone)]
pub struct ShuffleDispatcher {
    config: Arc<dyn ConfigSource>,
}

impl ShuffleDispatcher {
    /// Create a dispatcher over a configuration source.
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        Self { config }
    }

    /// The configuration this dispatcher reads.
    pub fn config(&self) -> &Arc<dyn ConfigSource> {
        &self.config
    }

    /// `ExplicitComms` if the `explicit-comms` flag is set, else `Tasks`.
    ///
    /// The flag is looked up each time; nothing is cached.
    pub fn resolve_shuffle_method(&self) -> SpillwayResult<ShuffleMethod> {
        if explicit_comms_enabled(self.config.as_ref())? {
            Ok(ShuffleMethod::ExplicitComms)
        } else {
            Ok(ShuffleMethod::Tasks)
        }
    }
}

impl ShuffleMethodResolver for ShuffleDispatcher {
    fn shuffle_method(&self) -> SpillwayResult<ShuffleMethod> {
        self.resolve_shuffle_method()
    }
}

/// Reject configurations that enable explicit-comms alongside query planning.
///
/// Query planning left unset counts as enabled.
pub fn validate_config(config: &dyn ConfigSource) -> SpillwayResult<()> {
    if !explicit_comms_enabled(config)? {
        return Ok(());
    }
    let planning = query_planning(config)?;
    if planning.is_enabled() {
        return Err(SpillwayError::config_conflict(format!(
            "explicit-comms cannot be combined with query planning ({planning}); \
             set 'dataframe.query-planning' to false"
        )));
    }
    Ok(())
}
