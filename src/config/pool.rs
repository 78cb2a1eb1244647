//! Pool configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::PoolError;

/// Expiry applied when none is configured: idle workers are retired after a
/// second, checked once a second.
pub const DEFAULT_EXPIRY_DURATION: Duration = Duration::from_secs(1);

/// Tunable pool options.
///
/// All fields have usable defaults, so a partial JSON document deserializes
/// into a valid configuration. The panic handler is not part of this model
/// (it is not serializable); set it on the builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Idle-worker reap interval and idleness threshold. `None` applies
    /// [`DEFAULT_EXPIRY_DURATION`]; an explicit zero is rejected at
    /// construction.
    pub expiry_duration: Option<Duration>,

    /// Pre-allocate a ring container of exactly the pool capacity. Requires
    /// a positive pool size and pins the capacity: `tune` becomes a no-op.
    pub pre_alloc: bool,

    /// Upper bound on simultaneously parked submitters. `0` means unlimited.
    pub max_blocking_tasks: usize,

    /// Fail a saturated submit immediately instead of parking.
    pub nonblocking: bool,

    /// Skip spawning the expiry reaper. Idle workers then live until the
    /// pool is released.
    pub disable_purge: bool,
}

impl PoolConfig {
    /// Validate the options against the requested pool size.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidPoolExpiry`] for an explicit zero expiry
    /// - [`PoolError::InvalidPreAllocSize`] for pre-allocation with a
    ///   non-positive size
    pub fn validate(&self, size: i32) -> Result<(), PoolError> {
        if self.expiry_duration == Some(Duration::ZERO) {
            return Err(PoolError::InvalidPoolExpiry);
        }
        if self.pre_alloc && size <= 0 {
            return Err(PoolError::InvalidPreAllocSize);
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] when the document does not parse.
    pub fn from_json_str(input: &str) -> Result<Self, PoolError> {
        serde_json::from_str(input).map_err(|e| PoolError::InvalidConfig(e.to_string()))
    }
}
