//! Builder to construct a pool from options.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use crate::config::pool::PoolConfig;
use crate::core::error::PoolError;
use crate::core::pool::{PanicHandler, Pool};

/// Builder for [`Pool`].
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use workpool::builders::PoolBuilder;
///
/// let pool = PoolBuilder::new(8)
///     .with_expiry_duration(Duration::from_secs(10))
///     .with_max_blocking_tasks(32)
///     .build()
///     .expect("pool");
/// # drop(pool);
/// ```
pub struct PoolBuilder {
    size: i32,
    config: PoolConfig,
    panic_handler: Option<PanicHandler>,
}

impl PoolBuilder {
    /// Start from a pool size. Non-positive means unbounded.
    #[must_use]
    pub fn new(size: i32) -> Self {
        Self {
            size,
            config: PoolConfig::default(),
            panic_handler: None,
        }
    }

    /// Replace the whole option set, e.g. one parsed from JSON.
    #[must_use]
    pub fn with_config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Idle-worker reap interval and idleness threshold.
    #[must_use]
    pub fn with_expiry_duration(mut self, expiry: Duration) -> Self {
        self.config.expiry_duration = Some(expiry);
        self
    }

    /// Pre-allocate a ring container of exactly the pool capacity.
    #[must_use]
    pub fn with_pre_alloc(mut self, pre_alloc: bool) -> Self {
        self.config.pre_alloc = pre_alloc;
        self
    }

    /// Upper bound on simultaneously parked submitters. `0` means unlimited.
    #[must_use]
    pub fn with_max_blocking_tasks(mut self, max_blocking_tasks: usize) -> Self {
        self.config.max_blocking_tasks = max_blocking_tasks;
        self
    }

    /// Fail a saturated submit immediately instead of parking.
    #[must_use]
    pub fn with_nonblocking(mut self, nonblocking: bool) -> Self {
        self.config.nonblocking = nonblocking;
        self
    }

    /// Skip the expiry reaper; idle workers then live until release.
    #[must_use]
    pub fn with_purge_disabled(mut self, disabled: bool) -> Self {
        self.config.disable_purge = disabled;
        self
    }

    /// Hook invoked with the payload of any task that panics. Without one,
    /// payloads are logged through `tracing`.
    #[must_use]
    pub fn with_panic_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Box<dyn Any + Send>) + Send + Sync + 'static,
    {
        self.panic_handler = Some(Arc::new(handler));
        self
    }

    /// Validate the options and construct the pool.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of
    /// [`PoolConfig::validate`](crate::config::PoolConfig::validate).
    pub fn build(self) -> Result<Pool, PoolError> {
        Pool::construct(self.size, self.config, self.panic_handler)
    }
}

impl Default for PoolBuilder {
    /// A builder sized to the number of logical CPUs.
    fn default() -> Self {
        Self::new(num_cpus::get() as i32)
    }
}
