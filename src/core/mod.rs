//! Core pool machinery: controller, workers, idle storage, reaper, cache.

pub mod error;
pub mod pool;

pub(crate) mod cache;
pub(crate) mod queue;
pub(crate) mod reaper;
pub(crate) mod worker;

pub use error::PoolError;
pub use pool::{PanicHandler, Pool};
