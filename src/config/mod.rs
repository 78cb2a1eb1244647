//! Configuration models for pool options.

pub mod pool;

pub use pool::{PoolConfig, DEFAULT_EXPIRY_DURATION};
