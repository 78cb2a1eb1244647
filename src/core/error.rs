//! Error types for pool operations.

use thiserror::Error;

/// Errors produced by the pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The configured expiry duration cannot drive the reaper. With a
    /// `Duration` there is exactly one degenerate value: an explicit zero.
    /// Leaving the expiry unset applies the default instead.
    #[error("invalid expiry duration for pool")]
    InvalidPoolExpiry,

    /// Pre-allocation was requested for a non-positive pool size.
    #[error("pre-allocation requires a positive pool size")]
    InvalidPreAllocSize,

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The pool has been closed. Terminal until [`reboot`](crate::core::Pool::reboot).
    #[error("pool has been closed")]
    PoolClosed,

    /// The pool is at capacity and no blocking slot is available: either
    /// non-blocking mode is set, or `max_blocking_tasks` submitters are
    /// already parked (`0` means unlimited). Transient; the caller may retry.
    #[error("pool is at capacity and cannot take more tasks")]
    PoolOverload,

    /// The worker container refused an insert. The ring always has room for
    /// a running worker, so seeing this indicates a bug; the refused revert
    /// retires the worker rather than corrupting pool state.
    #[error("worker queue is full")]
    QueueIsFull,

    /// The operation did not complete within its deadline.
    #[error("operation timed out")]
    OperationTimeout,
}
