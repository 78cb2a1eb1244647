//! # Workpool
//!
//! A bounded worker pool for short-lived, user-supplied tasks.
//!
//! The pool accepts nullary closures from any number of concurrent producers
//! and executes them on a capped set of long-lived worker threads. Workers are
//! recycled between tasks instead of being respawned, and a background reaper
//! retires workers that have sat idle past a configurable quiescence period.
//!
//! ## Core Problem Solved
//!
//! Spawning one OS thread per task is wasteful for workloads made of many
//! small jobs:
//!
//! - **Thread churn**: per-task spawn/join costs dwarf the task itself
//! - **Unbounded parallelism**: a burst of producers can exhaust the process
//! - **Idle waste**: threads kept around "just in case" hold stacks forever
//!
//! ## Key Features
//!
//! - **Bounded concurrency**: at most `capacity` workers run at any instant
//! - **Backpressure**: submitters park when the pool is saturated, with an
//!   optional cap on parked submitters and a fail-fast non-blocking mode
//! - **Idle reclamation**: a periodic reaper retires workers idle longer
//!   than the expiry duration
//! - **Panic containment**: a panicking task never takes the pool down; the
//!   worker survives and the payload is reported to a configurable hook
//! - **Lifecycle control**: close a pool, wake every parked submitter, and
//!   reboot it later
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use workpool::builders::PoolBuilder;
//!
//! let pool = PoolBuilder::new(4).build().expect("pool");
//! let counter = Arc::new(AtomicUsize::new(0));
//! for _ in 0..100 {
//!     let counter = Arc::clone(&counter);
//!     pool.submit(move || {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     })
//!     .expect("submit");
//! }
//! pool.release();
//! ```
//!
//! For complete examples, see:
//! - `tests/pool_test.rs` - Saturation, backpressure, and panic scenarios
//! - `tests/lifecycle_test.rs` - Release, reboot, and reclamation scenarios

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core pool machinery: controller, workers, idle storage, reaper, cache.
pub mod core;
/// Configuration models for pool options.
pub mod config;
/// Builders to construct pools from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
