//! Idle-worker storage.
//!
//! Two interchangeable containers hold workers between tasks: a growable
//! LIFO stack for lazily-created pools and a pre-allocated ring for
//! pre-allocating pools. Both keep workers ordered by recycle time, which is
//! non-decreasing because every insert goes through the pool's revert path
//! and is stamped under the pool lock. Expiry retrieval relies on that order
//! to binary-search the expired prefix.

mod ring;
mod stack;

pub(crate) use ring::RingQueue;
pub(crate) use stack::StackQueue;

use std::time::{Duration, Instant};

use crate::core::worker::{Worker, WorkerMessage};

/// Contract shared by the stack and ring containers.
pub(crate) trait WorkerQueue: Send {
    /// Number of idle workers stored.
    fn len(&self) -> usize;

    /// True when no workers are stored.
    fn is_empty(&self) -> bool;

    /// Append at the tail. `Err` hands the worker back when storage is full,
    /// which only the fixed-capacity ring can report.
    fn insert(&mut self, worker: Worker) -> Result<(), Worker>;

    /// Remove and return the most recently inserted worker.
    fn detach(&mut self) -> Option<Worker>;

    /// Remove and return every worker idle since before `now - age`,
    /// preserving the order of the survivors. Ties on the cutoff instant
    /// count as expired.
    fn retrieve_expiry(&mut self, age: Duration, now: Instant) -> Vec<Worker>;

    /// Signal every stored worker to exit and empty the container.
    fn reset(&mut self);
}

/// Send the exit sentinel without blocking.
///
/// `reset` runs under the pool lock, so it must not wait on the channel. An
/// idle worker's channel is empty by invariant; if the send still fails the
/// handle is dropped and the thread exits via disconnect.
fn send_exit(worker: Worker) {
    let task_tx = worker.sender();
    let _ = task_tx.try_send(WorkerMessage::Exit(worker));
}
