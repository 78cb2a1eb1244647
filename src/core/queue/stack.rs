//! Growable LIFO container for lazily-created pools.

use std::time::{Duration, Instant};

use super::{send_exit, WorkerQueue};
use crate::core::worker::Worker;

/// Unbounded stack of idle workers. Detach pops the most recently reverted
/// worker for cache locality; expired workers drain from the bottom.
pub(crate) struct StackQueue {
    items: Vec<Worker>,
}

impl StackQueue {
    pub(crate) const fn new() -> Self {
        Self { items: Vec::new() }
    }
}

impl WorkerQueue for StackQueue {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn insert(&mut self, worker: Worker) -> Result<(), Worker> {
        self.items.push(worker);
        Ok(())
    }

    fn detach(&mut self) -> Option<Worker> {
        self.items.pop()
    }

    fn retrieve_expiry(&mut self, age: Duration, now: Instant) -> Vec<Worker> {
        let Some(cutoff) = now.checked_sub(age) else {
            return Vec::new();
        };
        let expired = self
            .items
            .partition_point(|worker| worker.recycle_time <= cutoff);
        self.items.drain(..expired).collect()
    }

    fn reset(&mut self) {
        for worker in self.items.drain(..) {
            send_exit(worker);
        }
    }
}
