//! Free list amortizing worker allocation across spawn/exit cycles.

use parking_lot::Mutex;

use crate::core::worker::Worker;

/// Constructs a fresh worker when the free list is empty.
pub(crate) type WorkerFactory = Box<dyn Fn() -> Worker + Send + Sync>;

/// Bounded, thread-safe free list of worker handles.
///
/// Retiring workers park their handle here instead of dropping it, so the
/// next spawn reuses the channel allocation. The list is capped; handles
/// beyond the cap are simply dropped.
pub(crate) struct WorkerCache {
    slots: Mutex<Vec<Worker>>,
    limit: usize,
    factory: WorkerFactory,
}

impl WorkerCache {
    pub(crate) fn new(limit: usize, factory: WorkerFactory) -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            limit,
            factory,
        }
    }

    /// A cached worker if one is available, otherwise a fresh one.
    pub(crate) fn get(&self) -> Worker {
        let cached = self.slots.lock().pop();
        cached.unwrap_or_else(|| (self.factory)())
    }

    /// Store a handle for reuse, dropping it if the list is at its cap.
    pub(crate) fn put(&self, worker: Worker) {
        let mut slots = self.slots.lock();
        if slots.len() < self.limit {
            slots.push(worker);
        }
    }
}
