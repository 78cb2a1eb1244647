//! Fixed-capacity circular container for pre-allocating pools.

use std::time::{Duration, Instant};

use super::{send_exit, WorkerQueue};
use crate::core::worker::Worker;

/// Circular buffer of idle workers, pre-allocated to exactly the pool
/// capacity. `head == tail` is ambiguous, so a `full` flag disambiguates.
/// Detach removes from the tail (still LIFO); expiry removal only advances
/// the head, so survivors are never moved.
pub(crate) struct RingQueue {
    items: Vec<Option<Worker>>,
    head: usize,
    tail: usize,
    full: bool,
}

impl RingQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut items = Vec::with_capacity(capacity);
        items.resize_with(capacity, || None);
        Self {
            items,
            head: 0,
            tail: 0,
            full: false,
        }
    }

    fn physical(&self, logical: usize) -> usize {
        (self.head + logical) % self.items.len()
    }

    /// Count of the leading workers whose recycle time is at or before the
    /// cutoff. Binary search over the logical order, valid because recycle
    /// times are non-decreasing from head to tail.
    fn expired_prefix(&self, cutoff: Instant) -> usize {
        let mut lo = 0;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let expired = self.items[self.physical(mid)]
                .as_ref()
                .is_some_and(|worker| worker.recycle_time <= cutoff);
            if expired {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

impl WorkerQueue for RingQueue {
    fn len(&self) -> usize {
        if self.full {
            self.items.len()
        } else if self.tail >= self.head {
            self.tail - self.head
        } else {
            self.items.len() - self.head + self.tail
        }
    }

    fn is_empty(&self) -> bool {
        !self.full && self.head == self.tail
    }

    fn insert(&mut self, worker: Worker) -> Result<(), Worker> {
        if self.full {
            return Err(worker);
        }
        self.items[self.tail] = Some(worker);
        self.tail = (self.tail + 1) % self.items.len();
        self.full = self.tail == self.head;
        Ok(())
    }

    fn detach(&mut self) -> Option<Worker> {
        if self.is_empty() {
            return None;
        }
        self.tail = (self.tail + self.items.len() - 1) % self.items.len();
        self.full = false;
        self.items[self.tail].take()
    }

    fn retrieve_expiry(&mut self, age: Duration, now: Instant) -> Vec<Worker> {
        let Some(cutoff) = now.checked_sub(age) else {
            return Vec::new();
        };
        let expired = self.expired_prefix(cutoff);
        let mut removed = Vec::with_capacity(expired);
        for logical in 0..expired {
            let physical = self.physical(logical);
            if let Some(worker) = self.items[physical].take() {
                removed.push(worker);
            }
        }
        if expired > 0 {
            self.head = (self.head + expired) % self.items.len();
            self.full = false;
        }
        removed
    }

    fn reset(&mut self) {
        while let Some(worker) = self.detach() {
            send_exit(worker);
        }
        self.head = 0;
        self.tail = 0;
        self.full = false;
    }
}
