//! The pool controller: lifecycle, capacity, dispatch, and backpressure.
//!
//! # Design
//!
//! - **Lock-free fast paths**: `running`, `capacity`, and the lifecycle state
//!   are atomics; the pool mutex only guards the idle container and the
//!   parked-submitter count
//! - **No polling**: saturated submitters park on a Condvar and are woken by
//!   reverting workers (one wake per handoff) or broadcast on lifecycle edges
//! - **Clean shutdown**: release signals every idle worker to exit and wakes
//!   every parked submitter; in-flight tasks run to completion, nothing joins

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::config::pool::{PoolConfig, DEFAULT_EXPIRY_DURATION};
use crate::core::cache::WorkerCache;
use crate::core::error::PoolError;
use crate::core::queue::{RingQueue, StackQueue, WorkerQueue};
use crate::core::reaper;
use crate::core::worker::{Worker, WorkerMessage};

/// Hook invoked with the payload of a task that panicked.
pub type PanicHandler = Arc<dyn Fn(Box<dyn Any + Send>) + Send + Sync>;

const OPENED: u32 = 0;
const CLOSED: u32 = 1;

/// Free-list cap applied when the pool itself is unbounded.
const IDLE_CACHE_LIMIT: usize = 64;

/// Poll interval while waiting for in-flight tasks during a timed release.
const RELEASE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// State guarded by the pool mutex: the idle container and the number of
/// submitters parked on the condition variable.
pub(crate) struct PoolLocked {
    pub(crate) workers: Box<dyn WorkerQueue>,
    blocking: usize,
}

/// Everything shared between the pool handle, its workers, and the reaper.
pub(crate) struct PoolShared {
    capacity: AtomicI32,
    running: AtomicI32,
    state: AtomicU32,
    /// Generation counter for reaper threads; a reaper whose generation is
    /// stale exits at its next tick.
    pub(crate) reaper_seq: AtomicU64,
    pub(crate) lock: Mutex<PoolLocked>,
    pub(crate) cond: Condvar,
    pub(crate) cache: WorkerCache,
    /// Resolved idle expiry: reap interval and idleness threshold.
    pub(crate) expiry: Duration,
    pub(crate) config: PoolConfig,
    panic_handler: Option<PanicHandler>,
}

impl PoolShared {
    pub(crate) fn capacity(&self) -> i32 {
        self.capacity.load(Ordering::Relaxed)
    }

    pub(crate) fn running(&self) -> i32 {
        self.running.load(Ordering::Relaxed)
    }

    pub(crate) fn dec_running(&self) {
        self.running.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED
    }

    /// Wake one parked submitter. The mutex is held around the notify so a
    /// submitter between its capacity check and its wait cannot miss it.
    pub(crate) fn wake_one(&self) {
        let locked = self.lock.lock();
        self.cond.notify_one();
        drop(locked);
    }

    /// Wake every parked submitter.
    pub(crate) fn wake_all(&self) {
        let locked = self.lock.lock();
        self.cond.notify_all();
        drop(locked);
    }

    /// Report a panicking task to the configured hook, or log it.
    pub(crate) fn handle_task_panic(&self, payload: Box<dyn Any + Send>) {
        if let Some(handler) = &self.panic_handler {
            handler(payload);
        } else {
            error!(payload = describe_panic(payload.as_ref()), "worker task panicked");
        }
    }

    /// Take a finished worker back into the idle container.
    ///
    /// Refused (handing the worker back for retirement) when the pool is
    /// closed or the running count overflows a tuned-down capacity. The
    /// close check is repeated under the lock: a release can slip in between
    /// the fast-path check and the lock acquisition.
    pub(crate) fn revert_worker(&self, mut worker: Worker) -> Result<(), Worker> {
        let capacity = self.capacity();
        if self.is_closed() || (capacity > 0 && self.running() > capacity) {
            return Err(worker);
        }
        let mut locked = self.lock.lock();
        if self.is_closed() {
            return Err(worker);
        }
        // stamped under the lock, so the container order stays non-decreasing
        worker.recycle_time = Instant::now();
        match locked.workers.insert(worker) {
            Ok(()) => {
                self.cond.notify_one();
                Ok(())
            }
            Err(worker) => {
                error!(error = %PoolError::QueueIsFull, "revert refused, retiring worker");
                Err(worker)
            }
        }
    }
}

fn describe_panic(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "opaque panic payload"
    }
}

/// Reserve a running slot and start a worker on it.
///
/// The increment happens before the lock is released so concurrent
/// submitters cannot push `running` past the capacity; the matching
/// decrement is in the worker's exit path.
fn spawn_worker(shared: &Arc<PoolShared>, locked: MutexGuard<'_, PoolLocked>) -> Worker {
    shared.running.fetch_add(1, Ordering::Relaxed);
    drop(locked);
    shared.cache.get().run(shared)
}

/// The dispatch path: find a worker for one task.
///
/// Tries the idle container first, then spawns below capacity, then either
/// fails fast (non-blocking mode, blocking quota reached) or parks on the
/// condition variable until a worker reverts, a slot frees up, or the pool
/// empties or closes.
fn retrieve_worker(shared: &Arc<PoolShared>) -> Result<Worker, PoolError> {
    let mut locked = shared.lock.lock();
    loop {
        if let Some(worker) = locked.workers.detach() {
            return Ok(worker);
        }
        let capacity = shared.capacity();
        if capacity < 0 || shared.running() < capacity {
            return Ok(spawn_worker(shared, locked));
        }
        if shared.config.nonblocking {
            return Err(PoolError::PoolOverload);
        }
        let max_blocking = shared.config.max_blocking_tasks;
        if max_blocking > 0 && locked.blocking >= max_blocking {
            warn!(max_blocking, "blocking quota reached, rejecting submit");
            return Err(PoolError::PoolOverload);
        }
        locked.blocking += 1;
        shared.cond.wait(&mut locked);
        locked.blocking -= 1;
        if shared.is_closed() {
            return Err(PoolError::PoolClosed);
        }
        if shared.running() == 0 {
            // the reaper emptied the pool while we were parked; there is no
            // worker left to signal us, so spawn a replacement ourselves
            return Ok(spawn_worker(shared, locked));
        }
    }
}

/// A bounded worker pool for short-lived tasks.
///
/// Construct one with [`Pool::new`] for default options or through
/// [`PoolBuilder`](crate::builders::PoolBuilder) for tuned ones. Dropping the
/// pool releases it: idle workers are signalled to exit, parked submitters
/// are woken, and in-flight tasks run to completion on detached threads.
pub struct Pool {
    pub(crate) shared: Arc<PoolShared>,
}

impl Pool {
    /// Create a pool with default options.
    ///
    /// A non-positive `size` yields an unbounded pool (`cap()` returns `-1`).
    ///
    /// # Errors
    ///
    /// Propagates configuration validation errors; with default options the
    /// construction is infallible in practice.
    pub fn new(size: i32) -> Result<Self, PoolError> {
        crate::builders::PoolBuilder::new(size).build()
    }

    /// Construction shared by the builder.
    pub(crate) fn construct(
        size: i32,
        config: PoolConfig,
        panic_handler: Option<PanicHandler>,
    ) -> Result<Self, PoolError> {
        config.validate(size)?;
        let capacity = if size <= 0 { -1 } else { size };
        let expiry = config.expiry_duration.unwrap_or(DEFAULT_EXPIRY_DURATION);
        let workers: Box<dyn WorkerQueue> = if config.pre_alloc {
            Box::new(RingQueue::with_capacity(size as usize))
        } else {
            Box::new(StackQueue::new())
        };
        let cache_limit = if capacity > 0 {
            capacity as usize
        } else {
            IDLE_CACHE_LIMIT
        };
        let next_worker_id = Arc::new(AtomicUsize::new(0));
        let factory = move || Worker::new(next_worker_id.fetch_add(1, Ordering::Relaxed));
        let shared = Arc::new(PoolShared {
            capacity: AtomicI32::new(capacity),
            running: AtomicI32::new(0),
            state: AtomicU32::new(OPENED),
            reaper_seq: AtomicU64::new(0),
            lock: Mutex::new(PoolLocked {
                workers,
                blocking: 0,
            }),
            cond: Condvar::new(),
            cache: WorkerCache::new(cache_limit, Box::new(factory)),
            expiry,
            config,
            panic_handler,
        });
        reaper::spawn(&shared);
        info!(
            capacity,
            expiry_ms = expiry.as_millis() as u64,
            pre_alloc = shared.config.pre_alloc,
            "pool initialized"
        );
        Ok(Self { shared })
    }

    /// Submit a task for execution.
    ///
    /// In blocking mode (the default) this parks when the pool is saturated
    /// until a worker becomes available. With `nonblocking` set, or when
    /// `max_blocking_tasks` submitters are already parked, it fails fast
    /// instead. The handoff to the worker itself never blocks: the task
    /// channel has a free slot and the worker is draining it.
    ///
    /// # Errors
    ///
    /// - [`PoolError::PoolClosed`] if the pool has been released
    /// - [`PoolError::PoolOverload`] if no worker could be obtained
    pub fn submit<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.shared.is_closed() {
            return Err(PoolError::PoolClosed);
        }
        let worker = retrieve_worker(&self.shared)?;
        let task_tx = worker.sender();
        task_tx
            .send(WorkerMessage::Run(Box::new(task), worker))
            .map_err(|_| PoolError::PoolClosed)
    }

    /// Number of live workers (idle and executing).
    pub fn running(&self) -> i32 {
        self.shared.running()
    }

    /// Maximum number of simultaneously live workers; `-1` means unbounded.
    pub fn cap(&self) -> i32 {
        self.shared.capacity()
    }

    /// Remaining capacity, `cap() - running()`. Meaningless (negative) for an
    /// unbounded pool; callers must not rely on it there.
    pub fn free(&self) -> i32 {
        self.cap() - self.running()
    }

    /// Number of submitters currently parked waiting for a worker.
    pub fn waiting(&self) -> usize {
        self.shared.lock.lock().blocking
    }

    /// Whether the pool has been released.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Change the capacity of a bounded, non-pre-allocated pool.
    ///
    /// Silently a no-op for unbounded or pre-allocated pools, non-positive
    /// sizes, and the current size. Shrinking never terminates workers
    /// forcibly; the excess retires at the next revert. Growing wakes parked
    /// submitters so they can claim the new slots.
    pub fn tune(&self, size: i32) {
        let capacity = self.cap();
        if capacity == -1 || size <= 0 || size == capacity || self.shared.config.pre_alloc {
            return;
        }
        self.shared.capacity.store(size, Ordering::Relaxed);
        if size > capacity {
            if size - capacity == 1 {
                self.shared.wake_one();
            } else {
                self.shared.wake_all();
            }
        }
    }

    /// Close the pool.
    ///
    /// Every idle worker is signalled to exit and every parked submitter is
    /// woken to observe the closed state. In-flight tasks run to completion;
    /// their workers retire when their revert is refused. A second release
    /// is a no-op.
    pub fn release(&self) {
        if self
            .shared
            .state
            .compare_exchange(OPENED, CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        info!("pool released");
        let mut locked = self.shared.lock.lock();
        locked.workers.reset();
        self.shared.cond.notify_all();
        drop(locked);
    }

    /// Close the pool and wait until every worker has exited.
    ///
    /// # Errors
    ///
    /// - [`PoolError::PoolClosed`] if the pool was already closed
    /// - [`PoolError::OperationTimeout`] if workers are still live when the
    ///   timeout elapses (their in-flight tasks keep running regardless)
    pub fn release_timeout(&self, timeout: Duration) -> Result<(), PoolError> {
        if self.is_closed() {
            return Err(PoolError::PoolClosed);
        }
        self.release();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.shared.running() == 0 {
                return Ok(());
            }
            thread::sleep(RELEASE_POLL_INTERVAL);
        }
        Err(PoolError::OperationTimeout)
    }

    /// Reopen a released pool.
    ///
    /// Workers that exited are gone; new ones are constructed on demand. A
    /// fresh reaper generation is started. A no-op on an open pool.
    pub fn reboot(&self) {
        if self
            .shared
            .state
            .compare_exchange(CLOSED, OPENED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("pool rebooted");
            reaper::spawn(&self.shared);
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.cap())
            .field("running", &self.running())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        // workers are detached, never joined; a pool dropped mid-flight lets
        // its tasks finish on their own threads
        self.release();
    }
}
