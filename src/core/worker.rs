//! Long-lived execution contexts bound to single-slot task channels.
//!
//! A [`Worker`] is a handle that circulates between the idle container, the
//! task channel, and the object cache. The thread behind it blocks on its
//! channel, executes whatever arrives, then hands itself back to the pool.
//! Only the pool sends on the channel, and only after detaching the worker
//! from the container, so at most one task is ever outstanding per worker.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

use crate::core::pool::PoolShared;

/// A task accepted by the pool: a nullary closure, opaque to the machinery.
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// One slot is enough: the receiving worker is guaranteed to be draining.
const TASK_CHANNEL_CAP: usize = 1;

/// What travels on a worker's task channel.
///
/// Both variants carry a worker handle by value: `Run` carries the receiving
/// worker's own handle so the thread can revert it after the task, and `Exit`
/// carries it back so the thread can return it to the object cache.
pub(crate) enum WorkerMessage {
    /// Execute the task, then revert.
    Run(Task, Worker),
    /// Terminate, recycling the handle.
    Exit(Worker),
}

/// Handle to one worker: its task channel endpoints, an id for thread names
/// and tracing, and the instant it last went idle.
pub(crate) struct Worker {
    id: usize,
    task_tx: Sender<WorkerMessage>,
    task_rx: Receiver<WorkerMessage>,
    pub(crate) recycle_time: Instant,
}

impl Worker {
    pub(crate) fn new(id: usize) -> Self {
        let (task_tx, task_rx) = bounded(TASK_CHANNEL_CAP);
        Self {
            id,
            task_tx,
            task_rx,
            recycle_time: Instant::now(),
        }
    }

    pub(crate) fn sender(&self) -> Sender<WorkerMessage> {
        self.task_tx.clone()
    }

    /// Start the worker thread and return the handle.
    ///
    /// The caller has already reserved the running slot under the pool lock;
    /// the matching decrement happens when the thread exits.
    pub(crate) fn run(self, shared: &Arc<PoolShared>) -> Self {
        let id = self.id;
        let task_rx = self.task_rx.clone();
        let shared = Arc::clone(shared);
        thread::Builder::new()
            .name(format!("wp-worker-{id}"))
            .spawn(move || worker_loop(id, &task_rx, &shared))
            .expect("failed to spawn worker thread");
        self
    }
}

fn worker_loop(id: usize, task_rx: &Receiver<WorkerMessage>, shared: &Arc<PoolShared>) {
    debug!(worker_id = id, "worker started");
    let mut retired = None;
    loop {
        match task_rx.recv() {
            Ok(WorkerMessage::Run(task, worker)) => {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                    shared.handle_task_panic(payload);
                }
                match shared.revert_worker(worker) {
                    Ok(()) => {}
                    Err(worker) => {
                        retired = Some(worker);
                        break;
                    }
                }
            }
            Ok(WorkerMessage::Exit(worker)) => {
                retired = Some(worker);
                break;
            }
            Err(_) => {
                // every handle is gone; the pool was torn down
                debug!(worker_id = id, "task channel disconnected");
                break;
            }
        }
    }
    shared.dec_running();
    if let Some(worker) = retired {
        shared.cache.put(worker);
    }
    // a capacity slot just opened; a parked submitter can spawn a replacement
    shared.wake_one();
    debug!(worker_id = id, "worker exiting");
}
