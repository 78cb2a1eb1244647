//! Periodic eviction of workers idle past the expiry duration.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::debug;

use crate::core::pool::PoolShared;
use crate::core::worker::WorkerMessage;

/// Start a reaper for the pool's current generation.
///
/// Each spawn bumps the generation counter; a reaper that wakes up under a
/// newer generation (the pool was released and rebooted while it slept)
/// exits instead of running alongside its successor. No reaper is started
/// when purging is disabled.
pub(crate) fn spawn(shared: &Arc<PoolShared>) {
    if shared.config.disable_purge {
        return;
    }
    let generation = shared.reaper_seq.fetch_add(1, Ordering::AcqRel) + 1;
    let shared = Arc::clone(shared);
    thread::Builder::new()
        .name("wp-reaper".into())
        .spawn(move || purge_loop(&shared, generation))
        .expect("failed to spawn reaper thread");
}

fn purge_loop(shared: &Arc<PoolShared>, generation: u64) {
    let interval = shared.expiry;
    debug!(
        generation,
        interval_ms = interval.as_millis() as u64,
        "reaper started"
    );
    let ticker = crossbeam_channel::tick(interval);
    for _ in &ticker {
        if shared.is_closed() || shared.reaper_seq.load(Ordering::Acquire) != generation {
            break;
        }
        let expired = {
            let mut locked = shared.lock.lock();
            locked.workers.retrieve_expiry(interval, Instant::now())
        };
        let reaped = expired.len();
        // the send can block until the worker drains its channel, so it must
        // happen outside the pool lock
        for worker in expired {
            let task_tx = worker.sender();
            let _ = task_tx.send(WorkerMessage::Exit(worker));
        }
        if reaped > 0 {
            debug!(reaped, "retired expired workers");
        }
        // every worker may now be retiring; parked submitters have to be
        // woken so they spawn replacements instead of waiting on a signal
        // from a worker that no longer exists
        if shared.running() == 0 {
            shared.wake_all();
        }
    }
    debug!(generation, "reaper exiting");
}
