//! Integration tests for pool lifecycle and reclamation.
//!
//! These tests validate:
//! - Idle workers retired after the expiry duration, with and without
//!   pre-allocation
//! - Release waking parked submitters, and reboot restoring service
//! - Idempotent release/reboot and the timed release
//! - Capacity tuning rules, including waking parked submitters on growth
//! - Unbounded pools and configuration parsing

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use workpool::builders::PoolBuilder;
use workpool::config::PoolConfig;
use workpool::core::{Pool, PoolError};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Poll `predicate` until it holds or the deadline passes.
fn wait_until(deadline: Duration, predicate: impl Fn() -> bool) -> bool {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    predicate()
}

// ============================================================================
// IDLE RECLAMATION
// ============================================================================

#[test]
fn test_idle_workers_are_reclaimed() {
    let pool = PoolBuilder::new(5)
        .with_expiry_duration(Duration::from_millis(100))
        .build()
        .expect("pool");
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..5 {
        let completed = Arc::clone(&completed);
        pool.submit(move || {
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .expect("submit");
    }
    assert!(wait_until(Duration::from_secs(2), || {
        completed.load(Ordering::SeqCst) == 5
    }));

    // no submissions for several expiry periods: every worker retires
    assert!(
        wait_until(Duration::from_secs(2), || pool.running() == 0),
        "running stuck at {}",
        pool.running()
    );
    assert_eq!(pool.free(), 5);
}

#[test]
fn test_idle_reclamation_with_pre_alloc_ring() {
    let pool = PoolBuilder::new(4)
        .with_pre_alloc(true)
        .with_expiry_duration(Duration::from_millis(100))
        .build()
        .expect("pool");
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..100 {
        let completed = Arc::clone(&completed);
        pool.submit(move || {
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .expect("submit");
    }
    assert!(wait_until(Duration::from_secs(5), || {
        completed.load(Ordering::SeqCst) == 100
    }));
    assert!(wait_until(Duration::from_secs(2), || pool.running() == 0));
}

#[test]
fn test_purge_disabled_keeps_idle_workers() {
    let pool = PoolBuilder::new(2)
        .with_expiry_duration(Duration::from_millis(50))
        .with_purge_disabled(true)
        .build()
        .expect("pool");
    let ran = Arc::new(AtomicBool::new(false));
    {
        let ran = Arc::clone(&ran);
        pool.submit(move || ran.store(true, Ordering::SeqCst))
            .expect("submit");
    }
    assert!(wait_until(Duration::from_secs(2), || ran.load(Ordering::SeqCst)));

    // several expiry periods pass, but nothing reaps the idle worker
    thread::sleep(Duration::from_millis(300));
    assert_eq!(pool.running(), 1);
}

// ============================================================================
// RELEASE AND REBOOT
// ============================================================================

#[test]
fn test_release_wakes_parked_submitter_then_reboot_restores_service() {
    let pool = Arc::new(Pool::new(1).expect("pool"));
    let (gate_tx, gate_rx) = mpsc::channel::<()>();

    pool.submit(move || {
        gate_rx.recv().ok();
    })
    .expect("submit");

    let parked = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.submit(|| {}))
    };
    assert!(wait_until(Duration::from_secs(2), || pool.waiting() == 1));

    pool.release();
    assert!(pool.is_closed());
    assert_eq!(parked.join().expect("parked"), Err(PoolError::PoolClosed));
    assert_eq!(pool.submit(|| {}), Err(PoolError::PoolClosed));

    // let the in-flight task finish; its revert is refused and it retires
    gate_tx.send(()).expect("gate");
    assert!(wait_until(Duration::from_secs(2), || pool.running() == 0));

    pool.reboot();
    assert!(!pool.is_closed());
    let ran = Arc::new(AtomicBool::new(false));
    {
        let ran = Arc::clone(&ran);
        pool.submit(move || ran.store(true, Ordering::SeqCst))
            .expect("submit after reboot");
    }
    assert!(wait_until(Duration::from_secs(2), || ran.load(Ordering::SeqCst)));
}

#[test]
fn test_double_release_and_reboot_on_open_pool_are_noops() {
    let pool = Pool::new(2).expect("pool");

    // reboot on an open pool changes nothing
    pool.reboot();
    assert!(!pool.is_closed());
    pool.submit(|| {}).expect("submit");

    pool.release();
    assert!(pool.is_closed());
    pool.release();
    assert!(pool.is_closed());
}

#[test]
fn test_release_timeout() {
    // quiescent pool: release completes immediately
    let pool = Pool::new(2).expect("pool");
    pool.submit(|| {}).expect("submit");
    assert_eq!(pool.release_timeout(Duration::from_secs(2)), Ok(()));

    // already closed: a second timed release reports it
    assert_eq!(
        pool.release_timeout(Duration::from_secs(1)),
        Err(PoolError::PoolClosed)
    );

    // a long in-flight task outlives a short timeout
    let pool = Pool::new(1).expect("pool");
    pool.submit(|| thread::sleep(Duration::from_millis(400)))
        .expect("submit");
    assert_eq!(
        pool.release_timeout(Duration::from_millis(50)),
        Err(PoolError::OperationTimeout)
    );
}

// ============================================================================
// CAPACITY TUNING
// ============================================================================

#[test]
fn test_tune_rules() {
    let pool = Pool::new(4).expect("pool");
    pool.tune(8);
    assert_eq!(pool.cap(), 8);
    pool.tune(0);
    assert_eq!(pool.cap(), 8);
    pool.tune(-5);
    assert_eq!(pool.cap(), 8);
    pool.tune(2);
    assert_eq!(pool.cap(), 2);

    // pre-allocated pools have a pinned capacity
    let pinned = PoolBuilder::new(4).with_pre_alloc(true).build().expect("pool");
    pinned.tune(16);
    assert_eq!(pinned.cap(), 4);
}

#[test]
fn test_tune_growth_unblocks_parked_submitter() {
    let pool = Arc::new(Pool::new(1).expect("pool"));
    let (gate_tx, gate_rx) = mpsc::channel::<()>();

    pool.submit(move || {
        gate_rx.recv().ok();
    })
    .expect("submit");

    let parked = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.submit(|| {}))
    };
    assert!(wait_until(Duration::from_secs(2), || pool.waiting() == 1));

    // growth opens a slot; the parked submitter spawns a second worker
    pool.tune(3);
    assert_eq!(parked.join().expect("parked"), Ok(()));

    gate_tx.send(()).expect("gate");
}

#[test]
fn test_shrink_retires_excess_workers_on_revert() {
    let pool = Arc::new(Pool::new(4).expect("pool"));
    // crossbeam receivers clone, so every task can block on the same gate
    let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(4);

    for _ in 0..4 {
        let gate_rx = gate_rx.clone();
        pool.submit(move || {
            gate_rx.recv().ok();
        })
        .expect("submit");
    }
    assert_eq!(pool.running(), 4);

    pool.tune(1);
    for _ in 0..4 {
        gate_tx.send(()).expect("gate");
    }

    // reverts above the tuned capacity are refused; the refusal reads the
    // running count before the retiring workers decrement it, so with all
    // four finishing at once every revert may be refused and the count can
    // transiently drop below the new capacity, down to 0
    assert!(
        wait_until(Duration::from_secs(2), || pool.running() <= 1),
        "running stuck at {}",
        pool.running()
    );

    // fresh work tops the pool back up to exactly the tuned capacity: one
    // worker serves all of it and reverts after every task
    let completed = Arc::new(AtomicUsize::new(0));
    for _ in 0..8 {
        let completed = Arc::clone(&completed);
        pool.submit(move || {
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .expect("submit");
    }
    assert!(wait_until(Duration::from_secs(2), || {
        completed.load(Ordering::SeqCst) == 8
    }));
    assert_eq!(pool.running(), 1);

    // and it holds there: well inside the expiry window nothing retires it
    thread::sleep(Duration::from_millis(100));
    assert_eq!(pool.running(), 1);
}

// ============================================================================
// UNBOUNDED POOLS AND BOUNDARIES
// ============================================================================

#[test]
fn test_unbounded_pool() {
    let pool = Pool::new(0).expect("pool");
    assert_eq!(pool.cap(), -1);

    // tune is a no-op for unbounded pools
    pool.tune(10);
    assert_eq!(pool.cap(), -1);

    let completed = Arc::new(AtomicUsize::new(0));
    for _ in 0..20 {
        let completed = Arc::clone(&completed);
        pool.submit(move || {
            thread::sleep(Duration::from_millis(200));
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .expect("submit");
    }
    // capacity never pushes back: all 20 run concurrently
    assert!(wait_until(Duration::from_secs(1), || pool.running() == 20));
    assert!(pool.free() < 0);
    assert!(wait_until(Duration::from_secs(5), || {
        completed.load(Ordering::SeqCst) == 20
    }));
}

#[test]
fn test_invalid_configurations_are_rejected() {
    let err = PoolBuilder::new(4)
        .with_expiry_duration(Duration::ZERO)
        .build()
        .unwrap_err();
    assert_eq!(err, PoolError::InvalidPoolExpiry);

    let err = PoolBuilder::new(0).with_pre_alloc(true).build().unwrap_err();
    assert_eq!(err, PoolError::InvalidPreAllocSize);
}

#[test]
fn test_pool_from_json_config() {
    let config =
        PoolConfig::from_json_str(r#"{"max_blocking_tasks":8,"disable_purge":true}"#).expect("parse");
    let pool = PoolBuilder::new(2).with_config(config).build().expect("pool");
    assert_eq!(pool.cap(), 2);
    pool.submit(|| {}).expect("submit");
}
