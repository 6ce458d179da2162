use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;
use parking_lot::Mutex;

use super::*;
use crate::test_utils::wait_until;
use crate::Error;
use crate::PoolConfig;
use crate::PoolError;

fn pool_config(
    max: usize,
    min: usize,
    initial: usize,
    step: usize,
) -> PoolConfig {
    PoolConfig {
        max_workers: max,
        min_workers: min,
        initial_workers: initial,
        step,
        resize_interval_in_ms: 50,
        growth_factor: 10,
    }
}

#[test]
fn test_new_rejects_max_below_min() {
    let result = ThreadPool::new(pool_config(1, 2, 2, 1));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_concurrent_producers_never_lose_tasks() {
    let pool = Arc::new(ThreadPool::new(pool_config(8, 2, 4, 2)).unwrap());
    let processed = Arc::new(AtomicUsize::new(0));
    let submitted = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let processed = processed.clone();
            let submitted = submitted.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    let processed = processed.clone();
                    if pool
                        .execute(move || {
                            processed.fetch_add(1, Ordering::SeqCst);
                        })
                        .is_ok()
                    {
                        submitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(submitted.load(Ordering::SeqCst), 800);
    assert!(wait_until(Duration::from_secs(10), || processed.load(Ordering::SeqCst) == 800));
    pool.shutdown();
}

#[test]
fn test_idle_pool_shrinks_to_min_and_stays() {
    let pool = ThreadPool::new(pool_config(10, 2, 4, 2)).unwrap();
    assert_eq!(pool.worker_count(), 4);

    assert!(wait_until(Duration::from_secs(3), || pool.worker_count() == 2));
    for _ in 0..20 {
        let count = pool.worker_count();
        assert!((2..=10).contains(&count), "worker count {count} out of bounds");
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(pool.worker_count(), 2);
    pool.shutdown();
}

#[test]
fn test_backlog_grows_pool_up_to_max() {
    let pool = ThreadPool::new(pool_config(4, 1, 1, 2)).unwrap();
    let processed = Arc::new(AtomicUsize::new(0));

    pool.stop();
    for _ in 0..50 {
        let processed = processed.clone();
        pool.execute(move || {
            processed.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    assert!(wait_until(Duration::from_secs(3), || pool.worker_count() == 4));
    for _ in 0..10 {
        assert!(pool.worker_count() <= 4);
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(processed.load(Ordering::SeqCst), 0);

    pool.start();
    assert!(wait_until(Duration::from_secs(5), || processed.load(Ordering::SeqCst) == 50));
    pool.shutdown();
}

#[test]
fn test_stop_then_shutdown_with_empty_queue_terminates() {
    let pool = ThreadPool::new(pool_config(4, 2, 3, 1)).unwrap();

    pool.stop();
    pool.shutdown();

    assert!(pool.is_terminated());
    assert!(!pool.is_running());
    assert_eq!(pool.worker_count(), 0);
}

#[test]
fn test_shutdown_is_idempotent() {
    let pool = ThreadPool::new(pool_config(2, 1, 1, 1)).unwrap();

    pool.shutdown();
    pool.shutdown();

    assert!(pool.is_terminated());
}

#[test]
fn test_add_task_after_shutdown_is_rejected() {
    let pool = ThreadPool::new(pool_config(2, 1, 1, 1)).unwrap();
    pool.shutdown();

    let result = pool.execute(|| {});

    assert!(matches!(result, Err(Error::Pool(PoolError::Terminated))));
}

#[test]
fn test_stop_gates_new_dispatch() {
    let pool = ThreadPool::new(pool_config(2, 2, 2, 1)).unwrap();
    let processed = Arc::new(AtomicUsize::new(0));

    pool.stop();
    let counter = processed.clone();
    pool.execute(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    thread::sleep(Duration::from_millis(100));

    assert_eq!(processed.load(Ordering::SeqCst), 0);
    assert_eq!(pool.pending_count(), 1);

    pool.start();
    assert!(wait_until(Duration::from_secs(2), || processed.load(Ordering::SeqCst) == 1));
    pool.shutdown();
}

#[test]
fn test_stop_does_not_interrupt_running_tasks() {
    let pool = ThreadPool::new(pool_config(1, 1, 1, 1)).unwrap();
    let (started_tx, started_rx) = bounded(1);
    let (gate_tx, gate_rx) = bounded::<()>(0);
    let finished = Arc::new(AtomicUsize::new(0));
    let flag = finished.clone();

    pool.execute(move || {
        started_tx.send(()).unwrap();
        let _ = gate_rx.recv();
        flag.store(1, Ordering::SeqCst);
    })
    .unwrap();
    started_rx.recv_timeout(Duration::from_secs(2)).unwrap();

    pool.stop();
    gate_tx.send(()).unwrap();

    assert!(wait_until(Duration::from_secs(2), || finished.load(Ordering::SeqCst) == 1));
    pool.shutdown();
}

#[test]
fn test_single_worker_preserves_fifo_order() {
    let pool = ThreadPool::new(pool_config(1, 1, 1, 1)).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    pool.stop();
    for i in 0..10 {
        let order = order.clone();
        pool.execute(move || order.lock().push(i)).unwrap();
    }
    pool.start();

    assert!(wait_until(Duration::from_secs(2), || order.lock().len() == 10));
    assert_eq!(*order.lock(), (0..10).collect::<Vec<_>>());
    pool.shutdown();
}

#[test]
fn test_pool_size_bounds_concurrent_long_tasks() {
    let pool = ThreadPool::new(pool_config(2, 2, 2, 1)).unwrap();
    let running = Arc::new(AtomicUsize::new(0));
    let (gate_tx, gate_rx) = bounded::<()>(0);

    for _ in 0..3 {
        let running = running.clone();
        let gate_rx = gate_rx.clone();
        pool.execute(move || {
            running.fetch_add(1, Ordering::SeqCst);
            let _ = gate_rx.recv();
        })
        .unwrap();
    }

    assert!(wait_until(Duration::from_secs(2), || running.load(Ordering::SeqCst) == 2));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(running.load(Ordering::SeqCst), 2);
    assert_eq!(pool.idle_count(), 0);

    for _ in 0..3 {
        gate_tx.send(()).unwrap();
    }
    assert!(wait_until(Duration::from_secs(2), || running.load(Ordering::SeqCst) == 3));
    pool.shutdown();
}

#[test]
fn test_shutdown_drops_pending_tasks() {
    let pool = ThreadPool::new(pool_config(2, 1, 1, 1)).unwrap();
    let processed = Arc::new(AtomicUsize::new(0));

    pool.stop();
    for _ in 0..5 {
        let processed = processed.clone();
        pool.execute(move || {
            processed.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    pool.shutdown();

    assert_eq!(pool.pending_count(), 0);
    assert_eq!(processed.load(Ordering::SeqCst), 0);
    let status = pool.status();
    assert!(status.terminated);
    assert_eq!(status.workers, 0);
}

#[test]
fn test_task_waiting_for_a_worker_grows_pool_below_max() {
    let pool = ThreadPool::new(pool_config(4, 1, 1, 1)).unwrap();
    let (started_tx, started_rx) = bounded(1);
    let (gate_tx, gate_rx) = bounded::<()>(0);
    let second_ran = Arc::new(AtomicUsize::new(0));

    pool.execute(move || {
        started_tx.send(()).unwrap();
        let _ = gate_rx.recv();
    })
    .unwrap();
    started_rx.recv_timeout(Duration::from_secs(2)).unwrap();

    let flag = second_ran.clone();
    pool.execute(move || {
        flag.store(1, Ordering::SeqCst);
    })
    .unwrap();

    // the dispatcher holds the second task while it waits for a free worker
    assert!(wait_until(Duration::from_secs(2), || second_ran.load(Ordering::SeqCst) == 1));
    assert!(pool.worker_count() >= 2);
    assert!(pool.worker_count() <= 4);

    gate_tx.send(()).unwrap();
    pool.shutdown();
}

#[test]
fn test_pending_count_includes_task_waiting_for_a_worker() {
    let pool = ThreadPool::new(pool_config(1, 1, 1, 1)).unwrap();
    let (started_tx, started_rx) = bounded(1);
    let (gate_tx, gate_rx) = bounded::<()>(0);

    pool.execute(move || {
        started_tx.send(()).unwrap();
        let _ = gate_rx.recv();
    })
    .unwrap();
    started_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    pool.execute(|| {}).unwrap();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(pool.pending_count(), 1);

    gate_tx.send(()).unwrap();
    assert!(wait_until(Duration::from_secs(2), || pool.pending_count() == 0));
    pool.shutdown();
}

#[test]
fn test_close_intake_rejects_new_tasks_but_runs_queued_ones() {
    let pool = ThreadPool::new(pool_config(2, 1, 1, 1)).unwrap();
    let processed = Arc::new(AtomicUsize::new(0));

    pool.stop();
    let counter = processed.clone();
    pool.execute(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    pool.close_intake();

    let rejected = pool.execute(|| {});
    assert!(matches!(rejected, Err(Error::Pool(PoolError::Terminated))));
    assert!(!pool.is_terminated());

    pool.start();
    assert!(wait_until(Duration::from_secs(2), || processed.load(Ordering::SeqCst) == 1));
    pool.shutdown();
}
