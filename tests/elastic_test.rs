use bureau::prelude::*;
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_initial_state() {
    let pool = ElasticThreadPool::new(4, 4).unwrap();

    assert!(pool.is_accepting());
    assert!(pool.is_running());
    assert_eq!(pool.spawned_threads(), 1);
    assert_eq!(pool.max_threads(), 4);
}

#[test]
fn test_stop() {
    let pool = ElasticThreadPool::new(4, 4).unwrap();

    pool.stop();
    assert!(!pool.is_accepting());
    assert!(!pool.is_running());

    pool.stop();
    assert!(!pool.is_running());
}

#[test]
fn test_work() {
    let pool = ElasticThreadPool::new(4, 4).unwrap();
    let (tx, rx) = bounded(1);

    pool.execute(move || tx.send(10).unwrap()).unwrap();

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), 10);
}

fn nested_adds(max_threads: usize, max_backlog: usize, adds: usize) -> Vec<usize> {
    let pool = Arc::new(ElasticThreadPool::new(max_threads, max_backlog).unwrap());
    let (tx, rx) = bounded(1);

    let handle = pool.clone();
    pool.execute(move || {
        // the only thread is busy here, so every add grows the backlog by one
        let mut spawned = Vec::new();
        for _ in 0..adds {
            handle.execute(|| {}).unwrap();
            spawned.push(handle.spawned_threads());
        }
        tx.send(spawned).unwrap();
    })
    .unwrap();

    let spawned = rx.recv_timeout(WAIT).unwrap();
    pool.stop();
    spawned
}

#[test]
fn test_expand() {
    // backlog reaches 1, 2, 3; growth happens once it exceeds 2
    assert_eq!(nested_adds(2, 2, 3), vec![1, 1, 2]);
}

#[test]
fn test_expand_respects_ceiling() {
    let spawned = nested_adds(2, 2, 20);
    assert_eq!(&spawned[..3], &[1, 1, 2]);
    assert!(spawned.iter().all(|&n| n <= 2));
}

#[test]
fn test_expand_fail_at_capacity() {
    assert_eq!(nested_adds(1, 2, 3), vec![1, 1, 1]);
}

#[test]
fn test_invalid_backlog() {
    assert!(matches!(ElasticThreadPool::new(10, 0), Err(Error::Config(_))));
}

#[test]
fn test_invalid_thread_count() {
    assert!(matches!(ElasticThreadPool::new(0, 10), Err(Error::Config(_))));
}

#[test]
fn test_add_stopped() {
    let pool = ElasticThreadPool::new(4, 4).unwrap();
    pool.stop();
    assert!(matches!(pool.execute(|| {}), Err(Error::Unavailable)));
}

#[test]
fn test_stop_drains_all_threads() {
    let pool = ElasticThreadPool::new(4, 1).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..200 {
        let counter = counter.clone();
        pool.execute(move || {
            std::thread::sleep(Duration::from_micros(50));
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    assert!(pool.spawned_threads() <= 4);

    pool.stop();
    assert_eq!(counter.load(Ordering::SeqCst), 200);
}
