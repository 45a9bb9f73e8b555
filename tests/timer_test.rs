use bureau::prelude::*;
use crossbeam_channel::bounded;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_ctor() {
    let timer = Timer::new().unwrap();
    assert!(timer.is_accepting());
    assert!(timer.is_running());
}

#[test]
fn test_stop() {
    let timer = Timer::new().unwrap();

    timer.stop();
    assert!(!timer.is_accepting());
    assert!(!timer.is_running());

    timer.stop();
    assert!(!timer.is_running());
}

#[test]
fn test_add_due_fires_not_before_due() {
    let timer = Timer::new().unwrap();
    let (tx, rx) = bounded(1);
    let due = Instant::now() + Duration::from_millis(100);

    timer.add_at(move || tx.send(Instant::now()).unwrap(), due).unwrap();

    let fired = rx.recv_timeout(WAIT).unwrap();
    assert!(fired >= due);
}

#[test]
fn test_add_delay() {
    let timer = Timer::new().unwrap();
    let (tx, rx) = bounded(1);
    let start = Instant::now();

    timer
        .add_after(move || tx.send(Instant::now()).unwrap(), Duration::from_millis(100))
        .unwrap();

    let fired = rx.recv_timeout(WAIT).unwrap();
    assert!(fired.duration_since(start) >= Duration::from_millis(100));
}

#[test]
fn test_add_unbounded_delay() {
    let timer = Timer::new().unwrap();

    let item = timer.add_after(|| {}, Duration::MAX).unwrap();
    assert_eq!(timer.status(item), Status::Queued);
    assert_eq!(timer.outstanding(), 1);

    // an earlier event still fires ahead of it
    let (tx, rx) = bounded(1);
    timer
        .add_after(move || tx.send(()).unwrap(), Duration::from_millis(10))
        .unwrap();
    rx.recv_timeout(WAIT).unwrap();

    assert_eq!(timer.cancel(item), CancelStatus::Cancelled);
    timer.stop();
}

#[test]
fn test_add_system_time() {
    let timer = Timer::new().unwrap();
    let (tx, rx) = bounded(2);

    let tx_past = tx.clone();
    timer
        .add_at_system(move || tx_past.send("past").unwrap(), SystemTime::UNIX_EPOCH)
        .unwrap();
    timer
        .add_at_system(
            move || tx.send("future").unwrap(),
            SystemTime::now() + Duration::from_millis(50),
        )
        .unwrap();

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "past");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "future");
}

fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Box<dyn FnOnce() + Send>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = {
        let seen = seen.clone();
        move |value: u32| -> Box<dyn FnOnce() + Send> {
            let seen = seen.clone();
            Box::new(move || seen.lock().push(value))
        }
    };
    (seen, record)
}

#[test]
fn test_add_sequence() {
    let timer = Timer::new().unwrap();
    let (seen, record) = recorder();
    let (tx, rx) = bounded(1);

    timer.add_after(record(10), Duration::from_millis(100)).unwrap();
    let last = record(100);
    timer
        .add_after(move || {
            last();
            tx.send(()).unwrap();
        }, Duration::from_millis(200))
        .unwrap();

    rx.recv_timeout(WAIT).unwrap();
    assert_eq!(*seen.lock(), vec![10, 100]);
}

#[test]
fn test_add_reverse() {
    let timer = Timer::new().unwrap();
    let (seen, record) = recorder();
    let (tx, rx) = bounded(1);

    let last = record(100);
    timer
        .add_after(move || {
            last();
            tx.send(()).unwrap();
        }, Duration::from_millis(200))
        .unwrap();
    timer.add_after(record(10), Duration::from_millis(100)).unwrap();

    rx.recv_timeout(WAIT).unwrap();
    assert_eq!(*seen.lock(), vec![10, 100]);
}

#[test]
fn test_add_while_firing() {
    let timer = Arc::new(Timer::new().unwrap());
    let (tx, rx) = bounded(1);

    let handle = timer.clone();
    timer
        .add_after(move || {
            handle
                .add_after(move || tx.send(()).unwrap(), Duration::from_millis(100))
                .unwrap();
        }, Duration::from_millis(100))
        .unwrap();

    rx.recv_timeout(WAIT).unwrap();
    timer.stop();
}

#[test]
fn test_add_while_firing_reverse() {
    let timer = Arc::new(Timer::new().unwrap());
    let (seen, record) = recorder();
    let (tx, rx) = bounded(1);

    let handle = timer.clone();
    timer
        .add_after(move || {
            let last = record(100);
            handle
                .add_after(move || {
                    last();
                    tx.send(()).unwrap();
                }, Duration::from_millis(200))
                .unwrap();
            handle.add_after(record(10), Duration::from_millis(100)).unwrap();
        }, Duration::from_millis(100))
        .unwrap();

    rx.recv_timeout(WAIT).unwrap();
    assert_eq!(*seen.lock(), vec![10, 100]);
    timer.stop();
}

#[test]
fn test_add_stopped() {
    let timer = Timer::new().unwrap();
    timer.stop();
    assert!(matches!(
        timer.add_after(|| {}, Duration::from_millis(1)),
        Err(Error::Unavailable)
    ));
}

#[test]
fn test_cancel_before_due() {
    let timer = Timer::new().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = bounded(1);

    let counter = hits.clone();
    let item = timer
        .add_after(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }, Duration::from_millis(50))
        .unwrap();
    assert_eq!(timer.cancel(item), CancelStatus::Cancelled);

    // a later event proves the timer moved past the cancelled one
    timer
        .add_after(move || tx.send(()).unwrap(), Duration::from_millis(100))
        .unwrap();
    rx.recv_timeout(WAIT).unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancel_after_fired() {
    let timer = Timer::new().unwrap();
    let (tx, rx) = bounded(1);

    let item = timer
        .add_after(move || tx.send(()).unwrap(), Duration::from_millis(10))
        .unwrap();
    rx.recv_timeout(WAIT).unwrap();

    assert_eq!(timer.cancel(item), CancelStatus::Failed);
}

#[test]
fn test_cancel_twice() {
    let timer = Timer::new().unwrap();
    let item = timer.add_after(|| {}, Duration::from_secs(60)).unwrap();

    assert_eq!(timer.cancel(item), CancelStatus::Cancelled);
    assert_eq!(timer.cancel(item), CancelStatus::Failed);
}

#[test]
fn test_cancel_from_firing_event() {
    let timer = Arc::new(Timer::new().unwrap());
    let (tx, rx) = bounded(1);

    let later = timer.add_after(|| {}, Duration::from_secs(60)).unwrap();
    let handle = timer.clone();
    timer
        .add_after(move || tx.send(handle.cancel(later)).unwrap(), Duration::from_millis(50))
        .unwrap();

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), CancelStatus::Cancelled);
    assert_eq!(timer.status(later), Status::Complete);
    timer.stop();
}

#[test]
fn test_cancel_pending_from_firing_event() {
    let timer = Arc::new(Timer::new().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = bounded(1);

    let handle = timer.clone();
    let counter = hits.clone();
    timer
        .add_after(move || {
            let counter = counter.clone();
            let item = handle
                .add_after(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }, Duration::ZERO)
                .unwrap();
            tx.send(handle.cancel(item)).unwrap();
        }, Duration::from_millis(10))
        .unwrap();

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), CancelStatus::Cancelled);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    timer.stop();
}

#[test]
fn test_selected_item_cannot_be_cancelled() {
    let timer = Arc::new(Timer::new().unwrap());
    let (item_tx, item_rx) = bounded::<Item>(1);
    let (tx, rx) = bounded(1);
    let due = Instant::now() + Duration::from_millis(200);

    // both events share a due time, so the second is already selected when
    // the first runs
    let handle = timer.clone();
    timer
        .add_at(move || {
            let second = item_rx.recv_timeout(WAIT).unwrap();
            let status = handle.status(second);
            tx.send((handle.cancel(second), status)).unwrap();
        }, due)
        .unwrap();
    let second = timer.add_at(|| {}, due).unwrap();
    item_tx.send(second).unwrap();

    let (cancelled, status) = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(cancelled, CancelStatus::Failed);
    assert_eq!(status, Status::Firing);
    timer.stop();
}

#[test]
fn test_fired_batch_member_is_complete() {
    let timer = Arc::new(Timer::new().unwrap());
    let (items_tx, items_rx) = bounded::<(Item, Item)>(1);
    let (tx, rx) = bounded(1);
    let due = Instant::now() + Duration::from_millis(200);

    // same due time: the first has run by the time the second is invoked
    let first = timer.add_at(|| {}, due).unwrap();
    let handle = timer.clone();
    let second = timer
        .add_at(move || {
            let (first, second) = items_rx.recv_timeout(WAIT).unwrap();
            tx.send((handle.status(first), handle.status(second))).unwrap();
        }, due)
        .unwrap();
    items_tx.send((first, second)).unwrap();

    let (first_status, second_status) = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(first_status, Status::Complete);
    assert_eq!(second_status, Status::Firing);
    timer.stop();
}

#[test]
fn test_stop_discards_events() {
    let timer = Timer::new().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    let item = timer
        .add_after(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }, Duration::from_millis(100))
        .unwrap();
    timer.stop();

    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(timer.status(item), Status::Complete);
}
