//! A dedicated thread that fires callbacks at or after requested times.
//!
//! Events due at the same moment fire in the order they were added. While
//! a batch is firing the lock is released so events can add or cancel other
//! events; additions made during that window are parked in a pending list
//! and merged into the schedule once the batch finishes. Events left when
//! the timer stops are discarded, not run.

mod item;

pub use item::{CancelStatus, Item, ItemId, Status};

use crate::error::{Error, Result};
use crate::executor::{PanicHandler, PanicStrategy};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

/// A callback fired by a [`Timer`]. Keep it short; it delays every event
/// behind it. Heavy work belongs on a [`Worker`](crate::Worker).
pub type Event = Box<dyn FnOnce() + Send + 'static>;

static TIMER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Relative delays are capped here so the deadline stays representable.
const MAX_DELAY: Duration = Duration::from_secs(u32::MAX as u64);

struct Scheduled {
    id: ItemId,
    due: Instant,
    event: Event,
}

struct TimerState {
    /// Ascending by due time, ties in insertion order.
    future: VecDeque<Scheduled>,
    /// Added while firing; same ordering as `future`.
    pending: Vec<Scheduled>,
    /// Ids in the current batch that have not finished firing.
    selected: Vec<ItemId>,
    firing: bool,
    next_id: u64,
    accepting: bool,
    running: bool,
}

impl TimerState {
    fn contains(&self, id: ItemId) -> bool {
        self.future.iter().any(|s| s.id == id) || self.pending.iter().any(|s| s.id == id)
    }

    fn take(&mut self, id: ItemId) -> Option<Scheduled> {
        if let Some(pos) = self.pending.iter().position(|s| s.id == id) {
            return Some(self.pending.remove(pos));
        }
        let pos = self.future.iter().position(|s| s.id == id)?;
        self.future.remove(pos)
    }

    fn merge_pending(&mut self) {
        for scheduled in std::mem::take(&mut self.pending) {
            let index = self.future.partition_point(|s| s.due <= scheduled.due);
            self.future.insert(index, scheduled);
        }
    }
}

struct TimerShared {
    id: u64,
    state: Mutex<TimerState>,
    wakeup: Condvar,
    panic_handler: PanicHandler,
}

/// Fires events on a dedicated thread once they come due.
///
/// Dropping the timer stops it.
pub struct Timer {
    shared: Arc<TimerShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Timer {
    /// Start a timer with the default panic strategy.
    pub fn new() -> Result<Self> {
        Self::with_panic_strategy(PanicStrategy::default())
    }

    /// Start a timer whose thread applies `strategy` to panicking events.
    pub fn with_panic_strategy(strategy: PanicStrategy) -> Result<Self> {
        let shared = Arc::new(TimerShared {
            id: TIMER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(TimerState {
                future: VecDeque::new(),
                pending: Vec::new(),
                selected: Vec::new(),
                firing: false,
                next_id: 0,
                accepting: true,
                running: true,
            }),
            wakeup: Condvar::new(),
            panic_handler: PanicHandler::new(strategy),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("bureau-timer".to_string())
            .spawn(move || run_timer(&thread_shared))?;

        tracing::debug!(timer = shared.id, "timer started");
        Ok(Self {
            shared,
            thread: Mutex::new(Some(handle)),
        })
    }

    /// Schedule `event` to fire at `due`. A due time in the past fires at the
    /// next opportunity.
    pub fn add_at<F>(&self, event: F, due: Instant) -> Result<Item>
    where
        F: FnOnce() + Send + 'static,
    {
        self.add(Box::new(event), due)
    }

    /// Schedule `event` to fire `delay` from now. Delays longer than about
    /// 136 years are shortened to that.
    pub fn add_after<F>(&self, event: F, delay: Duration) -> Result<Item>
    where
        F: FnOnce() + Send + 'static,
    {
        self.add(Box::new(event), Instant::now() + delay.min(MAX_DELAY))
    }

    /// Schedule against the wall clock. The gap to `due` is measured now and
    /// converted to the monotonic clock, so later clock changes are ignored.
    pub fn add_at_system<F>(&self, event: F, due: SystemTime) -> Result<Item>
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = due
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);
        self.add_after(event, delay)
    }

    /// Boxed form of [`add_at`](Self::add_at).
    pub fn add(&self, event: Event, due: Instant) -> Result<Item> {
        let mut state = self.shared.state.lock();
        if !state.accepting {
            return Err(Error::Unavailable);
        }

        let id = ItemId(state.next_id);
        state.next_id = state.next_id.wrapping_add(1);
        let scheduled = Scheduled { id, due, event };

        if state.firing {
            // the thread merges these once the batch in flight is done
            let index = state.pending.partition_point(|s| s.due <= due);
            state.pending.insert(index, scheduled);
        } else {
            let index = state.future.partition_point(|s| s.due <= due);
            state.future.insert(index, scheduled);
            if index == 0 {
                self.shared.wakeup.notify_one();
            }
        }

        tracing::trace!(timer = self.shared.id, item = id.as_u64(), "event scheduled");
        Ok(Item {
            timer: self.shared.id,
            id,
        })
    }

    /// Remove `item` if it has not been selected for firing.
    pub fn cancel(&self, item: Item) -> CancelStatus {
        if item.timer != self.shared.id {
            return CancelStatus::Failed;
        }

        let removed = self.shared.state.lock().take(item.id);
        match removed {
            // dropped outside the lock; the closure may own anything
            Some(scheduled) => {
                drop(scheduled);
                CancelStatus::Cancelled
            }
            None => CancelStatus::Failed,
        }
    }

    /// Where `item` is now. Items from another timer report `Complete`.
    pub fn status(&self, item: Item) -> Status {
        if item.timer != self.shared.id {
            return Status::Complete;
        }

        let state = self.shared.state.lock();
        if state.contains(item.id) {
            Status::Queued
        } else if state.selected.contains(&item.id) {
            Status::Firing
        } else {
            Status::Complete
        }
    }

    /// Events waiting for their due time.
    pub fn outstanding(&self) -> usize {
        let state = self.shared.state.lock();
        state.future.len() + state.pending.len()
    }

    /// Stop accepting events and terminate the timer thread.
    ///
    /// An event already firing finishes; everything still queued is dropped
    /// without running. Calling `stop` from one of this timer's events, or
    /// from two threads at once, is not supported.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.accepting {
                return;
            }
            state.accepting = false;
            self.shared.wakeup.notify_all();
        }

        if let Some(handle) = self.thread.lock().take() {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::warn!(timer = self.shared.id, "timer thread exited abnormally");
            }
        }

        self.shared.state.lock().running = false;
        tracing::debug!(timer = self.shared.id, "timer stopped");
    }

    /// False once `stop` has begun.
    pub fn is_accepting(&self) -> bool {
        self.shared.state.lock().accepting
    }

    /// False once the timer thread has been joined.
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Panics caught while firing events.
    pub fn panic_count(&self) -> usize {
        self.shared.panic_handler.panic_count()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Timer")
            .field("id", &self.shared.id)
            .field("future", &state.future.len())
            .field("pending", &state.pending.len())
            .field("firing", &state.firing)
            .field("accepting", &state.accepting)
            .finish()
    }
}

fn run_timer(shared: &TimerShared) {
    let mut state = shared.state.lock();

    while state.accepting {
        let earliest = match state.future.front() {
            Some(scheduled) => scheduled.due,
            None => {
                shared.wakeup.wait(&mut state);
                continue;
            }
        };

        let now = Instant::now();
        if now < earliest {
            shared.wakeup.wait_until(&mut state, earliest);
            continue;
        }

        let ready = state.future.partition_point(|s| s.due <= now);
        let batch: Vec<Scheduled> = state.future.drain(..ready).collect();
        state.selected = batch.iter().map(|s| s.id).collect();
        state.firing = true;

        for scheduled in batch {
            let id = scheduled.id;
            MutexGuard::unlocked(&mut state, || {
                tracing::trace!(timer = shared.id, item = id.as_u64(), "firing");
                let _ = shared.panic_handler.execute(scheduled.event);
            });
            state.selected.retain(|selected| *selected != id);
        }

        state.firing = false;
        state.merge_pending();
    }

    let discarded = (
        std::mem::take(&mut state.future),
        std::mem::take(&mut state.pending),
    );
    drop(state);

    if !discarded.0.is_empty() || !discarded.1.is_empty() {
        tracing::debug!(
            timer = shared.id,
            discarded = discarded.0.len() + discarded.1.len(),
            "discarding unfired events"
        );
    }
}
