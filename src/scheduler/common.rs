//! The guarded queue every decorator is built on.
//!
//! A decorator keeps its own queue and lifecycle flags, independent of the
//! worker it feeds. "Idle" means the decorator's queue is empty and no item
//! taken from it is still executing; `stop` waits for exactly that.
//!
//! Decorators never swallow a panic from the work they run. They catch it
//! with [`run_caught`], settle their own bookkeeping, then resume it so it
//! reaches the panic handler of the pool underneath.

use crate::error::{Error, Result};
use crate::worker::{Work, Worker};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

/// Run `f`, holding back a panic as the `Err` payload.
pub(crate) fn run_caught<F: FnOnce()>(f: F) -> thread::Result<()> {
    panic::catch_unwind(AssertUnwindSafe(f))
}

pub(crate) struct QueueState<T> {
    items: VecDeque<T>,
    active: usize,
    accepting: bool,
    running: bool,
}

impl<T> QueueState<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Items taken off the queue that have not finished yet.
    pub fn active(&self) -> usize {
        self.active
    }

    fn is_idle(&self) -> bool {
        self.items.is_empty() && self.active == 0
    }
}

pub(crate) struct QueueCore<T> {
    inner: Arc<dyn Worker>,
    state: Mutex<QueueState<T>>,
    idle: Condvar,
}

impl<T: Send> QueueCore<T> {
    pub fn new(inner: Arc<dyn Worker>) -> Self {
        Self {
            inner,
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                active: 0,
                accepting: true,
                running: true,
            }),
            idle: Condvar::new(),
        }
    }

    /// Insert `item` at the index `position` picks, then forward whatever
    /// `dispatch` returns to the inner worker.
    ///
    /// Both callbacks run under the queue lock. If the inner worker refuses
    /// the dispatch the insert is undone, so a failed add changes nothing.
    pub fn add<P, D>(&self, item: T, position: P, dispatch: D) -> Result<()>
    where
        P: FnOnce(&VecDeque<T>) -> usize,
        D: FnOnce(&QueueState<T>) -> Option<Work>,
    {
        let mut state = self.state.lock();
        if !state.accepting {
            return Err(Error::Unavailable);
        }

        let index = position(&state.items).min(state.items.len());
        state.items.insert(index, item);

        if let Some(work) = dispatch(&*state) {
            if let Err(e) = self.add_direct(&state, work) {
                state.items.remove(index);
                return Err(e);
            }
        }

        Ok(())
    }

    /// Forward raw work to the inner worker. Called with the lock held.
    fn add_direct(&self, state: &QueueState<T>, work: Work) -> Result<()> {
        if !state.accepting {
            return Err(Error::Unavailable);
        }
        self.inner.add(work)
    }

    /// Pop the front item and mark it active until [`item_done`](Self::item_done).
    pub fn next_item(&self) -> Option<T> {
        let mut state = self.state.lock();
        let item = state.items.pop_front();
        if item.is_some() {
            state.active += 1;
        }
        item
    }

    pub fn item_done(&self) {
        let mut state = self.state.lock();
        state.active = state.active.saturating_sub(1);
        self.notify_if_empty(&state);
    }

    /// Pop the front item without marking it active.
    pub fn remove_front(&self) -> Option<T> {
        let mut state = self.state.lock();
        let item = state.items.pop_front();
        self.notify_if_empty(&state);
        item
    }

    pub fn queued(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_work_queued(&self) -> bool {
        !self.state.lock().is_idle()
    }

    fn notify_if_empty(&self, state: &QueueState<T>) {
        if state.is_idle() {
            self.idle.notify_all();
        }
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        if !state.accepting {
            return;
        }
        state.accepting = false;
        while !state.is_idle() {
            self.idle.wait(&mut state);
        }
        state.running = false;
    }

    pub fn is_accepting(&self) -> bool {
        self.state.lock().accepting
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }
}

impl<T> QueueCore<T>
where
    T: FnOnce() + Send + 'static,
{
    /// Run queued items one at a time, in order, until the queue is empty.
    ///
    /// The running item stays counted as active, so an `add` racing with the
    /// last item does not see an idle queue. If an item panics, the rest of
    /// the queue moves to a fresh drain on the inner worker and the panic is
    /// resumed. When the inner worker refuses that drain, the rest runs here
    /// and the first panic is resumed at the end.
    pub fn execute_all(self: &Arc<Self>) {
        let mut state = self.state.lock();
        let mut deferred = None;

        while let Some(item) = state.items.pop_front() {
            state.active += 1;
            let result = MutexGuard::unlocked(&mut state, || run_caught(item));
            state.active -= 1;

            let Err(payload) = result else { continue };
            if deferred.is_some() {
                continue;
            }
            if state.items.is_empty() {
                deferred = Some(payload);
                break;
            }

            let core = Arc::clone(self);
            let drain: Work = Box::new(move || core.execute_all());
            if self.inner.add(drain).is_ok() {
                drop(state);
                panic::resume_unwind(payload);
            }
            tracing::debug!("inner worker refused a follow-up drain, draining in place");
            deferred = Some(payload);
        }

        self.notify_if_empty(&state);
        drop(state);
        if let Some(payload) = deferred {
            panic::resume_unwind(payload);
        }
    }
}
