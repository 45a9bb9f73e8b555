//! Shared machinery behind the fixed and elastic thread pools.
//!
//! One mutex guards the FIFO queue, the thread handles and both lifecycle
//! flags. Worker threads release it while running an item so submission is
//! never blocked behind execution.

use super::panic_handler::PanicHandler;
use super::task::Task;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::worker::Work;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub(crate) struct PoolState {
    queue: VecDeque<Task>,
    threads: Vec<JoinHandle<()>>,
    accepting: bool,
    running: bool,
}

impl PoolState {
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn spawned(&self) -> usize {
        self.threads.len()
    }
}

struct PoolShared {
    state: Mutex<PoolState>,
    work_ready: Condvar,
    panic_handler: PanicHandler,
}

pub(crate) struct Engine {
    shared: Arc<PoolShared>,
    config: Config,
}

impl Engine {
    /// Build an engine and spawn `initial` threads.
    ///
    /// If a spawn fails, the threads already started are stopped and joined
    /// before the error is returned.
    pub fn start(config: Config, initial: usize) -> Result<Self> {
        config.validate()?;
        if initial == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let engine = Self {
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    threads: Vec::with_capacity(config.num_threads),
                    accepting: true,
                    running: true,
                }),
                work_ready: Condvar::new(),
                panic_handler: PanicHandler::new(config.panic_strategy),
            }),
            config,
        };

        let spawned = {
            let mut state = engine.shared.state.lock();
            (0..initial).try_for_each(|_| engine.spawn_thread(&mut state))
        };

        if let Err(e) = spawned {
            engine.stop();
            return Err(e);
        }

        tracing::debug!(
            threads = initial,
            prefix = %engine.config.thread_name_prefix,
            "pool started"
        );
        Ok(engine)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Must be called with the state lock held.
    fn spawn_thread(&self, state: &mut MutexGuard<'_, PoolState>) -> Result<()> {
        let index = state.threads.len();
        let mut builder = thread::Builder::new().name(self.config.thread_name(index));
        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let shared = Arc::clone(&self.shared);
        let handle = builder.spawn(move || run_worker(&shared))?;
        state.threads.push(handle);
        Ok(())
    }

    pub fn push(&self, work: Work) -> Result<()> {
        self.push_and_grow(work, |_| false)
    }

    /// Enqueue `work`, then spawn one more thread if `grow` says so.
    ///
    /// `grow` observes the queue and thread count under the same lock the
    /// enqueue used. Growth failures are logged; the work stays queued.
    pub fn push_and_grow<F>(&self, work: Work, grow: F) -> Result<()>
    where
        F: FnOnce(&PoolState) -> bool,
    {
        let mut state = self.shared.state.lock();
        if !state.accepting {
            return Err(Error::Unavailable);
        }

        let task = Task::new(work);
        tracing::trace!(task = task.id.as_u64(), queued = state.queue.len(), "enqueue");
        state.queue.push_back(task);
        self.shared.work_ready.notify_one();

        if grow(&*state) {
            match self.spawn_thread(&mut state) {
                Ok(()) => tracing::debug!(
                    threads = state.threads.len(),
                    queued = state.queue.len(),
                    "pool grew"
                ),
                Err(e) => tracing::warn!(error = %e, "failed to grow pool"),
            }
        }

        Ok(())
    }

    pub fn stop(&self) {
        let threads = {
            let mut state = self.shared.state.lock();
            if !state.accepting {
                return;
            }
            state.accepting = false;
            self.shared.work_ready.notify_all();
            std::mem::take(&mut state.threads)
        };

        // A pool dropped from one of its own items can't join that thread;
        // it exits on its own once the queue is drained.
        let current = thread::current().id();
        for handle in threads {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::warn!("worker thread exited abnormally");
            }
        }

        self.shared.state.lock().running = false;
        tracing::debug!(prefix = %self.config.thread_name_prefix, "pool stopped");
    }

    pub fn is_accepting(&self) -> bool {
        self.shared.state.lock().accepting
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    pub fn queued(&self) -> usize {
        self.shared.state.lock().queued()
    }

    pub fn spawned(&self) -> usize {
        self.shared.state.lock().spawned()
    }

    pub fn panic_count(&self) -> usize {
        self.shared.panic_handler.panic_count()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Engine")
            .field("threads", &state.threads.len())
            .field("queued", &state.queue.len())
            .field("accepting", &state.accepting)
            .field("running", &state.running)
            .finish()
    }
}

// Drains the queue in FIFO order, sleeping while it is empty. Only exits once
// accepting is off and nothing is left, so stop never strands queued work.
fn run_worker(shared: &PoolShared) {
    let mut state = shared.state.lock();

    loop {
        while let Some(task) = state.queue.pop_front() {
            MutexGuard::unlocked(&mut state, || {
                tracing::trace!(
                    task = task.id.as_u64(),
                    waited_us = task.waited().as_micros() as u64,
                    "dequeue"
                );
                let _ = shared.panic_handler.execute(|| task.execute());
            });
        }

        if !state.accepting {
            break;
        }
        shared.work_ready.wait(&mut state);
    }
}
