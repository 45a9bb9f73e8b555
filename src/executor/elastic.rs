//! Pool that adds threads as its backlog grows.

use super::engine::Engine;
use crate::config::Config;
use crate::error::Result;
use crate::worker::{Work, Worker};

/// A pool that starts with one thread and grows under load.
///
/// After every `add`, if the queue holds more than `max_backlog` items per
/// spawned thread and fewer than `max_threads` threads exist, one thread is
/// spawned. Threads are never retired before [`stop`](Worker::stop).
#[derive(Debug)]
pub struct ElasticThreadPool {
    engine: Engine,
}

impl ElasticThreadPool {
    /// Allow up to `max_threads` threads, growing once more than
    /// `max_backlog` items per thread are queued.
    pub fn new(max_threads: usize, max_backlog: usize) -> Result<Self> {
        let config = Config::builder()
            .num_threads(max_threads)
            .max_backlog(max_backlog)
            .build()?;
        Self::with_config(config)
    }

    /// `config.num_threads` is the ceiling.
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            engine: Engine::start(config, 1)?,
        })
    }

    /// The thread ceiling.
    pub fn max_threads(&self) -> usize {
        self.engine.config().num_threads
    }

    /// Queued items per thread tolerated before growing.
    pub fn max_backlog(&self) -> usize {
        self.engine.config().max_backlog
    }

    /// Threads started so far.
    pub fn spawned_threads(&self) -> usize {
        self.engine.spawned()
    }

    /// Items waiting for a thread.
    pub fn queued(&self) -> usize {
        self.engine.queued()
    }

    /// Panics caught on this pool's threads.
    pub fn panic_count(&self) -> usize {
        self.engine.panic_count()
    }
}

impl Worker for ElasticThreadPool {
    fn add(&self, work: Work) -> Result<()> {
        let max_threads = self.max_threads();
        let max_backlog = self.max_backlog();

        self.engine.push_and_grow(work, |state| {
            let threads = state.spawned().max(1);
            let backlog = state.queued() / threads;
            backlog > max_backlog && state.spawned() < max_threads
        })
    }

    fn stop(&self) {
        self.engine.stop();
    }

    fn is_accepting(&self) -> bool {
        self.engine.is_accepting()
    }

    fn is_running(&self) -> bool {
        self.engine.is_running()
    }
}

impl Drop for ElasticThreadPool {
    fn drop(&mut self) {
        self.engine.stop();
    }
}
