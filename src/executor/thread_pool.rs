//! Fixed-size pool.

use super::engine::Engine;
use crate::config::Config;
use crate::error::Result;
use crate::worker::{Work, Worker};

/// A fixed set of threads draining one FIFO queue.
///
/// Dispatch is FIFO; completion order across threads is not.
#[derive(Debug)]
pub struct ThreadPool {
    engine: Engine,
}

impl ThreadPool {
    /// Start a pool with `num_threads` threads and default settings otherwise.
    pub fn new(num_threads: usize) -> Result<Self> {
        let config = Config::builder().num_threads(num_threads).build()?;
        Self::with_config(config)
    }

    /// Start `config.num_threads` threads configured by `config`.
    pub fn with_config(config: Config) -> Result<Self> {
        let threads = config.num_threads;
        Ok(Self {
            engine: Engine::start(config, threads)?,
        })
    }

    /// Threads started at construction.
    pub fn num_threads(&self) -> usize {
        self.engine.config().num_threads
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

impl Worker for ThreadPool {
    fn add(&self, work: Work) -> Result<()> {
        self.engine.push(work)
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

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.engine.stop();
    }
}
