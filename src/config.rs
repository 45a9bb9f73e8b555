//! Settings shared by the pool engines.

use crate::error::{Error, Result};
use crate::executor::PanicStrategy;

const MAX_THREADS: usize = 1024;

/// Pool settings. Build one with [`Config::builder`] to get validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Thread count for a fixed pool, or the ceiling for an elastic one.
    pub num_threads: usize,
    /// Queued items per thread an elastic pool tolerates before growing.
    pub max_backlog: usize,
    /// Threads are named `<prefix>-<index>`.
    pub thread_name_prefix: String,
    /// Stack size for pool threads; `None` keeps the platform default.
    pub stack_size: Option<usize>,
    /// Applied to work that panics on a pool thread.
    pub panic_strategy: PanicStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            max_backlog: 4,
            thread_name_prefix: "bureau-worker".to_string(),
            stack_size: None,
            panic_strategy: PanicStrategy::default(),
        }
    }
}

impl Config {
    /// Start from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Reject zero or oversized thread counts, a zero backlog and a zero
    /// stack size.
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(Error::config("num_threads must be > 0"));
        }
        if self.num_threads > MAX_THREADS {
            return Err(Error::config(format!(
                "num_threads too large (max {})",
                MAX_THREADS
            )));
        }
        if self.max_backlog == 0 {
            return Err(Error::config("max_backlog must be > 0"));
        }
        if let Some(0) = self.stack_size {
            return Err(Error::config("stack_size must be > 0"));
        }

        Ok(())
    }

    pub(crate) fn thread_name(&self, index: usize) -> String {
        format!("{}-{}", self.thread_name_prefix, index)
    }
}

/// Consuming builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Same as [`Config::builder`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// See [`Config::num_threads`].
    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = n;
        self
    }

    /// See [`Config::max_backlog`].
    pub fn max_backlog(mut self, backlog: usize) -> Self {
        self.config.max_backlog = backlog;
        self
    }

    /// See [`Config::thread_name_prefix`].
    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// See [`Config::stack_size`].
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// See [`Config::panic_strategy`].
    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    /// Validate and return the config.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
