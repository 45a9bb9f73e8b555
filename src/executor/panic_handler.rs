//! Containment for work that panics.
//!
//! Pool threads and the timer thread run every item through a
//! [`PanicHandler`], so a panic never unwinds out of their loops. What
//! happens once it is caught is up to the [`PanicStrategy`]. Decorators do
//! not contain panics themselves; they pass them on to the worker they wrap.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// What a pool or timer does with a panic raised by the work it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicStrategy {
    /// Log at error level, then abort the process.
    Abort,
    /// Count the panic and keep going without logging.
    Isolate,
    /// Count the panic, log a warning and keep going.
    #[default]
    LogAndContinue,
}

/// Catches panics from work and applies a [`PanicStrategy`] to them.
#[derive(Debug)]
pub struct PanicHandler {
    strategy: PanicStrategy,
    caught: AtomicUsize,
}

impl PanicHandler {
    /// A handler applying `strategy`.
    pub fn new(strategy: PanicStrategy) -> Self {
        Self {
            strategy,
            caught: AtomicUsize::new(0),
        }
    }

    /// Run `f` on the current thread.
    ///
    /// If `f` panics the strategy is applied and the panic's details come
    /// back as the error. With [`PanicStrategy::Abort`] this never returns.
    pub fn execute<F, R>(&self, f: F) -> Result<R, PanicInfo>
    where
        F: FnOnce() -> R,
    {
        panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| self.contain(payload))
    }

    fn contain(&self, payload: Box<dyn Any + Send>) -> PanicInfo {
        self.caught.fetch_add(1, Ordering::Relaxed);
        let info = PanicInfo::capture(payload.as_ref());
        let thread_name = info.thread.as_deref().unwrap_or("unnamed");

        match self.strategy {
            PanicStrategy::Abort => {
                tracing::error!(thread = thread_name, message = %info.message, "work panicked, aborting");
                std::process::abort();
            }
            PanicStrategy::Isolate => {}
            PanicStrategy::LogAndContinue => {
                tracing::warn!(thread = thread_name, message = %info.message, "work panicked");
            }
        }

        info
    }

    /// Panics caught since the handler was created.
    pub fn panic_count(&self) -> usize {
        self.caught.load(Ordering::Relaxed)
    }

    /// The strategy this handler applies.
    pub fn strategy(&self) -> PanicStrategy {
        self.strategy
    }
}

impl Default for PanicHandler {
    fn default() -> Self {
        Self::new(PanicStrategy::default())
    }
}

/// What is known about a caught panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicInfo {
    /// The panic message, or a placeholder if the payload was not a string.
    pub message: String,
    /// Name of the thread the work was running on, if it had one.
    pub thread: Option<String>,
}

impl PanicInfo {
    const OPAQUE: &'static str = "<non-string panic payload>";

    fn capture(payload: &(dyn Any + Send)) -> Self {
        let message = match payload.downcast_ref::<&'static str>() {
            Some(s) => (*s).to_owned(),
            None => payload
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_else(|| Self::OPAQUE.to_owned()),
        };

        Self {
            message,
            thread: thread::current().name().map(str::to_owned),
        }
    }
}
