//! The contract shared by every executor in the crate.

use crate::error::Result;
use std::sync::Arc;

/// A unit of deferred execution.
///
/// Work is run at most once. It is expected not to panic; a panic is caught
/// by the thread that runs it (see [`PanicStrategy`](crate::executor::PanicStrategy)).
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Something that accepts [`Work`] and runs it.
///
/// Every implementation follows the same lifecycle: it starts both
/// accepting and running. [`stop`](Worker::stop) flips accepting off, waits
/// for previously accepted work to finish, then flips running off.
pub trait Worker: Send + Sync {
    /// Queue `work` for execution.
    ///
    /// Fails with [`Error::Unavailable`](crate::Error::Unavailable) once the
    /// worker has stopped accepting. A failed `add` leaves the worker
    /// unchanged.
    fn add(&self, work: Work) -> Result<()>;

    /// Stop accepting work and block until accepted work has completed.
    ///
    /// Calling `stop` a second time is a no-op. Calling it from two threads
    /// at once, or from work running on this worker, is not supported.
    fn stop(&self);

    /// False once `stop` has begun.
    fn is_accepting(&self) -> bool;

    /// False once `stop` has finished.
    fn is_running(&self) -> bool;

    /// Box `f` and [`add`](Worker::add) it.
    fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
        Self: Sized,
    {
        self.add(Box::new(f))
    }
}

impl<W: Worker + ?Sized> Worker for Arc<W> {
    fn add(&self, work: Work) -> Result<()> {
        (**self).add(work)
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn is_accepting(&self) -> bool {
        (**self).is_accepting()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}
