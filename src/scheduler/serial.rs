//! Strictly ordered, one-at-a-time execution.

use super::common::QueueCore;
use crate::error::Result;
use crate::worker::{Work, Worker};
use std::sync::Arc;

/// Runs its work one item at a time, in submission order.
///
/// Only one drain request is outstanding on the inner worker at a time, so
/// items never overlap even when the inner worker has many threads. A long
/// queue here can starve other users of the inner worker's threads.
pub struct SerialWorker {
    core: Arc<QueueCore<Work>>,
}

impl SerialWorker {
    /// Feed `inner`, which keeps running after this worker stops.
    pub fn new(inner: Arc<dyn Worker>) -> Self {
        Self {
            core: Arc::new(QueueCore::new(inner)),
        }
    }

    /// Items waiting behind the one running.
    pub fn queued(&self) -> usize {
        self.core.queued()
    }

    /// Nothing queued here and nothing from here still running.
    pub fn is_idle(&self) -> bool {
        !self.core.is_work_queued()
    }
}

impl Worker for SerialWorker {
    fn add(&self, work: Work) -> Result<()> {
        let core = Arc::clone(&self.core);
        self.core.add(
            work,
            |queue| queue.len(),
            move |state| {
                if state.len() == 1 && state.active() == 0 {
                    let drain: Work = Box::new(move || core.execute_all());
                    Some(drain)
                } else {
                    None
                }
            },
        )
    }

    fn stop(&self) {
        self.core.stop();
    }

    fn is_accepting(&self) -> bool {
        self.core.is_accepting()
    }

    fn is_running(&self) -> bool {
        self.core.is_running()
    }
}

impl Drop for SerialWorker {
    fn drop(&mut self) {
        self.core.stop();
    }
}

impl std::fmt::Debug for SerialWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialWorker")
            .field("queued", &self.core.queued())
            .finish()
    }
}
