//! Priority reordering in front of another worker.

use super::common::{run_caught, QueueCore};
use crate::error::Result;
use crate::worker::{Work, Worker};
use std::panic;
use std::sync::Arc;

/// Scheduling priority. Smaller values run first.
pub type Priority = u32;

struct PriorityWork {
    priority: Priority,
    work: Work,
}

/// Reorders queued work by priority before it reaches the inner worker.
///
/// Each `add` queues its work here and sends one dispatch to the inner
/// worker. A dispatch runs whatever item is most important *when it starts*,
/// not necessarily the item that scheduled it. Equal priorities run in
/// submission order.
///
/// With a multi-threaded inner worker several dispatches can pop
/// concurrently, so two items may run out of strict priority order relative
/// to each other; only the pick made at the start of each dispatch is
/// ordered.
pub struct PriorityWorker {
    core: Arc<QueueCore<PriorityWork>>,
    default_priority: Priority,
}

impl PriorityWorker {
    /// Feed `inner` with a default priority of 0.
    pub fn new(inner: Arc<dyn Worker>) -> Self {
        Self::with_default_priority(inner, 0)
    }

    /// Work added through [`Worker::add`] gets `default_priority`.
    pub fn with_default_priority(inner: Arc<dyn Worker>, default_priority: Priority) -> Self {
        Self {
            core: Arc::new(QueueCore::new(inner)),
            default_priority,
        }
    }

    /// Priority given to work added without one.
    pub fn default_priority(&self) -> Priority {
        self.default_priority
    }

    /// Queue `work` behind everything of equal or smaller priority.
    pub fn add_with_priority(&self, work: Work, priority: Priority) -> Result<()> {
        let core = Arc::clone(&self.core);
        self.core.add(
            PriorityWork { priority, work },
            // before the first entry with a strictly larger priority
            |queue| queue.partition_point(|queued| queued.priority <= priority),
            move |_| {
                let dispatch: Work = Box::new(move || run_next(&core));
                Some(dispatch)
            },
        )
    }

    /// Convenience form of [`add_with_priority`](Self::add_with_priority).
    pub fn execute_with_priority<F>(&self, f: F, priority: Priority) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.add_with_priority(Box::new(f), priority)
    }

    /// Items not yet picked by a dispatch.
    pub fn queued(&self) -> usize {
        self.core.queued()
    }

    /// Nothing queued here and nothing from here still running.
    pub fn is_idle(&self) -> bool {
        !self.core.is_work_queued()
    }
}

fn run_next(core: &QueueCore<PriorityWork>) {
    if let Some(next) = core.next_item() {
        tracing::trace!(priority = next.priority, "priority dispatch");
        let result = run_caught(next.work);
        core.item_done();
        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
    }
}

impl Worker for PriorityWorker {
    fn add(&self, work: Work) -> Result<()> {
        self.add_with_priority(work, self.default_priority)
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

impl Drop for PriorityWorker {
    fn drop(&mut self) {
        self.core.stop();
    }
}

impl std::fmt::Debug for PriorityWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityWorker")
            .field("default_priority", &self.default_priority)
            .field("queued", &self.core.queued())
            .finish()
    }
}
