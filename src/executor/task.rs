//! Queued work as seen by a pool engine.

use crate::worker::Work;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier attached to each item a pool queues, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

pub(crate) struct Task {
    pub(crate) id: TaskId,
    func: Work,
    enqueued: Instant,
}

impl Task {
    pub fn new(func: Work) -> Self {
        Task {
            id: TaskId::next(),
            func,
            enqueued: Instant::now(),
        }
    }

    /// Time spent in the queue so far.
    pub fn waited(&self) -> Duration {
        self.enqueued.elapsed()
    }

    pub fn execute(self) {
        (self.func)();
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("enqueued", &self.enqueued)
            .finish()
    }
}
