//! Completion alerts for a stream of work.

use super::common::{run_caught, QueueCore};
use crate::error::Result;
use crate::worker::{Work, Worker};
use parking_lot::Mutex;
use std::panic;
use std::sync::Arc;

/// Called by a [`DiligentWorker`] each time its outstanding work drains.
pub type Alert = Box<dyn Fn() + Send + Sync + 'static>;

struct Shared {
    // one token per outstanding item
    core: QueueCore<()>,
    alert: Alert,
    alerting: Mutex<()>,
}

/// Fires an alert whenever all of its work has completed.
///
/// Execution order is left to the inner worker. The alert runs on the thread
/// that finished the last outstanding item, before that item is counted as
/// done, so [`stop`](Worker::stop) returns only after the final alert.
/// Alerts never overlap each other.
pub struct DiligentWorker {
    shared: Arc<Shared>,
}

impl DiligentWorker {
    /// Feed `inner` and call `alert` whenever outstanding work drops to zero.
    pub fn new<F>(inner: Arc<dyn Worker>, alert: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                core: QueueCore::new(inner),
                alert: Box::new(alert),
                alerting: Mutex::new(()),
            }),
        }
    }

    /// Items added but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.shared.core.queued()
    }
}

impl Shared {
    fn complete(&self, work: Work) {
        let mut result = run_caught(work);

        // Completions are serialized here so only the last one out sees a
        // count of one, and alerts can't run concurrently.
        {
            let _alerting = self.alerting.lock();
            if self.core.queued() == 1 {
                tracing::trace!("diligent worker drained");
                result = result.and(run_caught(|| (self.alert)()));
            }
            self.core.remove_front();
        }

        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
    }
}

impl Worker for DiligentWorker {
    fn add(&self, work: Work) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        self.shared.core.add(
            (),
            |queue| queue.len(),
            move |_| {
                let wrapped: Work = Box::new(move || shared.complete(work));
                Some(wrapped)
            },
        )
    }

    fn stop(&self) {
        self.shared.core.stop();
    }

    fn is_accepting(&self) -> bool {
        self.shared.core.is_accepting()
    }

    fn is_running(&self) -> bool {
        self.shared.core.is_running()
    }
}

impl Drop for DiligentWorker {
    fn drop(&mut self) {
        self.shared.core.stop();
    }
}

impl std::fmt::Debug for DiligentWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiligentWorker")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ThreadPool;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_alert_once_per_drain() {
        let pool = Arc::new(ThreadPool::new(4).unwrap());
        let alerts = Arc::new(AtomicUsize::new(0));
        let counter = alerts.clone();
        let dw = DiligentWorker::new(pool, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock();
        for _ in 0..8 {
            let gate = gate.clone();
            dw.execute(move || drop(gate.lock())).unwrap();
        }
        assert_eq!(dw.outstanding(), 8);
        drop(held);

        dw.stop();
        assert_eq!(alerts.load(Ordering::SeqCst), 1);
        assert_eq!(dw.outstanding(), 0);
    }

    #[test]
    fn test_no_alert_without_work() {
        let pool = Arc::new(ThreadPool::new(1).unwrap());
        let alerts = Arc::new(AtomicUsize::new(0));
        let counter = alerts.clone();
        let dw = DiligentWorker::new(pool, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dw.stop();
        assert_eq!(alerts.load(Ordering::SeqCst), 0);
        assert!(!dw.is_running());
    }
}
