//! Convenient re-exports of commonly used types.

pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{ElasticThreadPool, PanicStrategy, ThreadPool};
pub use crate::scheduler::{DiligentWorker, Priority, PriorityWorker, SerialWorker};
pub use crate::timer::{CancelStatus, Item, Status, Timer};
pub use crate::worker::{Work, Worker};
