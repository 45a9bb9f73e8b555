//! Bureau - composable thread pools and scheduling decorators
//!
//! Every executor implements the [`Worker`] trait: `add`, `stop`,
//! `is_accepting`, `is_running`. Pool engines own threads; decorators wrap
//! another `Worker` and add policy on top of it. A [`Timer`] fires callbacks
//! at requested times on its own thread.
//!
//! # Quick Start
//!
//! ```no_run
//! use bureau::prelude::*;
//! use std::sync::Arc;
//!
//! let pool = Arc::new(ThreadPool::new(4)?);
//!
//! // strict submission order on top of a multi-threaded pool
//! let serial = SerialWorker::new(pool.clone());
//! for i in 0..10 {
//!     serial.execute(move || println!("step {}", i))?;
//! }
//! serial.stop();
//!
//! let timer = Timer::new()?;
//! let item = timer.add_after(|| println!("late"), std::time::Duration::from_secs(5))?;
//! assert_eq!(timer.cancel(item), CancelStatus::Cancelled);
//! # Ok::<(), bureau::Error>(())
//! ```
//!
//! # Components
//!
//! - **ThreadPool**: fixed number of threads, FIFO dispatch
//! - **ElasticThreadPool**: starts with one thread, grows with backlog
//! - **SerialWorker**: one item at a time, in order
//! - **PriorityWorker**: lowest priority value dispatches first
//! - **DiligentWorker**: alert callback each time its work drains
//! - **Timer**: cancellable delayed callbacks
//!
//! Decorators hold an `Arc` to the worker they wrap and never stop it.
//! `stop` on a decorator drains only the decorator's own queue.

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod scheduler;
pub mod timer;
pub mod worker;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{ElasticThreadPool, PanicStrategy, ThreadPool};
pub use scheduler::{DiligentWorker, Priority, PriorityWorker, SerialWorker};
pub use timer::{CancelStatus, Item, Status, Timer};
pub use worker::{Work, Worker};
