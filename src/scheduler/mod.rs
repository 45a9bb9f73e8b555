//! Decorators that add scheduling policy on top of another [`Worker`].
//!
//! Each decorator owns its own queue and accept/run flags and feeds the
//! worker it wraps. Stopping a decorator drains the decorator's queue only;
//! the wrapped worker keeps running until it is stopped itself.
//!
//! A panic in decorated work is not contained by the decorator. Once the
//! decorator's own bookkeeping is settled the panic is resumed, so the
//! [`PanicStrategy`](crate::PanicStrategy) of the pool underneath applies.
//!
//! [`Worker`]: crate::Worker

mod common;
pub mod diligent;
pub mod priority;
pub mod serial;

pub use diligent::{Alert, DiligentWorker};
pub use priority::{Priority, PriorityWorker};
pub use serial::SerialWorker;
