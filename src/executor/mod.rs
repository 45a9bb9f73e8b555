//! Thread-pool engines.
//!
//! [`ThreadPool`] runs a fixed number of threads; [`ElasticThreadPool`]
//! starts with one and grows toward a ceiling as backlog builds. Both share
//! the same queue and thread loop.

mod engine;
pub mod elastic;
pub mod panic_handler;
mod task;
pub mod thread_pool;

pub use elastic::ElasticThreadPool;
pub use panic_handler::{PanicHandler, PanicInfo, PanicStrategy};
pub use thread_pool::ThreadPool;
