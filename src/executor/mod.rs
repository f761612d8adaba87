//! Task execution infrastructure.
//!
//! This module provides the core task execution primitives including
//! worker threads, task queues, and the CPU thread pool.

pub mod pool;
pub mod task;
pub mod worker;

pub use pool::CpuPool;

pub(crate) use task::Task;
