//! Task representation and execution.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Internal task representation
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) func: Box<dyn FnOnce() + Send + 'static>,
    /// Shard affinity hint. `None` means the task goes through the global
    /// injector and any worker may pick it up.
    pub(crate) placement: Option<usize>,
    pub(crate) spawn_time: Instant,
}

impl Task {
    /// Create a new task with no placement preference
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            func: Box::new(f),
            placement: None,
            spawn_time: Instant::now(),
        }
    }

    /// Create a task with a shard affinity hint
    pub fn with_placement<F>(f: F, placement: Option<usize>) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            func: Box::new(f),
            placement,
            spawn_time: Instant::now(),
        }
    }

    /// Execute the task
    pub fn execute(self) {
        (self.func)();
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("placement", &self.placement)
            .field("spawn_time", &self.spawn_time)
            .finish()
    }
}
