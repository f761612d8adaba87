use super::task::Task;
use super::worker::{Worker, WorkerId};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::telemetry::Metrics;
use crossbeam_deque::{Injector, Steal, Stealer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

#[cfg(target_os = "linux")]
fn pin_thread_to_core(core_id: usize) {
    unsafe {
        let mut cpuset: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id, &mut cpuset);
        let result = libc::sched_setaffinity(
            0, // current thread
            std::mem::size_of::<libc::cpu_set_t>(),
            &cpuset,
        );
        if result != 0 {
            eprintln!(
                "Failed to pin thread {} to core {}",
                std::thread::current().name().unwrap_or("unknown"),
                core_id
            );
        }
    }
}

/// Work-stealing worker pool.
///
/// Tasks with a placement hint land in a per-worker shard injector; everything
/// else goes through the global injector. Idle workers raid other shards, so a
/// hint never strands work.
pub struct CpuPool {
    workers: Vec<WorkerHandle>,
    injector: Arc<Injector<Task>>,
    shards: Vec<Arc<Injector<Task>>>,
    stealers: Vec<Stealer<Task>>,
    shutdown: Arc<AtomicBool>,
    num_threads: usize,
    pending_tasks: Arc<AtomicUsize>,
    pub(crate) metrics: Arc<Metrics>,
}

struct WorkerHandle {
    thread: Option<JoinHandle<()>>,
    unparker: thread::Thread,
}

impl CpuPool {
    pub fn new(config: &Config) -> Result<Self> {
        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let injector = Arc::new(Injector::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let pending_tasks = Arc::new(AtomicUsize::new(0));
        let metrics = Arc::new(Metrics::new());

        let shards: Vec<Arc<Injector<Task>>> =
            (0..num_threads).map(|_| Arc::new(Injector::new())).collect();

        let mut workers = Vec::with_capacity(num_threads);
        let mut stealers = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id, metrics.clone());
            stealers.push(worker.local_queue.stealer());
            workers.push(worker);
        }

        let mut handles = Vec::with_capacity(num_threads);

        for worker in workers {
            let id: WorkerId = worker.id;
            let stealers_clone = stealers.clone();
            let injector_clone = injector.clone();
            let shards_clone = shards.clone();
            let shutdown_clone = shutdown.clone();
            let pending_clone = pending_tasks.clone();
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);

            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let pin_workers = config.pin_workers;
            let thread = builder
                .spawn(move || {
                    // Pin worker to core if requested
                    #[cfg(target_os = "linux")]
                    if pin_workers {
                        pin_thread_to_core(id);
                    }
                    #[cfg(not(target_os = "linux"))]
                    let _ = pin_workers;

                    worker.run(
                        stealers_clone,
                        injector_clone,
                        shards_clone,
                        shutdown_clone,
                        pending_clone,
                    );
                })
                .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

            let unparker = thread.thread().clone();

            handles.push(WorkerHandle {
                thread: Some(thread),
                unparker,
            });
        }

        Ok(Self {
            workers: handles,
            injector,
            shards,
            stealers,
            shutdown,
            num_threads,
            pending_tasks,
            metrics,
        })
    }

    pub(crate) fn submit(&self, task: Task) {
        self.pending_tasks.fetch_add(1, Ordering::Release);

        match task.placement {
            Some(node) => {
                let shard = node % self.num_threads;
                self.shards[shard].push(task);
                self.workers[shard].unparker.unpark();
            }
            None => {
                self.injector.push(task);
                // Wake up a worker
                if let Some(worker) = self.workers.get(self.num_threads / 2) {
                    worker.unparker.unpark();
                }
            }
        }
    }

    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Task::new(f));
    }

    /// Pull one queued task and run it on the calling thread.
    ///
    /// Lets a thread that is blocked on a join make progress instead of
    /// sleeping, which keeps nested graphs live even on a single-worker pool.
    pub fn help_run_one(&self) -> bool {
        let task = self
            .steal_from(&self.injector)
            .or_else(|| self.shards.iter().find_map(|s| self.steal_from(s)))
            .or_else(|| self.steal_from_workers());

        match task {
            Some(task) => {
                self.run_task(task);
                true
            }
            None => false,
        }
    }

    /// Block (helping) until every previously submitted task has finished.
    pub fn barrier(&self) {
        while self.pending_tasks.load(Ordering::Acquire) > 0 {
            if !self.help_run_one() {
                thread::yield_now();
            }
        }
    }

    fn steal_from(&self, injector: &Injector<Task>) -> Option<Task> {
        loop {
            match injector.steal() {
                Steal::Success(task) => return Some(task),
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        }
    }

    fn steal_from_workers(&self) -> Option<Task> {
        for stealer in &self.stealers {
            loop {
                match stealer.steal() {
                    Steal::Success(task) => return Some(task),
                    Steal::Empty => break,
                    Steal::Retry => continue,
                }
            }
        }
        None
    }

    fn run_task(&self, task: Task) {
        let tid = task.id;
        let start = Instant::now();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            task.execute();
        }));

        let duration_ns = start.elapsed().as_nanos() as u64;

        match result {
            Ok(_) => self.metrics.record_task_execution(duration_ns),
            Err(_) => {
                eprintln!("task {:?} panicked", tid);
                self.metrics.record_task_panic();
            }
        }

        self.pending_tasks.fetch_sub(1, Ordering::Release);
    }

    pub fn pending_tasks(&self) -> usize {
        self.pending_tasks.load(Ordering::Relaxed)
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);

        // wake everyone up to check shutdown flag
        for worker in &self.workers {
            worker.unparker.unpark();
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

impl Drop for CpuPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
