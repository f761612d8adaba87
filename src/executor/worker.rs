// worker thread stuff
use super::task::Task;
use crate::telemetry::Metrics;
use crossbeam_deque::{Injector, Stealer, Worker as WorkerQueue};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub type WorkerId = usize;

// stats for each worker
pub struct WorkerState {
    pub tasks_executed: AtomicU64,
    pub tasks_stolen: AtomicU64,
    pub idle_time_ns: AtomicU64,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            tasks_executed: AtomicU64::new(0),
            tasks_stolen: AtomicU64::new(0),
            idle_time_ns: AtomicU64::new(0),
        }
    }
}

pub(crate) struct Worker {
    pub id: WorkerId,
    pub local_queue: WorkerQueue<Task>,
    pub state: Arc<WorkerState>,
    pub metrics: Arc<Metrics>,
}

impl Worker {
    pub fn new(id: WorkerId, metrics: Arc<Metrics>) -> Self {
        Self {
            id,
            local_queue: WorkerQueue::new_fifo(),
            state: Arc::new(WorkerState::new()),
            metrics,
        }
    }

    // main loop
    pub fn run(
        &self,
        stealers: Vec<Stealer<Task>>,
        injector: Arc<Injector<Task>>,
        shards: Vec<Arc<Injector<Task>>>,
        shutdown: Arc<AtomicBool>,
        pending_tasks: Arc<AtomicUsize>,
    ) {
        let mut backoff_cnt = 0;

        loop {
            if shutdown.load(Ordering::Acquire) {
                break;
            }

            // Priority: local -> own shard -> global -> other shards -> steal
            if let Some(task) = self.find_task(&stealers, &injector, &shards) {
                backoff_cnt = 0;
                self.execute_task(task);
                pending_tasks.fetch_sub(1, Ordering::Release);
            } else {
                // nothing to do, backoff
                if self.backoff(&mut backoff_cnt) {
                    break;
                }
            }
        }
    }

    fn find_task(
        &self,
        stealers: &[Stealer<Task>],
        injector: &Injector<Task>,
        shards: &[Arc<Injector<Task>>],
    ) -> Option<Task> {
        // 1. Check local queue first (best cache locality)
        if let Some(task) = self.local_queue.pop() {
            return Some(task);
        }

        // 2. Check this worker's own placement shard
        if let Some(shard) = shards.get(self.id) {
            if let Some(task) = Self::drain_injector(shard, &self.local_queue) {
                return Some(task);
            }
        }

        // 3. Check global injector queue
        if let Some(task) = Self::drain_injector(injector, &self.local_queue) {
            self.state.tasks_stolen.fetch_add(1, Ordering::Relaxed);
            self.metrics.record_task_stolen();
            return Some(task);
        }

        // 4. Raid other shards (placement is a hint, not a hard partition)
        for (idx, shard) in shards.iter().enumerate() {
            if idx == self.id {
                continue;
            }
            if let Some(task) = Self::drain_injector(shard, &self.local_queue) {
                self.state.tasks_stolen.fetch_add(1, Ordering::Relaxed);
                self.metrics.record_task_stolen();
                return Some(task);
            }
        }

        // 5. Steal from other workers
        self.try_steal_from_workers(stealers)
    }

    fn drain_injector(injector: &Injector<Task>, local: &WorkerQueue<Task>) -> Option<Task> {
        loop {
            match injector.steal_batch_and_pop(local) {
                crossbeam_deque::Steal::Success(task) => return Some(task),
                crossbeam_deque::Steal::Empty => return None,
                crossbeam_deque::Steal::Retry => continue,
            }
        }
    }

    fn try_steal_from_workers(&self, stealers: &[Stealer<Task>]) -> Option<Task> {
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        if stealers.is_empty() {
            return None;
        }

        let mut indices: Vec<usize> = (0..stealers.len()).collect();
        indices.shuffle(&mut thread_rng());

        for &idx in &indices {
            if idx == self.id {
                continue;
            }

            loop {
                match stealers[idx].steal_batch_and_pop(&self.local_queue) {
                    crossbeam_deque::Steal::Success(task) => {
                        self.state.tasks_stolen.fetch_add(1, Ordering::Relaxed);
                        self.metrics.record_task_stolen();
                        return Some(task);
                    }
                    crossbeam_deque::Steal::Empty => break,
                    crossbeam_deque::Steal::Retry => continue,
                }
            }
        }

        None
    }

    fn execute_task(&self, task: Task) {
        let tid = task.id;
        let start = Instant::now();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            task.execute();
        }));

        let duration_ns = start.elapsed().as_nanos() as u64;

        match result {
            Ok(_) => {
                self.metrics.record_task_execution(duration_ns);
            }
            Err(_) => {
                eprintln!("task {:?} panicked", tid);
                self.metrics.record_task_panic();
            }
        }

        self.state.tasks_executed.fetch_add(1, Ordering::Relaxed);
    }

    fn backoff(&self, count: &mut u32) -> bool {
        const MAX_SPINS: u32 = 10;
        const MAX_YIELDS: u32 = 20;

        *count += 1;

        if *count <= MAX_SPINS {
            let spins = (*count).min(6);
            for _ in 0..(1 << spins) {
                std::hint::spin_loop();
            }
        } else if *count <= MAX_YIELDS {
            thread::yield_now();
        } else {
            thread::park_timeout(Duration::from_micros(100));
        }

        false
    }
}
