use crate::error::{Error, Result};

/// Controls whether a node-block issues its latency-hiding prefetch unit
/// before the tile units run.
///
/// All three policies produce bit-identical results; the knob only changes
/// when the full node-block footprint is touched as one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Issue the prefetch unit on every invocation.
    Always,
    /// Rely on per-tile dependency resolution alone.
    Never,
    /// Prefetch only while `it < 1`, amortizing one-time data movement
    /// across the first outer iteration.
    FirstIteration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy::FirstIteration
    }
}

impl FetchPolicy {
    pub fn should_fetch(&self, it: usize) -> bool {
        match self {
            FetchPolicy::Always => true,
            FetchPolicy::Never => false,
            FetchPolicy::FirstIteration => it < 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: Option<usize>,
    pub pin_workers: bool,
    pub stack_size: Option<usize>,
    pub thread_name_prefix: String,

    /// Problem dimension: A is `dim x dim`, vectors are length `dim`.
    pub dim: usize,
    /// Rows per fine-grained tile unit.
    pub task_size: usize,
    /// Number of placement shards ("nodes") the row space is split into.
    pub num_nodes: usize,
    /// Fixed outer iteration count for the Jacobi driver.
    pub iterations: usize,
    pub fetch_policy: FetchPolicy,
    pub print_result: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: None,
            pin_workers: false,
            stack_size: Some(2 * 1024 * 1024),
            thread_name_prefix: "tilemv-worker".to_string(),
            dim: 256,
            task_size: 32,
            num_nodes: 1,
            iterations: 1,
            fetch_policy: FetchPolicy::default(),
            print_result: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("num_threads too large (max 1024)"));
            }
        }

        if self.dim == 0 {
            return Err(Error::config("dim must be > 0"));
        }
        if self.task_size == 0 {
            return Err(Error::config("task_size must be > 0"));
        }
        if self.num_nodes == 0 {
            return Err(Error::config("num_nodes must be > 0"));
        }
        if self.dim % self.num_nodes != 0 {
            return Err(Error::config("dim must be divisible by num_nodes"));
        }

        let rows_per_node = self.dim / self.num_nodes;
        if self.task_size > rows_per_node {
            return Err(Error::config("task_size exceeds rows per node"));
        }
        if rows_per_node % self.task_size != 0 {
            return Err(Error::config(
                "rows per node must be divisible by task_size",
            ));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }

    pub fn rows_per_node(&self) -> usize {
        self.dim / self.num_nodes
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    pub fn pin_workers(mut self, pin: bool) -> Self {
        self.config.pin_workers = pin;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn dim(mut self, dim: usize) -> Self {
        self.config.dim = dim;
        self
    }

    pub fn task_size(mut self, ts: usize) -> Self {
        self.config.task_size = ts;
        self
    }

    pub fn num_nodes(mut self, nodes: usize) -> Self {
        self.config.num_nodes = nodes;
        self
    }

    pub fn iterations(mut self, its: usize) -> Self {
        self.config.iterations = its;
        self
    }

    pub fn fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.config.fetch_policy = policy;
        self
    }

    pub fn print_result(mut self, print: bool) -> Self {
        self.config.print_result = print;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
