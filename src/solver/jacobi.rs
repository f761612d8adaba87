//! Double-buffered fixed-iteration Jacobi driver.

use crate::config::{Config, FetchPolicy};
use crate::executor::CpuPool;
use crate::solver::init::{alloc_init, alloc_zeroed, jacobi_modify};
use crate::solver::matvec::matvec_tasks;

/// Which solution buffer is current (holds the latest iterate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CurrentBuffer {
    X1,
    X2,
}

/// Owns the problem data and the two solution buffers.
///
/// Each step computes `next = A*current + b` through the tiled scheduler and
/// flips the buffer roles. The two buffers are never both writable, so the
/// swap is just the tag flip. No convergence check; the iteration count is
/// fixed up front.
pub struct JacobiSolver {
    a: Vec<f64>,
    b: Vec<f64>,
    x1: Vec<f64>,
    x2: Vec<f64>,
    dim: usize,
    ts: usize,
    num_nodes: usize,
    policy: FetchPolicy,
    current: CurrentBuffer,
}

impl JacobiSolver {
    /// Allocates and initializes A and b (seeded random content rewritten
    /// into iteration form), zero-fills both solution buffers, x1 current.
    pub fn new(pool: &CpuPool, config: &Config) -> Self {
        let dim = config.dim;
        let ts = config.task_size;

        let mut a = alloc_init(pool, dim, dim, ts);
        let mut b = alloc_init(pool, dim, 1, ts);
        jacobi_modify(pool, &mut a, &mut b, dim, ts);

        Self {
            a,
            b,
            x1: alloc_zeroed(dim),
            x2: alloc_zeroed(dim),
            dim,
            ts,
            num_nodes: config.num_nodes,
            policy: config.fetch_policy,
            current: CurrentBuffer::X1,
        }
    }

    /// One sweep: read current, write next, flip.
    pub fn step(&mut self, pool: &CpuPool, it: usize) {
        match self.current {
            CurrentBuffer::X1 => {
                matvec_tasks(
                    pool, &self.a, &self.b, &self.x1, &mut self.x2, self.ts, self.dim,
                    self.num_nodes, it, self.policy,
                );
                self.current = CurrentBuffer::X2;
            }
            CurrentBuffer::X2 => {
                matvec_tasks(
                    pool, &self.a, &self.b, &self.x2, &mut self.x1, self.ts, self.dim,
                    self.num_nodes, it, self.policy,
                );
                self.current = CurrentBuffer::X1;
            }
        }
    }

    /// Runs the fixed iteration count, then drains the pool before the
    /// final buffer may be read externally.
    pub fn run(&mut self, pool: &CpuPool, iterations: usize) {
        for it in 0..iterations {
            self.step(pool, it);
        }
        pool.barrier();
    }

    /// The latest iterate. Only meaningful after `run` (or between steps).
    pub fn solution(&self) -> &[f64] {
        match self.current {
            CurrentBuffer::X1 => &self.x1,
            CurrentBuffer::X2 => &self.x2,
        }
    }

    pub fn matrix(&self) -> &[f64] {
        &self.a
    }

    pub fn rhs(&self) -> &[f64] {
        &self.b
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FetchPolicy};

    fn pool(threads: usize) -> CpuPool {
        let config = Config::builder().num_threads(threads).build().unwrap();
        CpuPool::new(&config).unwrap()
    }

    fn solver_config(dim: usize, ts: usize, nodes: usize, policy: FetchPolicy) -> Config {
        Config::builder()
            .num_threads(2)
            .dim(dim)
            .task_size(ts)
            .num_nodes(nodes)
            .fetch_policy(policy)
            .build()
            .unwrap()
    }

    #[test]
    fn test_buffers_alternate() {
        let pool = pool(2);
        let config = solver_config(8, 2, 2, FetchPolicy::Never);
        let mut solver = JacobiSolver::new(&pool, &config);

        assert_eq!(solver.current, CurrentBuffer::X1);
        solver.step(&pool, 0);
        assert_eq!(solver.current, CurrentBuffer::X2);
        solver.step(&pool, 1);
        assert_eq!(solver.current, CurrentBuffer::X1);
    }

    #[test]
    fn test_first_step_equals_rhs() {
        // x0 = 0 so x1 = A*0 + b = b.
        let pool = pool(2);
        let config = solver_config(8, 2, 1, FetchPolicy::Always);
        let mut solver = JacobiSolver::new(&pool, &config);

        solver.step(&pool, 0);
        assert_eq!(solver.solution(), solver.rhs());
    }

    #[test]
    fn test_iterates_converge_to_fixed_point() {
        let pool = pool(4);
        let config = solver_config(16, 4, 2, FetchPolicy::FirstIteration);
        let mut solver = JacobiSolver::new(&pool, &config);

        solver.run(&pool, 200);

        // At the fixed point, x = A*x + b.
        let dim = solver.dim();
        let x = solver.solution();
        for i in 0..dim {
            let mut acc = solver.rhs()[i];
            for j in 0..dim {
                acc += solver.matrix()[i * dim + j] * x[j];
            }
            assert!((acc - x[i]).abs() < 1e-9, "row {i}: {acc} vs {}", x[i]);
        }
    }

    #[test]
    fn test_run_is_deterministic() {
        let pool = pool(4);
        let config = solver_config(16, 4, 4, FetchPolicy::Always);

        let mut first = JacobiSolver::new(&pool, &config);
        first.run(&pool, 10);

        let mut second = JacobiSolver::new(&pool, &config);
        second.run(&pool, 10);

        assert_eq!(first.solution(), second.solution());
    }
}
