//! TILEMV - Tiled matrix kernels on a footprint-driven task runtime
//!
//! A work-stealing worker pool plus a declarative task-graph layer: units
//! carry read/write region footprints and a placement hint, overlaps become
//! ordering edges, and graph execution doubles as the barrier. On top of
//! that sit the tiled numerical kernels: a double-buffered Jacobi solver, a
//! tiled matmul utility, and an independent validator.
//!
//! # Quick Start
//!
//! ```no_run
//! use tilemv::prelude::*;
//!
//! let config = Config::builder()
//!     .dim(256)
//!     .task_size(32)
//!     .num_nodes(4)
//!     .build()
//!     .unwrap();
//!
//! let pool = CpuPool::new(&config).unwrap();
//! let mut solver = JacobiSolver::new(&pool, &config);
//! solver.run(&pool, 100);
//!
//! println!("x[0] = {}", solver.solution()[0]);
//! ```
//!
//! # Features
//!
//! - **Footprint dependencies**: units declare what they touch, not whom
//!   they follow; write/read overlap resolution orders them
//! - **Two-level units**: a coarse node-block unit is placed as one work
//!   item and joins its inner tile units before completing
//! - **Fetch policies**: an optional no-op prefetch unit hides first-touch
//!   latency without changing any numbers
//! - **Deterministic data**: per-block seeded initialization, reproducible
//!   across runs and schedules

pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
pub mod prelude;
pub mod runtime;
pub mod solver;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder, FetchPolicy};
pub use error::{Error, Result};
pub use graph::{BufferId, Footprint, Placement, Region, TaskGraph};
pub use runtime::{init, init_with_config, shutdown};
