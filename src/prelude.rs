pub use crate::config::{Config, ConfigBuilder, FetchPolicy};
pub use crate::error::{Error, Result};
pub use crate::executor::CpuPool;
pub use crate::graph::{BufferId, Footprint, Placement, Region, TaskGraph, UnitId};
pub use crate::solver::{
    alloc_init, alloc_zeroed, jacobi_modify, matmul_block, matmul_tasks, matvec_tasks, validate,
    JacobiSolver, TOLERANCE,
};
pub use crate::telemetry::{Metrics, MetricsSnapshot};
pub use crate::{init, init_with_config, shutdown};
