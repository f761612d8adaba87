//! Tiled `C = A*B` using the same two-level unit scheme as the matvec.

use crate::config::FetchPolicy;
use crate::executor::CpuPool;
use crate::graph::{BufferId, Footprint, Placement, Region, TaskGraph};
use crate::solver::gemm::matmul_block;

const MAT_A: BufferId = BufferId(0);
const MAT_B: BufferId = BufferId(1);
const MAT_C: BufferId = BufferId(2);

/// Schedules a full `C = A*B` and blocks until complete.
///
/// `a` is `dim x dim`, `b` is `dim x cols_bc`, `c` is `dim x cols_bc`.
/// One-shot operation, so the fetch policy sees iteration index 0.
#[allow(clippy::too_many_arguments)]
pub fn matmul_tasks(
    pool: &CpuPool,
    a: &[f64],
    b: &[f64],
    c: &mut [f64],
    ts: usize,
    dim: usize,
    cols_bc: usize,
    num_nodes: usize,
    policy: FetchPolicy,
) {
    assert!(dim > 0 && ts > 0 && num_nodes > 0 && cols_bc > 0);
    assert!(dim % num_nodes == 0, "dim not divisible by num_nodes");
    let rows_per_node = dim / num_nodes;
    assert!(ts <= rows_per_node && rows_per_node % ts == 0, "tile size must divide rows per node");
    assert_eq!(a.len(), dim * dim);
    assert_eq!(b.len(), dim * cols_bc);
    assert_eq!(c.len(), dim * cols_bc);

    let mut graph = TaskGraph::new();

    for (node, c_block) in c.chunks_mut(rows_per_node * cols_bc).enumerate() {
        let row0 = node * rows_per_node;
        let a_block = &a[row0 * dim..(row0 + rows_per_node) * dim];

        let footprint = Footprint::new()
            .read(Region::new(MAT_A, row0 * dim, rows_per_node * dim))
            .read(Region::new(MAT_B, 0, dim * cols_bc))
            .write(Region::new(MAT_C, row0 * cols_bc, rows_per_node * cols_bc));

        graph.add_unit(footprint, Placement::node(node), move || {
            node_block_body(pool, a_block, b, c_block, row0, ts, dim, cols_bc, policy);
        });
    }

    graph.execute(pool);
}

#[allow(clippy::too_many_arguments)]
fn node_block_body(
    pool: &CpuPool,
    a_block: &[f64],
    b: &[f64],
    c_block: &mut [f64],
    row0: usize,
    ts: usize,
    dim: usize,
    cols_bc: usize,
    policy: FetchPolicy,
) {
    let rows = c_block.len() / cols_bc;
    let mut inner = TaskGraph::new();

    if policy.should_fetch(0) {
        let footprint = Footprint::new()
            .read(Region::new(MAT_A, row0 * dim, rows * dim))
            .read(Region::new(MAT_B, 0, dim * cols_bc))
            .write(Region::new(MAT_C, row0 * cols_bc, rows * cols_bc));
        inner.add_unit(footprint, Placement::any(), || {});
    }

    for (tile, c_tile) in c_block.chunks_mut(ts * cols_bc).enumerate() {
        let j0 = row0 + tile * ts;
        let a_tile = &a_block[tile * ts * dim..(tile + 1) * ts * dim];

        let footprint = Footprint::new()
            .read(Region::new(MAT_A, j0 * dim, ts * dim))
            .read(Region::new(MAT_B, 0, dim * cols_bc))
            .write(Region::new(MAT_C, j0 * cols_bc, ts * cols_bc));

        inner.add_unit(footprint, Placement::any(), move || {
            matmul_block(a_tile, b, c_tile, ts, dim, cols_bc);
        });
    }

    inner.execute(pool);
}
