//! Two-level tiled `x_out = A*x_in + b` scheduling.
//!
//! The row space is split into node-blocks, one coarse unit each, placed on
//! its owning shard. A coarse unit joins an inner graph of `ts`-row tile
//! units before completing, so the coarse level stays a single relocatable
//! work item while the tiles expose the actual parallelism. An optional
//! no-op prefetch unit with the full node-block footprint forces every tile
//! behind one up-front touch of the data.

use crate::config::FetchPolicy;
use crate::executor::CpuPool;
use crate::graph::{BufferId, Footprint, Placement, Region, TaskGraph};
use crate::solver::gemm::matmul_block;

const MAT_A: BufferId = BufferId(0);
const VEC_B: BufferId = BufferId(1);
const X_IN: BufferId = BufferId(2);
const X_OUT: BufferId = BufferId(3);

fn check_partition(dim: usize, ts: usize, num_nodes: usize) -> usize {
    assert!(dim > 0 && ts > 0 && num_nodes > 0);
    assert!(ts <= dim, "tile size ({ts}) exceeds dim ({dim})");
    assert!(dim % num_nodes == 0, "dim ({dim}) not divisible by num_nodes ({num_nodes})");

    let rows_per_node = dim / num_nodes;
    assert!(ts <= rows_per_node, "tile size ({ts}) exceeds rows per node ({rows_per_node})");
    assert!(
        rows_per_node % ts == 0,
        "rows per node ({rows_per_node}) not divisible by tile size ({ts})"
    );
    rows_per_node
}

fn node_block_footprint(row0: usize, rows: usize, dim: usize) -> Footprint {
    Footprint::new()
        .read(Region::new(MAT_A, row0 * dim, rows * dim))
        .read(Region::new(X_IN, 0, dim))
        .read(Region::new(VEC_B, row0, rows))
        .write(Region::new(X_OUT, row0, rows))
}

/// Schedules one full `x_out = A*x_in + b` sweep and blocks until it is
/// complete.
///
/// `it` is the outer iteration index, consumed only by the fetch policy.
/// A, b and x_in are untouched; x_out is written in full.
#[allow(clippy::too_many_arguments)]
pub fn matvec_tasks(
    pool: &CpuPool,
    a: &[f64],
    b: &[f64],
    x_in: &[f64],
    x_out: &mut [f64],
    ts: usize,
    dim: usize,
    num_nodes: usize,
    it: usize,
    policy: FetchPolicy,
) {
    let rows_per_node = check_partition(dim, ts, num_nodes);
    assert_eq!(a.len(), dim * dim);
    assert_eq!(b.len(), dim);
    assert_eq!(x_in.len(), dim);
    assert_eq!(x_out.len(), dim);

    let mut graph = TaskGraph::new();

    for (node, x_chunk) in x_out.chunks_mut(rows_per_node).enumerate() {
        let row0 = node * rows_per_node;
        let a_block = &a[row0 * dim..(row0 + rows_per_node) * dim];
        let b_block = &b[row0..row0 + rows_per_node];

        graph.add_unit(
            node_block_footprint(row0, rows_per_node, dim),
            Placement::node(node),
            move || {
                node_block_body(pool, a_block, b_block, x_in, x_chunk, row0, ts, dim, it, policy);
            },
        );
    }

    graph.execute(pool);
}

#[allow(clippy::too_many_arguments)]
fn node_block_body(
    pool: &CpuPool,
    a_block: &[f64],
    b_block: &[f64],
    x_in: &[f64],
    x_chunk: &mut [f64],
    row0: usize,
    ts: usize,
    dim: usize,
    it: usize,
    policy: FetchPolicy,
) {
    let rows = x_chunk.len();
    let mut inner = TaskGraph::new();

    if policy.should_fetch(it) {
        // Same footprint as the whole node-block, empty body: every tile
        // conflicts with it and is ordered behind the single up-front fetch.
        inner.add_unit(
            node_block_footprint(row0, rows, dim),
            Placement::any(),
            || {},
        );
    }

    for (tile, tile_out) in x_chunk.chunks_mut(ts).enumerate() {
        let j0 = row0 + tile * ts;
        let a_tile = &a_block[tile * ts * dim..(tile + 1) * ts * dim];
        let b_tile = &b_block[tile * ts..(tile + 1) * ts];

        let footprint = Footprint::new()
            .read(Region::new(MAT_A, j0 * dim, ts * dim))
            .read(Region::new(X_IN, 0, dim))
            .read(Region::new(VEC_B, j0, ts))
            .write(Region::new(X_OUT, j0, ts));

        inner.add_unit(footprint, Placement::any(), move || {
            matmul_block(a_tile, x_in, tile_out, ts, dim, 1);
            for (out, bv) in tile_out.iter_mut().zip(b_tile) {
                *out += *bv;
            }
        });
    }

    inner.execute(pool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::solver::init::alloc_init;

    fn pool(threads: usize) -> CpuPool {
        let config = Config::builder().num_threads(threads).build().unwrap();
        CpuPool::new(&config).unwrap()
    }

    fn reference_matvec(a: &[f64], b: &[f64], x: &[f64], dim: usize) -> Vec<f64> {
        let mut out = vec![0.0; dim];
        for i in 0..dim {
            let mut acc = 0.0;
            for j in 0..dim {
                acc += a[i * dim + j] * x[j];
            }
            out[i] = b[i] + acc;
        }
        out
    }

    #[test]
    fn test_identity_recovers_rhs() {
        let pool = pool(2);
        let dim = 2;
        let a = vec![1.0, 0.0, 0.0, 1.0];
        let b = vec![5.0, 7.0];
        let x_in = vec![0.0, 0.0];
        let mut x_out = vec![0.0; dim];

        matvec_tasks(&pool, &a, &b, &x_in, &mut x_out, 1, dim, 1, 0, FetchPolicy::Never);
        assert_eq!(x_out, vec![5.0, 7.0]);
    }

    #[test]
    fn test_zero_input_zero_rhs_gives_zero() {
        let pool = pool(2);
        let dim = 4;
        let a = alloc_init(&pool, dim, dim, 2);
        let b = vec![0.0; dim];
        let x_in = vec![0.0; dim];
        let mut x_out = vec![f64::NAN; dim];

        matvec_tasks(&pool, &a, &b, &x_in, &mut x_out, 2, dim, 2, 0, FetchPolicy::Always);
        assert_eq!(x_out, vec![0.0; dim]);
    }

    #[test]
    fn test_matches_reference() {
        let pool = pool(4);
        let dim = 16;
        let a = alloc_init(&pool, dim, dim, 4);
        let b = alloc_init(&pool, dim, 1, 4);
        let x_in = alloc_init(&pool, dim, 1, 4);
        let mut x_out = vec![0.0; dim];

        matvec_tasks(&pool, &a, &b, &x_in, &mut x_out, 4, dim, 2, 0, FetchPolicy::FirstIteration);

        let expected = reference_matvec(&a, &b, &x_in, dim);
        for (got, want) in x_out.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fetch_policies_agree() {
        let pool = pool(4);
        let dim = 8;
        let a = alloc_init(&pool, dim, dim, 2);
        let b = alloc_init(&pool, dim, 1, 2);
        let x_in = alloc_init(&pool, dim, 1, 2);

        let mut runs = Vec::new();
        for policy in [FetchPolicy::Always, FetchPolicy::Never, FetchPolicy::FirstIteration] {
            let mut x_out = vec![0.0; dim];
            matvec_tasks(&pool, &a, &b, &x_in, &mut x_out, 2, dim, 2, 0, policy);
            runs.push(x_out);
        }

        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[1], runs[2]);
    }

    #[test]
    fn test_boundary_shapes_agree() {
        // dim == ts == rows_per_node (single tile, single node) and the
        // multi-tile multi-node split of the same problem must match exactly.
        let pool = pool(2);
        let dim = 8;
        let a = alloc_init(&pool, dim, dim, 8);
        let b = alloc_init(&pool, dim, 1, 8);
        let x_in = alloc_init(&pool, dim, 1, 8);

        let mut single = vec![0.0; dim];
        matvec_tasks(&pool, &a, &b, &x_in, &mut single, dim, dim, 1, 0, FetchPolicy::Never);

        let mut tiled = vec![0.0; dim];
        matvec_tasks(&pool, &a, &b, &x_in, &mut tiled, 2, dim, 4, 0, FetchPolicy::Always);

        assert_eq!(single, tiled);
    }

    #[test]
    fn test_bit_reproducible_across_runs() {
        let pool = pool(4);
        let dim = 16;
        let a = alloc_init(&pool, dim, dim, 4);
        let b = alloc_init(&pool, dim, 1, 4);
        let x_in = alloc_init(&pool, dim, 1, 4);

        let mut first = vec![0.0; dim];
        matvec_tasks(&pool, &a, &b, &x_in, &mut first, 4, dim, 4, 0, FetchPolicy::Always);

        for _ in 0..10 {
            let mut again = vec![0.0; dim];
            matvec_tasks(&pool, &a, &b, &x_in, &mut again, 4, dim, 4, 0, FetchPolicy::Always);
            assert_eq!(first, again);
        }
    }

    #[test]
    #[should_panic]
    fn test_bad_tile_size_is_fatal() {
        let pool = pool(1);
        let dim = 4;
        let a = vec![0.0; dim * dim];
        let b = vec![0.0; dim];
        let x_in = vec![0.0; dim];
        let mut x_out = vec![0.0; dim];

        matvec_tasks(&pool, &a, &b, &x_in, &mut x_out, 3, dim, 1, 0, FetchPolicy::Never);
    }
}
