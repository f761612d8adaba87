//! Independent recomputation check for tiled results.

use crate::solver::gemm::matmul_block;

/// Absolute tolerance for element-wise comparison.
pub const TOLERANCE: f64 = 1e-12;

/// Recomputes `A*B` with the block kernel on the full matrix and compares
/// against `c` element-wise.
///
/// Short-circuits on the first mismatch. The caller must have joined every
/// producer of `c` first; graph execution is the barrier that guarantees it.
pub fn validate(a: &[f64], b: &[f64], c: &[f64], dim: usize, cols_bc: usize) -> bool {
    assert_eq!(a.len(), dim * dim);
    assert_eq!(b.len(), dim * cols_bc);
    assert_eq!(c.len(), dim * cols_bc);

    let mut expected = vec![0.0; dim * cols_bc];
    matmul_block(a, b, &mut expected, dim, dim, cols_bc);

    for i in 0..dim {
        for j in 0..cols_bc {
            let idx = i * cols_bc + j;
            if (c[idx] - expected[idx]).abs() > TOLERANCE {
                return false;
            }
        }
    }
    true
}
