//! Dense block multiply-accumulate, the single numerical hot loop.

/// Computes `C = A_slice * B` for a row slice of A.
///
/// `a` holds `lrows_a` rows of stride `dim` (row-major), `b` is `dim x
/// cols_bc`, `c` is `lrows_a x cols_bc`. Each output row is zeroed before
/// accumulation, so `c` needs no pre-initialization. The reduction index
/// sits in the middle loop with the A element hoisted, keeping the inner
/// loop a stride-1 walk over B and C.
pub fn matmul_block(
    a: &[f64],
    b: &[f64],
    c: &mut [f64],
    lrows_a: usize,
    dim: usize,
    cols_bc: usize,
) {
    debug_assert!(a.len() >= lrows_a * dim);
    debug_assert!(b.len() >= dim * cols_bc);
    debug_assert!(c.len() >= lrows_a * cols_bc);

    for i in 0..lrows_a {
        for k in 0..cols_bc {
            c[i * cols_bc + k] = 0.0;
        }

        for j in 0..dim {
            let temp = a[i * dim + j];

            for k in 0..cols_bc {
                c[i * cols_bc + k] += temp * b[j * cols_bc + k];
            }
        }
    }
}
