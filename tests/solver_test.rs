use tilemv::prelude::*;

fn pool(threads: usize) -> CpuPool {
    let config = Config::builder().num_threads(threads).build().unwrap();
    CpuPool::new(&config).unwrap()
}

#[test]
fn test_zero_problem_stays_zero() {
    // dim=4, ts=2, two node-blocks: A*0 + 0 = 0.
    let pool = pool(2);
    let a = alloc_init(&pool, 4, 4, 2);
    let b = alloc_zeroed(4);
    let x_in = alloc_zeroed(4);
    let mut x_out = vec![f64::NAN; 4];

    matvec_tasks(&pool, &a, &b, &x_in, &mut x_out, 2, 4, 2, 0, FetchPolicy::FirstIteration);
    assert_eq!(x_out, vec![0.0; 4]);
}

#[test]
fn test_identity_matvec() {
    // dim=2, ts=1, A=I, b=[5,7], x_in=0 -> x_out=[5,7].
    let pool = pool(2);
    let a = vec![1.0, 0.0, 0.0, 1.0];
    let b = vec![5.0, 7.0];
    let x_in = vec![0.0, 0.0];
    let mut x_out = vec![0.0; 2];

    matvec_tasks(&pool, &a, &b, &x_in, &mut x_out, 1, 2, 1, 0, FetchPolicy::Never);
    assert_eq!(x_out, vec![5.0, 7.0]);
}

#[test]
fn test_fetch_policies_numerically_identical_across_iterations() {
    let pool = pool(4);
    let dim = 32;
    let ts = 8;

    let mut solutions = Vec::new();
    for policy in [FetchPolicy::Always, FetchPolicy::Never, FetchPolicy::FirstIteration] {
        let config = Config::builder()
            .num_threads(4)
            .dim(dim)
            .task_size(ts)
            .num_nodes(4)
            .fetch_policy(policy)
            .build()
            .unwrap();

        let mut solver = JacobiSolver::new(&pool, &config);
        solver.run(&pool, 8);
        solutions.push(solver.solution().to_vec());
    }

    assert_eq!(solutions[0], solutions[1]);
    assert_eq!(solutions[1], solutions[2]);
}

#[test]
fn test_single_node_matches_multi_node() {
    let pool = pool(4);
    let dim = 16;
    let a = alloc_init(&pool, dim, dim, 4);
    let b = alloc_init(&pool, dim, 1, 4);
    let x_in = alloc_init(&pool, dim, 1, 4);

    let mut single_node = vec![0.0; dim];
    matvec_tasks(&pool, &a, &b, &x_in, &mut single_node, 4, dim, 1, 0, FetchPolicy::Always);

    let mut multi_node = vec![0.0; dim];
    matvec_tasks(&pool, &a, &b, &x_in, &mut multi_node, 4, dim, 4, 0, FetchPolicy::Always);

    assert_eq!(single_node, multi_node);
}

#[test]
fn test_gemm_tile_round_trip() {
    // Tile-by-tile kernel calls agree with one full-matrix call.
    let pool = pool(2);
    let dim = 12;
    let ts = 3;
    let a = alloc_init(&pool, dim, dim, ts);
    let x = alloc_init(&pool, dim, 1, ts);

    let mut full = vec![0.0; dim];
    matmul_block(&a, &x, &mut full, dim, dim, 1);

    let mut tiled = vec![0.0; dim];
    for (tile, out) in tiled.chunks_mut(ts).enumerate() {
        matmul_block(&a[tile * ts * dim..], &x, out, ts, dim, 1);
    }

    for (got, want) in tiled.iter().zip(&full) {
        assert!((got - want).abs() < TOLERANCE);
    }
}

#[test]
fn test_validator_against_tiled_matmul() {
    let pool = pool(4);
    let dim = 16;
    let cols = 4;
    let a = alloc_init(&pool, dim, dim, 4);
    let b = alloc_init(&pool, dim, cols, 4);

    let mut c = vec![0.0; dim * cols];
    matmul_tasks(&pool, &a, &b, &mut c, 4, dim, cols, 4, FetchPolicy::Always);
    assert!(validate(&a, &b, &c, dim, cols));

    c[dim] += 1e-6;
    assert!(!validate(&a, &b, &c, dim, cols));
}

#[test]
fn test_jacobi_solves_system() {
    // After enough sweeps the iterate satisfies x = A*x + b, which is the
    // rewritten form of the original linear system.
    let pool = pool(4);
    let config = Config::builder()
        .num_threads(4)
        .dim(32)
        .task_size(8)
        .num_nodes(2)
        .build()
        .unwrap();

    let mut solver = JacobiSolver::new(&pool, &config);
    solver.run(&pool, 400);

    let dim = solver.dim();
    let x = solver.solution();
    let mut residual: f64 = 0.0;
    for i in 0..dim {
        let mut acc = solver.rhs()[i];
        for j in 0..dim {
            acc += solver.matrix()[i * dim + j] * x[j];
        }
        residual = residual.max((acc - x[i]).abs());
    }
    assert!(residual < 1e-8, "residual {residual}");
}
