//! Fixed-iteration Jacobi benchmark.
//!
//! Usage: jacobi <rows> <tasksize> [iterations] [print]

use std::time::Instant;
use tilemv::prelude::*;

fn usage() -> ! {
    eprintln!("usage: jacobi <rows> <tasksize> [iterations] [print]");
    std::process::exit(1);
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
    }

    let rows: usize = args[1].parse().unwrap_or_else(|_| usage());
    let ts: usize = args[2].parse().unwrap_or_else(|_| usage());
    let iterations: usize = args.get(3).map(|s| s.parse().unwrap_or_else(|_| usage())).unwrap_or(1);
    let print: bool = args.get(4).map(|s| s == "1" || s == "true").unwrap_or(false);

    // largest worker count that evenly divides the tile blocks
    let num_blocks = (rows / ts).max(1);
    let mut num_nodes = num_cpus::get().min(num_blocks);
    while num_blocks % num_nodes != 0 {
        num_nodes -= 1;
    }

    let config = match Config::builder()
        .dim(rows)
        .task_size(ts)
        .num_nodes(num_nodes)
        .iterations(iterations)
        .print_result(print)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    println!("# Initializing data");
    let total_timer = Instant::now();

    tilemv::init_with_config(config.clone()).expect("runtime init failed");
    let rt = tilemv::runtime::handle().expect("runtime vanished");
    let pool = rt.pool();

    let mut solver = JacobiSolver::new(pool, &config);

    println!("# Starting algorithm");
    let algo_timer = Instant::now();
    solver.run(pool, config.iterations);
    let algo_elapsed = algo_timer.elapsed();

    println!("# Finished algorithm...");
    let total_elapsed = total_timer.elapsed();

    if config.print_result {
        let x = solver.solution();
        for (i, v) in x.iter().enumerate() {
            println!("x[{i}] = {v:.12}");
        }
    }

    let snapshot = pool.metrics().snapshot();
    let dim = config.dim as f64;
    let its = config.iterations as f64;
    let performance = 2.0 * its * dim * dim * 2000.0 / algo_elapsed.as_nanos() as f64;

    println!("worldsize: {}", config.num_nodes);
    println!("cpu_count: {}", pool.num_threads());
    println!("algorithm_time_ns: {}", algo_elapsed.as_nanos());
    println!("total_time_ns: {}", total_elapsed.as_nanos());
    println!("performance: {performance}");
    println!("tasks_executed: {}", snapshot.tasks_executed);
    println!("tasks_stolen: {}", snapshot.tasks_stolen);

    tilemv::shutdown();
}
