//! Tiled matmul benchmark with validation.
//!
//! Usage: matmul <rows> <tasksize> [cols]

use std::time::Instant;
use tilemv::prelude::*;

fn usage() -> ! {
    eprintln!("usage: matmul <rows> <tasksize> [cols]");
    std::process::exit(1);
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
    }

    let rows: usize = args[1].parse().unwrap_or_else(|_| usage());
    let ts: usize = args[2].parse().unwrap_or_else(|_| usage());
    let cols: usize = args.get(3).map(|s| s.parse().unwrap_or_else(|_| usage())).unwrap_or(rows);

    let config = match Config::builder().dim(rows).task_size(ts).build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let pool = CpuPool::new(&config).expect("pool creation failed");

    println!("# Initializing data");
    let a = alloc_init(&pool, rows, rows, ts);
    let b = alloc_init(&pool, rows, cols, ts);
    let mut c = vec![0.0; rows * cols];

    println!("# Starting multiply");
    let timer = Instant::now();
    matmul_tasks(&pool, &a, &b, &mut c, ts, rows, cols, 1, config.fetch_policy);
    let elapsed = timer.elapsed();

    let ok = validate(&a, &b, &c, rows, cols);

    let snapshot = pool.metrics().snapshot();
    println!("cpu_count: {}", pool.num_threads());
    println!("multiply_time_ns: {}", elapsed.as_nanos());
    println!("tasks_executed: {}", snapshot.tasks_executed);
    println!("validated: {ok}");

    if !ok {
        std::process::exit(1);
    }
}
