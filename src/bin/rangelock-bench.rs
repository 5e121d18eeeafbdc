// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

//! Compare a single coarse-grained mutex against the range lock.
//!
//! Every worker repeatedly picks a random position in a shared buffer,
//! writes its id to two adjacent elements, sleeps briefly and verifies
//! that the pair was not modified by somebody else.

use clap::Parser;
use parking_lot::Mutex;
use rand::Rng;
use range_lock_manager::VecRangeLock;
use std::{
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "rangelock-bench")]
#[command(version, about = "Coarse mutex vs. range lock benchmark", long_about = None)]
struct Cli {
    /// Number of worker threads
    #[arg(short, long, default_value_t = 8)]
    threads: usize,

    /// Lock/unlock iterations per worker
    #[arg(short, long, default_value_t = 10_000)]
    iterations: usize,

    /// Number of elements in the shared buffer
    #[arg(short, long, default_value_t = 256, value_parser = clap::value_parser!(u64).range(2..))]
    len: u64,
}

/// Time spent inside every critical section.
const HOLD_TIME: Duration = Duration::from_micros(1);

fn bench_mutex(threads: usize, iterations: usize, len: usize) -> Duration {
    let data = Mutex::new(vec![0_u64; len]);
    let begin = Instant::now();
    thread::scope(|s| {
        for wid in 0..threads as u64 {
            let data = &data;
            s.spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..iterations {
                    let pos = rng.gen_range(0..len - 1);
                    let mut data = data.lock();
                    data[pos] = wid;
                    data[pos + 1] = wid;
                    thread::sleep(HOLD_TIME);
                    assert_eq!(data[pos], data[pos + 1]);
                }
                debug!(wid, "mutex worker done");
            });
        }
    });
    begin.elapsed()
}

fn bench_rangelock(threads: usize, iterations: usize, len: usize) -> anyhow::Result<Duration> {
    let data = VecRangeLock::new(vec![0_u64; len]);
    let begin = Instant::now();
    thread::scope(|s| -> anyhow::Result<()> {
        let workers: Vec<_> = (0..threads as u64)
            .map(|wid| {
                let data = &data;
                s.spawn(move || -> anyhow::Result<()> {
                    let mut rng = rand::thread_rng();
                    for _ in 0..iterations {
                        let pos = rng.gen_range(0..len - 1);
                        let mut pair = data.lock(pos..pos + 2)?;
                        pair[0] = wid;
                        pair[1] = wid;
                        thread::sleep(HOLD_TIME);
                        assert_eq!(pair[0], pair[1]);
                    }
                    debug!(wid, "range lock worker done");
                    Ok(())
                })
            })
            .collect();
        for worker in workers {
            worker
                .join()
                .map_err(|_| anyhow::anyhow!("Range lock worker panicked"))??;
        }
        Ok(())
    })?;
    Ok(begin.elapsed())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rangelock_bench=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let len = usize::try_from(cli.len)?;
    info!(
        threads = cli.threads,
        iterations = cli.iterations,
        len,
        "starting benchmark"
    );

    let elapsed = bench_mutex(cli.threads, cli.iterations, len);
    println!("mutex:      {:.6}", elapsed.as_secs_f64());

    let elapsed = bench_rangelock(cli.threads, cli.iterations, len)?;
    println!("range lock: {:.6}", elapsed.as_secs_f64());

    Ok(())
}

// vim: ts=4 sw=4 expandtab
