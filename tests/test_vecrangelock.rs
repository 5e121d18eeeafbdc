// -*- coding: utf-8 -*-
//
// Copyright 2021-2025 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//

use range_lock_manager::VecRangeLock;
use rand::Rng;
use std::thread;

#[test]
fn test_sliding_windows() {
    // Overlapping 4-wide windows. Lost updates show missing exclusion.
    const THREADS: usize = 4;
    const ITERATIONS: usize = 1_000;
    const LEN: usize = 12;
    const WIDTH: usize = 4;

    let lock = VecRangeLock::new(vec![0_u64; LEN]);
    thread::scope(|s| {
        for t in 0..THREADS {
            let lock = &lock;
            s.spawn(move || {
                for i in 0..ITERATIONS {
                    let start = (i + t) % (LEN - WIDTH + 1);
                    let mut window = lock.lock(start..start + WIDTH).expect("Failed to lock window");
                    let before = window.to_vec();
                    thread::yield_now();
                    for (x, b) in window.iter_mut().zip(before) {
                        *x = b + 1;
                    }
                }
            });
        }
    });

    let data = lock.into_inner();
    assert_eq!(data.iter().sum::<u64>(), (THREADS * ITERATIONS * WIDTH) as u64);
}

#[test]
fn test_adjacent_pairs() {
    // Every worker writes its id to two adjacent elements
    // and checks that nobody interfered.
    const THREADS: u64 = 8;
    const ITERATIONS: usize = 2_000;
    const LEN: usize = 256;

    let lock = VecRangeLock::new(vec![0_u64; LEN]);
    thread::scope(|s| {
        for wid in 0..THREADS {
            let lock = &lock;
            s.spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..ITERATIONS {
                    let pos = rng.gen_range(0..LEN - 1);
                    let mut guard = lock.lock(pos..pos + 2).expect("Failed to lock pair");
                    guard[0] = wid;
                    guard[1] = wid;
                    thread::yield_now();
                    assert_eq!(guard[0], guard[1]);
                    assert_eq!(guard[0], wid);
                }
            });
        }
    });

    let data = lock.into_inner();
    assert_eq!(data.len(), LEN);
    assert!(data.iter().all(|x| *x < THREADS));
}

// vim: ts=4 sw=4 expandtab
