//! pfor: exercise the parallel-for dispatcher on vector and matrix workloads,
//! verify the results, and report the time spent in each dispatch.
use anyhow::bail;
use clap::{Parser, Subcommand};
use log::{debug, info};
use parfor::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Parser, Debug)]
#[clap(name = "pfor")]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Number of threads, the calling one included (normalized to 1..=64)
    #[clap(short, long, default_value_t = 4, global = true)]
    threads: usize,

    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add two vectors, element by element
    Vector {
        /// Number of elements
        #[clap(short, long, default_value_t = 1_000_000)]
        size: usize,
    },

    /// Multiply two square matrices
    Matrix {
        /// Number of rows (and columns)
        #[clap(short, long, default_value_t = 256)]
        size: usize,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let options = Cli::parse();
    env_logger::Builder::new()
        .filter_level(options.verbose.log_level_filter())
        .init();
    debug!("{:#?}", options);

    if options.threads != clamp_threads(options.threads) {
        info!(
            "Using {} threads, rather than the requested {}",
            clamp_threads(options.threads),
            options.threads
        );
    }

    let mut stdout = std::io::stdout();
    let (outcome, report) = parfor::harness::run(options.threads, &mut stdout, |harness| {
        match options.command {
            Command::Vector { size } => vector(harness, size),
            Command::Matrix { size } => matrix(harness, size),
        }
    });
    outcome?;
    report?;
    Ok(())
}

// c = a + b, each chunk writing only its own part of c
fn vector(harness: &mut Harness, size: usize) -> Result<(), anyhow::Error> {
    let a: Vec<i64> = (0..size).map(|i| i as i64).collect();
    let b: Vec<i64> = (0..size).map(|i| 2 * i as i64).collect();
    let mut c = vec![0_i64; size];

    harness.parallel_for_each_mut(&mut c, |i, sum| *sum = a[i] + b[i])?;

    if let Some(i) = (0..size).find(|&i| c[i] != 3 * i as i64) {
        bail!("Vector sum is wrong at index {i}: got {}, expected {}", c[i], 3 * i as i64);
    }
    println!("Vector sum of {size} elements verified");
    Ok(())
}

// c = a * b, parallel over the rows of c. Each (i, j) pair owns its own
// cell of c, so the atomics are just the arena, never contended
fn matrix(harness: &mut Harness, size: usize) -> Result<(), anyhow::Error> {
    let n = size;
    let a: Vec<i64> = (0..n * n).map(|k| (k % 7) as i64).collect();
    let b: Vec<i64> = (0..n * n).map(|k| (k % 5) as i64 - 2).collect();
    let c: Vec<AtomicI64> = (0..n * n).map(|_| AtomicI64::new(0)).collect();
    let dot = |i: usize, j: usize| -> i64 { (0..n).map(|k| a[i * n + k] * b[k * n + j]).sum() };

    let high = i64::try_from(n)?;
    harness.parallel_for_2d(
        0,
        high,
        0,
        high,
        |i, j| {
            let (i, j) = (i as usize, j as usize);
            c[i * n + j].store(dot(i, j), Ordering::Relaxed);
        },
    )?;

    for i in 0..n {
        for j in 0..n {
            let got = c[i * n + j].load(Ordering::Relaxed);
            let expected = dot(i, j);
            if got != expected {
                bail!("Matrix product is wrong at ({i}, {j}): got {got}, expected {expected}");
            }
        }
    }
    println!("Matrix product of size {n}x{n} verified");
    Ok(())
}
