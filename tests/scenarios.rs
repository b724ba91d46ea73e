use parfor::prelude::*;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::ThreadId;
use std::time::Duration;

// ----- H E L P E R S --------------------------------------------------------------

fn counters(n: usize) -> Vec<AtomicUsize> {
    (0..n).map(|_| AtomicUsize::new(0)).collect()
}

fn all_once(counters: &[AtomicUsize]) -> bool {
    counters.iter().all(|c| c.load(Ordering::Relaxed) == 1)
}

// Number of distinct threads that invoked the callback
fn threads_used(low: i64, high: i64, threads: usize) -> Result<usize, Error> {
    let seen: Mutex<Vec<ThreadId>> = Mutex::new(Vec::new());
    parallel_for(
        low,
        high,
        |_| {
            let id = std::thread::current().id();
            let mut seen = seen.lock().unwrap();
            if !seen.contains(&id) {
                seen.push(id);
            }
        },
        threads,
    )?;
    let count = seen.lock().unwrap().len();
    Ok(count)
}

// The thread that ran each index of [low, high)
fn owners(low: i64, high: i64, threads: usize) -> Result<Vec<ThreadId>, Error> {
    let owner: Vec<Mutex<Option<ThreadId>>> = (low..high).map(|_| Mutex::new(None)).collect();
    parallel_for(
        low,
        high,
        |i| *owner[(i - low) as usize].lock().unwrap() = Some(std::thread::current().id()),
        threads,
    )?;
    Ok(owner
        .into_iter()
        .map(|o| o.into_inner().unwrap().unwrap())
        .collect())
}

// Indices sharing a chunk share a thread, and distinct chunks get
// distinct threads
fn assert_grouped_by(owner: &[ThreadId], low: i64, chunks: &[IndexRange]) {
    let mut seen: Vec<ThreadId> = Vec::new();
    for chunk in chunks.iter().filter(|c| !c.is_empty()) {
        let first = owner[(chunk.start() - low) as usize];
        assert!(chunk.iter().all(|i| owner[(i - low) as usize] == first));
        assert!(!seen.contains(&first), "chunk {chunk} shares a thread");
        seen.push(first);
    }
}

// ----- S C E N A R I O S ----------------------------------------------------------

#[test]
fn scenario_a_counter_per_index() -> Result<(), Error> {
    let hits = counters(100);
    parallel_for(
        0,
        100,
        |i| {
            hits[i as usize].fetch_add(1, Ordering::Relaxed);
        },
        4,
    )?;
    assert!(all_once(&hits));
    Ok(())
}

#[test]
fn scenario_b_sum_matrix() -> Result<(), Error> {
    let result: Vec<AtomicI64> = (0..100).map(|_| AtomicI64::new(-1)).collect();
    parallel_for_2d(
        0,
        10,
        0,
        10,
        |i, j| result[(i * 10 + j) as usize].store(i + j, Ordering::Relaxed),
        3,
    )?;
    for i in 0..10 {
        for j in 0..10 {
            assert_eq!(result[(i * 10 + j) as usize].load(Ordering::Relaxed), i + j);
        }
    }
    Ok(())
}

#[test]
fn scenario_c_empty_range() -> Result<(), Error> {
    let calls = AtomicUsize::new(0);
    let elapsed = parallel_for(
        5,
        5,
        |_| {
            calls.fetch_add(1, Ordering::Relaxed);
        },
        4,
    )?;
    assert_eq!(calls.load(Ordering::Relaxed), 0);
    assert!(elapsed >= Duration::ZERO);
    Ok(())
}

#[test]
fn scenario_d_more_threads_than_work() -> Result<(), Error> {
    let hits = counters(7);
    parallel_for(
        0,
        7,
        |i| {
            hits[i as usize].fetch_add(1, Ordering::Relaxed);
        },
        10,
    )?;
    assert!(all_once(&hits));
    Ok(())
}

// ----- P R O P E R T I E S --------------------------------------------------------

#[test]
fn exactly_once_for_every_thread_count() -> Result<(), Error> {
    for threads in [1, 2, 3, 5, 8, 13, 31, 64] {
        let hits = counters(257);
        parallel_for(
            -100,
            157,
            |i| {
                hits[(i + 100) as usize].fetch_add(1, Ordering::Relaxed);
            },
            threads,
        )?;
        assert!(all_once(&hits), "{threads} threads");
    }
    Ok(())
}

#[test]
fn exactly_once_in_two_dimensions() -> Result<(), Error> {
    for threads in [1, 4, 7, 64] {
        let hits = counters(13 * 6);
        parallel_for_2d(
            0,
            13,
            -3,
            3,
            |i, j| {
                hits[(i * 6 + j + 3) as usize].fetch_add(1, Ordering::Relaxed);
            },
            threads,
        )?;
        assert!(all_once(&hits), "{threads} threads");
    }
    Ok(())
}

#[test]
fn empty_inner_range() -> Result<(), Error> {
    let calls = AtomicUsize::new(0);
    parallel_for_2d(
        0,
        10,
        4,
        4,
        |_, _| {
            calls.fetch_add(1, Ordering::Relaxed);
        },
        4,
    )?;
    assert_eq!(calls.load(Ordering::Relaxed), 0);
    Ok(())
}

#[test]
fn thread_count_normalization() -> Result<(), Error> {
    // 0 behaves like 1: only the calling thread does any work
    assert_eq!(threads_used(0, 1000, 0)?, 1);
    assert_eq!(threads_used(0, 1000, 1)?, 1);

    // 1000 behaves like 64
    let hits = counters(1000);
    parallel_for(
        0,
        1000,
        |i| {
            hits[i as usize].fetch_add(1, Ordering::Relaxed);
        },
        1000,
    )?;
    assert!(all_once(&hits));

    // ... down to the chunking itself
    let range = IndexRange::new(0, 640)?;
    let owner = owners(0, 640, 1000)?;
    assert_grouped_by(&owner, 0, &parfor::partition(range, MAX_THREADS));
    assert_eq!(threads_used(0, 640, 1000)?, MAX_THREADS);
    Ok(())
}

#[test]
fn chunking_follows_the_partition() -> Result<(), Error> {
    let owner = owners(0, 10, 4)?;
    assert_grouped_by(&owner, 0, &parfor::partition(IndexRange::new(0, 10)?, 4));
    // The last chunk is run by the caller
    assert_eq!(owner[9], std::thread::current().id());
    Ok(())
}

#[test]
fn writes_are_visible_after_return() -> Result<(), Error> {
    let mut squares = vec![0_u64; 10_000];
    parallel_for_each_mut(&mut squares, |i, s| *s = (i * i) as u64, 8)?;
    let expected: Vec<u64> = (0..10_000_u64).map(|i| i * i).collect();
    assert_eq!(squares, expected);
    Ok(())
}

#[test]
fn failures() {
    assert!(matches!(
        parallel_for(1, 0, |_| {}, 4),
        Err(Error::InvalidRange { start: 1, end: 0 })
    ));
    assert!(matches!(
        parallel_for_2d(2, 1, 0, 1, |_, _| {}, 4),
        Err(Error::InvalidRange { start: 2, end: 1 })
    ));

    let survivors = AtomicUsize::new(0);
    let result = parallel_for(
        0,
        40,
        |i| {
            if i == 5 {
                panic!("index five");
            }
            survivors.fetch_add(1, Ordering::SeqCst);
        },
        4,
    );
    match result {
        Err(Error::CallbackPanic { chunk, message }) => {
            assert_eq!(chunk, 0);
            assert_eq!(message, "index five");
        }
        other => panic!("expected a callback panic, got {other:?}"),
    }
    // Chunk 0 stopped at index 5, the other three chunks of 10 all finished
    assert_eq!(survivors.load(Ordering::SeqCst), 5 + 30);
}
