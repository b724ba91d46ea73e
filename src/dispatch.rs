use crate::internal::*;
use crate::task::{tasks_1d, tasks_2d};

// ----- E N T R Y   P O I N T S ------------------------------------------------------

/// Invoke `callback(i)` exactly once for every `i` in `[low, high)`, spread
/// over `threads` threads (the calling thread included).
///
/// The range is split into `threads` contiguous chunks; indices within a
/// chunk are visited in ascending order, with no ordering between chunks.
/// `threads` is clamped to `[1, MAX_THREADS]`. Returns the time from
/// dispatch through the final join.
///
/// # Errors
/// - [`Error::InvalidRange`] if `high < low`, before anything runs
/// - [`Error::ThreadSpawn`] if a worker thread cannot be created. No
///   callback has been invoked in that case
/// - [`Error::CallbackPanic`] if the callback panics, reported after all
///   chunks have finished
pub fn parallel_for<F>(low: i64, high: i64, callback: F, threads: usize) -> Result<Duration, Error>
where
    F: Fn(i64) + Sync,
{
    let range = IndexRange::new(low, high)?;
    let executor = Executor::new(threads);
    let tasks = tasks_1d(range, executor.threads(), &callback);
    executor.execute(tasks)
}

/// Invoke `callback(i, j)` exactly once for every pair with `i` in
/// `[low1, high1)` and `j` in `[low2, high2)`.
///
/// Only the outer range is split across threads; each chunk runs the full
/// inner range for each of its outer indices. Otherwise as [`parallel_for`].
pub fn parallel_for_2d<F>(
    low1: i64,
    high1: i64,
    low2: i64,
    high2: i64,
    callback: F,
    threads: usize,
) -> Result<Duration, Error>
where
    F: Fn(i64, i64) + Sync,
{
    let outer = IndexRange::new(low1, high1)?;
    let inner = IndexRange::new(low2, high2)?;
    let executor = Executor::new(threads);
    let tasks = tasks_2d(outer, inner, executor.threads(), &callback);
    executor.execute(tasks)
}

/// Invoke `callback(i, &mut data[i])` for every element of `data`.
///
/// `data` is split the same way [`parallel_for`] splits `[0, data.len())`,
/// and each chunk gets exclusive access to its own sub-slice, so the
/// callback can write its results without any shared mutable state.
pub fn parallel_for_each_mut<T, F>(
    data: &mut [T],
    callback: F,
    threads: usize,
) -> Result<Duration, Error>
where
    T: Send,
    F: Fn(usize, &mut T) + Sync,
{
    let executor = Executor::new(threads);
    // A slice never holds more than isize::MAX elements
    let range = IndexRange::new(0, data.len() as i64)?;
    let callback = &callback;

    let mut rest = data;
    let mut work = Vec::with_capacity(executor.threads());
    for chunk in partition(range, executor.threads()) {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(chunk.len() as usize);
        rest = tail;
        let offset = chunk.start() as usize;
        work.push(move || {
            for (k, item) in head.iter_mut().enumerate() {
                callback(offset + k, item);
            }
        });
    }
    executor.execute(work)
}

// ----- T E S T S ------------------------------------------------------------------
