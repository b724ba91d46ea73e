//! *A minimal data-parallel range dispatcher*.
//!
//! Give it an index range, one- or two-dimensional, and a callback with no
//! dependency between indices. The range is split into contiguous chunks,
//! the chunks are run concurrently on a bounded set of threads (the calling
//! thread takes the last chunk itself), and the wall clock time from
//! dispatch through the final join is handed back to the caller.
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! let counters: Vec<AtomicUsize> = (0..100).map(|_| AtomicUsize::new(0)).collect();
//! let elapsed = parfor::parallel_for(0, 100, |i| {
//!     counters[i as usize].fetch_add(1, Ordering::Relaxed);
//! }, 4)?;
//! assert!(counters.iter().all(|c| c.load(Ordering::Relaxed) == 1));
//! println!("Execution time: {} microseconds", elapsed.as_micros());
//! # Ok::<(), parfor::Error>(())
//! ```
//!
//! Callers own the concurrency contract: a callback is invoked from several
//! threads at once, so it may only read shared immutable data, or write to
//! memory that is disjoint per index (see [`parallel_for_each_mut`] for a
//! way to get that guaranteed by the borrow checker).

mod dispatch;
mod executor;
pub mod harness;
mod range;
mod task;
mod timer;

pub use dispatch::parallel_for;
pub use dispatch::parallel_for_2d;
pub use dispatch::parallel_for_each_mut;
pub use executor::Executor;
pub use executor::Work;
pub use harness::Harness;
pub use range::partition;
pub use range::IndexRange;
pub use task::tasks_1d;
pub use task::tasks_2d;
pub use task::Callback;
pub use task::Task;
pub use timer::Stopwatch;

use thiserror::Error;

/// Upper bound for the number of threads taking part in a single dispatch
/// (including the calling thread)
pub const MAX_THREADS: usize = 64;

/// Bring the requested thread count into `[1, MAX_THREADS]`.
///
/// Out of range requests are not an error: they are silently normalized,
/// so asking for 0 threads gives 1, and asking for 1000 gives [`MAX_THREADS`].
pub fn clamp_threads(requested: usize) -> usize {
    let threads = requested.clamp(1, MAX_THREADS);
    if threads != requested {
        log::debug!("Thread count {requested} normalized to {threads}");
    }
    threads
}

/// Preamble for crate-internal modules
pub(crate) mod internal {
    pub use log::debug;
    pub use log::info;
    pub use log::trace;
    pub use log::warn;

    pub use crate::clamp_threads;
    pub use crate::executor::Executor;
    pub use crate::executor::Work;
    pub use crate::range::partition;
    pub use crate::range::IndexRange;
    pub use crate::timer::Stopwatch;
    pub use crate::Error;
    pub use crate::MAX_THREADS;
    pub use std::time::Duration;
}

/// The bits and pieces needed for typical use
pub mod prelude {
    pub use crate::clamp_threads;
    pub use crate::parallel_for;
    pub use crate::parallel_for_2d;
    pub use crate::parallel_for_each_mut;
    pub use crate::Error;
    pub use crate::Harness;
    pub use crate::IndexRange;
    pub use crate::MAX_THREADS;
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid range: end {end} precedes start {start}")]
    InvalidRange { start: i64, end: i64 },

    #[error("could not spawn worker thread {index}")]
    ThreadSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("callback panicked in chunk {chunk}: {message}")]
    CallbackPanic { chunk: usize, message: String },

    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

// ----- T E S T S ------------------------------------------------------------------
