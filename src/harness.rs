//! Run a program's entry point, then report the time spent in each
//! dispatch it made.
//!
//! ```
//! let mut out = Vec::new();
//! let (sum, report) = parfor::harness::run(4, &mut out, |harness| {
//!     harness.parallel_for(0, 100, |_| {})?;
//!     harness.parallel_for(0, 100, |_| {})?;
//!     Ok::<_, parfor::Error>(42)
//! });
//! report?;
//! assert_eq!(sum?, 42);
//! let report = String::from_utf8(out)?;
//! assert_eq!(report.lines().count(), 2);
//! assert!(report.starts_with("Total execution time for parallel_for call 1: "));
//! # Ok::<(), anyhow::Error>(())
//! ```
use crate::internal::*;
use std::io::Write;

/// Dispatches on a fixed thread count, and records the elapsed time of
/// every dispatch made through it
#[derive(Debug, Default)]
pub struct Harness {
    executor: Executor,
    timings: Vec<Duration>,
}

impl Harness {
    /// `threads` is clamped to `[1, MAX_THREADS]`, as for every dispatch
    pub fn new(threads: usize) -> Harness {
        Harness {
            executor: Executor::new(threads),
            timings: Vec::new(),
        }
    }

    /// The (clamped) thread count used by every dispatch
    pub fn threads(&self) -> usize {
        self.executor.threads()
    }

    /// [`crate::parallel_for`], with the elapsed time recorded
    pub fn parallel_for<F>(&mut self, low: i64, high: i64, callback: F) -> Result<Duration, Error>
    where
        F: Fn(i64) + Sync,
    {
        let elapsed = crate::parallel_for(low, high, callback, self.threads())?;
        self.timings.push(elapsed);
        Ok(elapsed)
    }

    /// [`crate::parallel_for_2d`], with the elapsed time recorded
    pub fn parallel_for_2d<F>(
        &mut self,
        low1: i64,
        high1: i64,
        low2: i64,
        high2: i64,
        callback: F,
    ) -> Result<Duration, Error>
    where
        F: Fn(i64, i64) + Sync,
    {
        let elapsed = crate::parallel_for_2d(low1, high1, low2, high2, callback, self.threads())?;
        self.timings.push(elapsed);
        Ok(elapsed)
    }

    /// [`crate::parallel_for_each_mut`], with the elapsed time recorded
    pub fn parallel_for_each_mut<T, F>(&mut self, data: &mut [T], callback: F) -> Result<Duration, Error>
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync,
    {
        let elapsed = crate::parallel_for_each_mut(data, callback, self.threads())?;
        self.timings.push(elapsed);
        Ok(elapsed)
    }

    /// Elapsed times of the successful dispatches, in call order
    pub fn timings(&self) -> &[Duration] {
        &self.timings
    }

    pub fn total(&self) -> Duration {
        self.timings.iter().sum()
    }

    /// One line per recorded dispatch, numbered from 1
    pub fn report(&self, out: &mut dyn Write) -> Result<(), Error> {
        for (k, elapsed) in self.timings.iter().enumerate() {
            writeln!(
                out,
                "Total execution time for parallel_for call {}: {} microseconds",
                k + 1,
                elapsed.as_micros()
            )?;
        }
        Ok(())
    }
}

/// Call `entry` with a fresh [`Harness`] dispatching on `threads` threads,
/// then write the harness report to `out`.
///
/// The report is written whatever `entry` returns. The entry's result is
/// handed back unchanged, next to the outcome of writing the report, so a
/// failing `out` never swallows it.
pub fn run<T, F>(threads: usize, out: &mut dyn Write, entry: F) -> (T, Result<(), Error>)
where
    F: FnOnce(&mut Harness) -> T,
{
    let mut harness = Harness::new(threads);
    let stopwatch = Stopwatch::start();
    let result = entry(&mut harness);
    debug!(
        "Entry point returned after {} microseconds, {} dispatches on {} threads",
        stopwatch.micros(),
        harness.timings().len(),
        harness.threads()
    );
    let report = harness.report(out);
    if let Err(err) = &report {
        warn!("Could not write the timing report: {err}");
    }
    info!(
        "Time spent in dispatch: {} microseconds",
        harness.total().as_micros()
    );
    (result, report)
}

// ----- T E S T S ------------------------------------------------------------------
