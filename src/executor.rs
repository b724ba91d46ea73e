use crate::internal::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, PoisonError};
use std::thread;

// ----- T H E   W O R K   T R A I T --------------------------------------------------

/// A unit of work, consumed by the one thread that runs it
pub trait Work: Send {
    fn run(self);
}

impl<F> Work for F
where
    F: FnOnce() + Send,
{
    fn run(self) {
        self()
    }
}

// ----- S T A R T   G A T E ----------------------------------------------------------

// Spawned workers park here until every one of them has been spawned.
// The verdict tells them whether to run (all spawned) or to leave
// without touching their work (a later spawn failed).
struct StartGate {
    verdict: Mutex<Option<bool>>,
    decided: Condvar,
}

impl StartGate {
    fn new() -> StartGate {
        StartGate {
            verdict: Mutex::new(None),
            decided: Condvar::new(),
        }
    }

    fn open(&self, proceed: bool) {
        let mut verdict = self.verdict.lock().unwrap_or_else(PoisonError::into_inner);
        *verdict = Some(proceed);
        self.decided.notify_all();
    }

    fn wait(&self) -> bool {
        let verdict = self.verdict.lock().unwrap_or_else(PoisonError::into_inner);
        let verdict = self
            .decided
            .wait_while(verdict, |v| v.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        *verdict == Some(true)
    }
}

// ----- T H E   E X E C U T O R ------------------------------------------------------

/// Spawn-N, join-all dispatcher.
///
/// With `n` lanes of work, `n - 1` scoped worker threads are spawned, and
/// the calling thread runs the last lane itself. `execute` returns only
/// when every worker has been joined, so all writes made by the work are
/// visible to the caller afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executor {
    threads: usize,
    // Worker index whose spawn is made to fail
    #[cfg(test)]
    refuse_spawn: Option<usize>,
}

impl Executor {
    /// `threads` counts the calling thread too, and is clamped to `[1, MAX_THREADS]`
    pub fn new(threads: usize) -> Executor {
        Executor {
            threads: clamp_threads(threads),
            #[cfg(test)]
            refuse_spawn: None,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run all of `work`, returning the wall clock time from dispatch
    /// through the final join.
    ///
    /// Items are grouped into at most `threads` contiguous lanes, one per
    /// thread. Either every lane runs, or (when a worker thread cannot be
    /// spawned) none of them does. A panic in any lane is caught, the
    /// remaining workers are still joined, and the call then fails with
    /// [`Error::CallbackPanic`] naming the lowest panicking lane.
    pub fn execute<W: Work>(&self, work: Vec<W>) -> Result<Duration, Error> {
        let stopwatch = Stopwatch::start();
        let mut lanes = self.lanes(work);
        let Some(inline) = lanes.pop() else {
            return Ok(stopwatch.elapsed());
        };
        debug!("Dispatching {} workers + 1 inline", lanes.len());

        let gate = StartGate::new();
        let outcome = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(lanes.len());
            for (index, lane) in lanes.into_iter().enumerate() {
                let gate = &gate;
                let spawned = self.spawn(scope, index, move || {
                    if gate.wait() {
                        run_lane(lane);
                    }
                });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(source) => {
                        warn!("Could not spawn worker {index}: {source}");
                        gate.open(false);
                        for handle in handles {
                            // Nothing to report: they leave without running
                            let _ = handle.join();
                        }
                        return Err(Error::ThreadSpawn { index, source });
                    }
                }
            }
            gate.open(true);

            let inline_index = handles.len();
            let mut failure = panic::catch_unwind(AssertUnwindSafe(|| run_lane(inline)))
                .err()
                .map(|payload| (inline_index, payload));

            // The barrier: every worker is joined, panicked or not
            for (index, handle) in handles.into_iter().enumerate() {
                if let Err(payload) = handle.join() {
                    if failure.as_ref().map_or(true, |(lowest, _)| index < *lowest) {
                        failure = Some((index, payload));
                    }
                }
            }

            match failure {
                None => Ok(()),
                Some((chunk, payload)) => {
                    let message = panic_message(&*payload);
                    warn!("Callback panicked in chunk {chunk}: {message}");
                    Err(Error::CallbackPanic { chunk, message })
                }
            }
        });

        let elapsed = stopwatch.elapsed();
        outcome?;
        info!("Execution time: {} microseconds", elapsed.as_micros());
        Ok(elapsed)
    }

    fn spawn<'scope, 'env, F>(
        &self,
        scope: &'scope thread::Scope<'scope, 'env>,
        index: usize,
        worker: F,
    ) -> std::io::Result<thread::ScopedJoinHandle<'scope, ()>>
    where
        F: FnOnce() + Send + 'scope,
    {
        #[cfg(test)]
        {
            if self.refuse_spawn == Some(index) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "worker spawn refused",
                ));
            }
        }
        thread::Builder::new()
            .name(format!("parfor-worker-{index}"))
            .spawn_scoped(scope, worker)
    }

    // Group `work` into at most `threads` contiguous lanes. Trailing lanes
    // may come out empty, exactly like trailing chunks of a partition.
    fn lanes<W>(&self, work: Vec<W>) -> Vec<Vec<W>> {
        let count = self.threads.min(work.len());
        if count == 0 {
            return Vec::new();
        }
        let per_lane = work.len().div_ceil(count);
        let mut items = work.into_iter();
        (0..count)
            .map(|_| items.by_ref().take(per_lane).collect())
            .collect()
    }
}

impl Default for Executor {
    /// One thread per available core
    fn default() -> Self {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        Executor::new(cores)
    }
}

fn run_lane<W: Work>(lane: Vec<W>) {
    for work in lane {
        work.run();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return message.to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    String::from("unknown panic payload")
}

// ----- T E S T S ------------------------------------------------------------------
