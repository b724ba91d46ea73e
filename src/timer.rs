use std::time::{Duration, Instant};

/// Monotonic wall clock timer
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Stopwatch {
        Stopwatch {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time in whole microseconds
    pub fn micros(&self) -> u128 {
        self.elapsed().as_micros()
    }
}

// ----- T E S T S ------------------------------------------------------------------
