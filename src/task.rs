use crate::internal::*;

/// The user supplied per-index work. Exactly one form per [`Task`].
///
/// The callback is shared by reference between all tasks of a dispatch,
/// hence the `Sync` bound: it is invoked from several threads at once,
/// on disjoint indices.
#[derive(Clone, Copy)]
pub enum Callback<'f> {
    Unary(&'f (dyn Fn(i64) + Sync)),
    Binary(&'f (dyn Fn(i64, i64) + Sync)),
}

impl std::fmt::Debug for Callback<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callback::Unary(_) => f.write_str("Unary"),
            Callback::Binary(_) => f.write_str("Binary"),
        }
    }
}

// ----- T A S K   D E S C R I P T O R ------------------------------------------------

/// One chunk of work: a primary range, for the 2D form also the full
/// secondary range, and the callback to run over them.
///
/// A `Task` is consumed by [`Task::run`], so it is executed at most once,
/// and it cannot outlive the callback it borrows.
#[derive(Debug)]
pub struct Task<'f> {
    primary: IndexRange,
    secondary: Option<IndexRange>,
    callback: Callback<'f>,
}

impl<'f> Task<'f> {
    pub fn unary(primary: IndexRange, callback: &'f (dyn Fn(i64) + Sync)) -> Task<'f> {
        Task {
            primary,
            secondary: None,
            callback: Callback::Unary(callback),
        }
    }

    pub fn binary(
        primary: IndexRange,
        secondary: IndexRange,
        callback: &'f (dyn Fn(i64, i64) + Sync),
    ) -> Task<'f> {
        Task {
            primary,
            secondary: Some(secondary),
            callback: Callback::Binary(callback),
        }
    }

    pub fn primary(&self) -> IndexRange {
        self.primary
    }

    /// The un-partitioned inner range. `None` for unary tasks
    pub fn secondary(&self) -> Option<IndexRange> {
        self.secondary
    }

    pub fn callback(&self) -> Callback<'f> {
        self.callback
    }

    /// Invoke the callback for every index (pair) of the task, in ascending
    /// order, outer index first
    pub fn run(self) {
        trace!("Running {:?} task over {}", self.callback, self.primary);
        match self.callback {
            Callback::Unary(f) => {
                for i in self.primary {
                    f(i);
                }
            }
            Callback::Binary(f) => {
                // Always present for binary tasks, by construction
                let inner = self.secondary.unwrap_or_default();
                for i in self.primary {
                    for j in inner {
                        f(i, j);
                    }
                }
            }
        }
    }
}

impl Work for Task<'_> {
    fn run(self) {
        Task::run(self)
    }
}

// ----- C O N S T R U C T O R S ------------------------------------------------------

/// One unary task per chunk of `range`, all sharing `callback`
pub fn tasks_1d<'f>(
    range: IndexRange,
    threads: usize,
    callback: &'f (dyn Fn(i64) + Sync),
) -> Vec<Task<'f>> {
    partition(range, threads)
        .into_iter()
        .map(|chunk| Task::unary(chunk, callback))
        .collect()
}

/// One binary task per chunk of `outer`. Only the outer range is
/// partitioned: every task gets all of `inner`
pub fn tasks_2d<'f>(
    outer: IndexRange,
    inner: IndexRange,
    threads: usize,
    callback: &'f (dyn Fn(i64, i64) + Sync),
) -> Vec<Task<'f>> {
    partition(outer, threads)
        .into_iter()
        .map(|chunk| Task::binary(chunk, inner, callback))
        .collect()
}

// ----- T E S T S ------------------------------------------------------------------
