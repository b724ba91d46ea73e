use crate::internal::*;

// ----- I N D E X   R A N G E --------------------------------------------------------

/// The half open index interval `[start, end)`.
///
/// `start <= end` always holds: [`IndexRange::new`] is the only way in from
/// the outside, and it refuses reversed bounds.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct IndexRange {
    start: i64,
    end: i64,
}

impl IndexRange {
    pub fn new(start: i64, end: i64) -> Result<IndexRange, Error> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(IndexRange { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of indices covered. Returned as `u64`, since the full `i64`
    /// domain holds more indices than `i64::MAX`
    pub fn len(&self) -> u64 {
        self.end.abs_diff(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: i64) -> bool {
        self.start <= index && index < self.end
    }

    /// The indices of the range, in ascending order
    pub fn iter(&self) -> std::ops::Range<i64> {
        self.start..self.end
    }
}

impl IntoIterator for IndexRange {
    type Item = i64;
    type IntoIter = std::ops::Range<i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Display for IndexRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ----- P A R T I T I O N I N G ------------------------------------------------------

/// Split `range` into `n` contiguous chunks covering it exactly.
///
/// All chunks but the last hold `ceil(len / n)` indices, the last one
/// absorbs the remainder. When `n` exceeds the number of indices, the
/// trailing chunks come out empty, sitting at `range.end()`.
/// `n == 0` is treated as `n == 1`.
pub fn partition(range: IndexRange, n: usize) -> Vec<IndexRange> {
    let n = n.max(1);
    let len = range.len();
    let chunk_size = len.div_ceil(n as u64);

    // Offsets are clamped to `len`, so `start + offset` never passes `end`
    let boundary = |i: usize| -> i64 {
        let offset = (i as u64).saturating_mul(chunk_size).min(len);
        range.start.saturating_add_unsigned(offset)
    };

    let chunks: Vec<IndexRange> = (0..n)
        .map(|i| {
            let start = boundary(i);
            let end = if i == n - 1 { range.end } else { boundary(i + 1) };
            IndexRange { start, end }
        })
        .collect();

    debug!("Partitioned {range} into {n} chunks of at most {chunk_size}");
    chunks
}

// ----- T E S T S ------------------------------------------------------------------
