#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Configuration knobs for a batch run.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Ceiling on simultaneous SMTP sessions.
    pub concurrency: usize,
    /// Dispatch candidates in groups of this size; `None` sends the whole
    /// batch to the pool at once.
    pub chunk_size: Option<usize>,
    /// How many standard deviations above the batch mean a latency must be
    /// to count as a timing outlier.
    pub outlier_sigma: f64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 10,
            chunk_size: None,
            outlier_sigma: 2.0,
        }
    }
}

impl BatchOptions {
    pub(crate) fn effective_chunk(&self, total: usize) -> usize {
        self.chunk_size
            .filter(|size| *size > 0)
            .unwrap_or(total)
            .max(1)
    }
}
