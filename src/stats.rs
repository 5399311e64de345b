use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Largest overlap length the histogram can record.
pub const MAX_READ_LENGTH: usize = 2048;

/// Lock-free histogram of removal overlap lengths.
pub struct OverlapHistogram {
    buckets: Vec<AtomicU64>,
}

impl OverlapHistogram {
    pub fn new() -> Self {
        Self {
            buckets: (0..=MAX_READ_LENGTH).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Returns false if `overlap` is past [`MAX_READ_LENGTH`] and was not recorded.
    pub fn record(&self, overlap: usize) -> bool {
        match self.buckets.get(overlap) {
            Some(bucket) => {
                bucket.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn count(&self, overlap: usize) -> u64 {
        self.buckets
            .get(overlap)
            .map_or(0, |b| b.load(Ordering::Relaxed))
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).sum()
    }

    pub fn summary(&self) -> OverlapSummary {
        let counts = self
            .buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect::<Vec<_>>();

        let n = counts.iter().sum::<u64>();
        if n == 0 {
            return OverlapSummary::default();
        }

        let min = counts.iter().position(|&c| c > 0).unwrap_or(0);
        let max = counts.iter().rposition(|&c| c > 0).unwrap_or(0);
        let sum = counts
            .iter()
            .enumerate()
            .map(|(len, &c)| len as u64 * c)
            .sum::<u64>();

        // first length where the cumulative count reaches half, rounded up
        let half = (n + 1) / 2;
        let mut cum = 0;
        let median = counts
            .iter()
            .position(|&c| {
                cum += c;
                cum >= half
            })
            .unwrap_or(0);

        OverlapSummary {
            min,
            max,
            mean: (sum / n) as usize,
            median,
        }
    }
}

impl Default for OverlapHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer overlap statistics. All zero when nothing was removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapSummary {
    pub min: usize,
    pub max: usize,
    pub mean: usize,
    pub median: usize,
}

impl fmt::Display for OverlapSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Min, max, mean and median adapter overlap: {} / {} / {} / {}",
            self.min, self.max, self.mean, self.median
        )
    }
}
