//! Intensity histogram.

use crate::core::types::PixelBuffer;
use serde::{Deserialize, Serialize};

/// Number of bins.
pub const BINS: usize = 256;

/// 256-bin histogram over [0, 255].
///
/// Bin `v` counts the samples equal to `v`. Bin edges follow an evenly
/// divided [0, 255] range, so the last bin is closed on the right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    /// Count every sample of `buffer`.
    pub fn compute(buffer: &PixelBuffer) -> Self {
        let mut counts = vec![0u64; BINS];
        for &v in buffer.as_bytes() {
            counts[v as usize] += 1;
        }
        Self { counts }
    }

    /// Per-bin counts, indexed by sample value.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total number of samples counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// The `BINS + 1` bin edges, from 0.0 to 255.0.
    pub fn bin_edges(&self) -> Vec<f64> {
        (0..=BINS).map(|i| i as f64 * 255.0 / BINS as f64).collect()
    }

    /// Value of the most populated bin (lowest value on ties).
    pub fn mode(&self) -> u8 {
        let mut best = 0;
        for (value, &count) in self.counts.iter().enumerate() {
            if count > self.counts[best] {
                best = value;
            }
        }
        best as u8
    }

    /// Mean sample value.
    pub fn mean(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(value, &count)| value as u64 * count)
            .sum();
        weighted as f64 / total as f64
    }
}
