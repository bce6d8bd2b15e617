//! 2D convolution with edge-replicate padding.

use crate::core::error::KernelError;
use crate::core::types::PixelBuffer;
use crate::ops::grayscale::clip_to_u8;
use std::fmt;
use std::str::FromStr;

/// A rectangular matrix of weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    rows: usize,
    cols: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// Build a kernel from rows of equal length.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, KernelError> {
        let cols = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(KernelError::Empty),
        };
        let mut weights = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(KernelError::Ragged {
                    row: index,
                    expected: cols,
                    found: row.len(),
                });
            }
            weights.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            weights,
        })
    }

    /// 3x3 box blur, every weight 1/9.
    pub fn mean3x3() -> Self {
        Self {
            rows: 3,
            cols: 3,
            weights: vec![1.0 / 9.0; 9],
        }
    }

    /// 4-neighbour Laplacian.
    pub fn laplacian() -> Self {
        Self {
            rows: 3,
            cols: 3,
            weights: vec![0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0],
        }
    }

    /// Parse a kernel from text: one row per non-blank line, values
    /// separated by whitespace.
    pub fn parse(text: &str) -> Result<Self, KernelError> {
        let rows = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.split_whitespace()
                    .map(|token| {
                        token
                            .parse::<f64>()
                            .map_err(|_| KernelError::InvalidNumber(token.to_string()))
                    })
                    .collect::<Result<Vec<f64>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rows)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Weight at `(row, col)`.
    pub fn weight(&self, row: usize, col: usize) -> f64 {
        self.weights[row * self.cols + col]
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Named kernel choices of a convolution node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvolutionPreset {
    Mean3x3,
    Laplacian,
    /// Delegates to the median filter.
    Median,
    /// Kernel parsed from the node's `kernel` text.
    Custom,
}

impl ConvolutionPreset {
    /// All presets, in menu order.
    pub const ALL: [ConvolutionPreset; 4] = [
        ConvolutionPreset::Mean3x3,
        ConvolutionPreset::Laplacian,
        ConvolutionPreset::Median,
        ConvolutionPreset::Custom,
    ];

    /// Name accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ConvolutionPreset::Mean3x3 => "mean3x3",
            ConvolutionPreset::Laplacian => "laplacian",
            ConvolutionPreset::Median => "median",
            ConvolutionPreset::Custom => "custom",
        }
    }

    /// Fixed kernel for this preset, if it has one.
    pub fn kernel(&self) -> Option<Kernel> {
        match self {
            ConvolutionPreset::Mean3x3 => Some(Kernel::mean3x3()),
            ConvolutionPreset::Laplacian => Some(Kernel::laplacian()),
            ConvolutionPreset::Median | ConvolutionPreset::Custom => None,
        }
    }
}

impl FromStr for ConvolutionPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown convolution preset '{}'", wanted))
    }
}

impl fmt::Display for ConvolutionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlate `buffer` with `kernel`.
///
/// The kernel is anchored at `(rows / 2, cols / 2)` and is not flipped.
/// Out-of-range reads replicate the nearest edge sample. Sums are clipped
/// to [0, 255] without normalisation.
pub fn convolve(buffer: &PixelBuffer, kernel: &Kernel) -> PixelBuffer {
    let anchor_row = (kernel.rows / 2) as isize;
    let anchor_col = (kernel.cols / 2) as isize;

    buffer.map_indexed(|row, col| {
        let mut acc = 0.0;
        for kr in 0..kernel.rows {
            for kc in 0..kernel.cols {
                let r = row as isize + kr as isize - anchor_row;
                let c = col as isize + kc as isize - anchor_col;
                acc += kernel.weight(kr, kc) * f64::from(buffer.pixel_replicated(r, c));
            }
        }
        clip_to_u8(acc)
    })
}
