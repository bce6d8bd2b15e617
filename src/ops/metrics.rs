//! Difference image and fidelity metrics.

use crate::core::error::BufferError;
use crate::core::types::PixelBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Peak sample value used by PSNR.
const PIXEL_MAX: f64 = 255.0;

/// Fidelity metrics of `b` measured against reference `a`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffMetrics {
    /// Mean squared error.
    pub mse: f64,
    /// Peak signal-to-noise ratio in dB; `+inf` when `mse == 0`.
    pub psnr: f64,
    /// Signal-to-noise ratio in dB; `+inf` when the noise power is 0.
    pub snr: f64,
}

impl DiffMetrics {
    /// True when both buffers were identical over the compared region.
    pub fn is_identical(&self) -> bool {
        self.mse == 0.0
    }
}

impl fmt::Display for DiffMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MSE={:.4} PSNR={:.2} dB SNR={:.2} dB",
            self.mse, self.psnr, self.snr
        )
    }
}

/// Absolute difference of `a` and `b` plus fidelity metrics.
///
/// When shapes differ both inputs are cropped to the common top-left region.
pub fn image_difference(
    a: &PixelBuffer,
    b: &PixelBuffer,
) -> Result<(PixelBuffer, DiffMetrics), BufferError> {
    let width = a.width().min(b.width());
    let height = a.height().min(b.height());
    let region = a.crop(width, height)?;

    let mut squared_error = 0.0;
    let mut signal = 0.0;
    let diff = region.map_indexed(|row, col| {
        let va = a.pixel(row, col);
        let vb = b.pixel(row, col);
        let d = f64::from(va) - f64::from(vb);
        squared_error += d * d;
        signal += f64::from(va) * f64::from(va);
        va.abs_diff(vb)
    });

    let count = (width * height) as f64;
    let mse = squared_error / count;
    let signal_power = signal / count;

    let psnr = if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (PIXEL_MAX * PIXEL_MAX / mse).log10()
    };
    let snr = if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (signal_power / mse).log10()
    };

    Ok((diff, DiffMetrics { mse, psnr, snr }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_difference() {
        let a = PixelBuffer::new(2, 1, vec![10, 20]).unwrap();
        let b = PixelBuffer::new(2, 1, vec![12, 16]).unwrap();
        let (diff, metrics) = image_difference(&a, &b).unwrap();
        assert_eq!(diff.as_bytes(), &[2, 4]);
        assert!((metrics.mse - 10.0).abs() < 1e-12);
        let expected_psnr = 10.0 * (65025.0f64 / 10.0).log10();
        assert!((metrics.psnr - expected_psnr).abs() < 1e-9);
        let expected_snr = 10.0 * (250.0f64 / 10.0).log10();
        assert!((metrics.snr - expected_snr).abs() < 1e-9);
    }

    #[test]
    fn test_crops_to_common_region() {
        let a = PixelBuffer::from_fn(4, 3, |r, c| (r * 4 + c) as u8).unwrap();
        let b = PixelBuffer::filled(2, 5, 0).unwrap();
        let (diff, _) = image_difference(&a, &b).unwrap();
        assert_eq!((diff.width(), diff.height()), (2, 3));
        assert_eq!(diff.as_bytes(), &[0, 1, 4, 5, 8, 9]);
    }

    #[test]
    fn test_zero_signal_gives_negative_infinite_snr() {
        let a = PixelBuffer::filled(2, 2, 0).unwrap();
        let b = PixelBuffer::filled(2, 2, 5).unwrap();
        let (_, metrics) = image_difference(&a, &b).unwrap();
        assert_eq!(metrics.snr, f64::NEG_INFINITY);
        assert!(metrics.psnr.is_finite());
    }

    proptest! {
        #[test]
        fn self_difference_is_zero(data in proptest::collection::vec(any::<u8>(), 20)) {
            let a = PixelBuffer::new(5, 4, data).unwrap();
            let (diff, metrics) = image_difference(&a, &a).unwrap();
            prop_assert!(diff.as_bytes().iter().all(|&v| v == 0));
            prop_assert_eq!(metrics.mse, 0.0);
            prop_assert_eq!(metrics.psnr, f64::INFINITY);
            prop_assert_eq!(metrics.snr, f64::INFINITY);
            prop_assert!(metrics.is_identical());
        }
    }
}
