//! Per-pixel point operations.

use crate::core::types::PixelBuffer;
use std::fmt;
use std::str::FromStr;

/// Operation applied by a point-operation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOperation {
    /// Add a signed offset to every sample.
    Brightness,
    /// Binary threshold.
    Threshold,
}

impl PointOperation {
    /// Name accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            PointOperation::Brightness => "brightness",
            PointOperation::Threshold => "threshold",
        }
    }
}

impl FromStr for PointOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brightness" => Ok(PointOperation::Brightness),
            "threshold" => Ok(PointOperation::Threshold),
            other => Err(format!("unknown point operation '{}'", other)),
        }
    }
}

impl fmt::Display for PointOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Add `delta` to every sample, saturating at 0 and 255.
pub fn adjust_brightness(buffer: &PixelBuffer, delta: i64) -> PixelBuffer {
    let delta = delta.clamp(-255, 255) as i16;
    buffer.map(|v| (v as i16 + delta).clamp(0, 255) as u8)
}

/// Map samples `>= t` to `high` and the rest to `low`.
pub fn threshold(buffer: &PixelBuffer, t: f64, high: u8, low: u8) -> PixelBuffer {
    buffer.map(|v| if f64::from(v) >= t { high } else { low })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp() -> PixelBuffer {
        PixelBuffer::from_fn(4, 4, |r, c| (r * 64 + c * 16) as u8).unwrap()
    }

    #[test]
    fn test_parse_operation() {
        assert_eq!("Threshold".parse::<PointOperation>(), Ok(PointOperation::Threshold));
        assert_eq!(" brightness ".parse::<PointOperation>(), Ok(PointOperation::Brightness));
        assert!("gamma".parse::<PointOperation>().is_err());
    }

    #[test]
    fn test_brightness_saturates() {
        let buf = PixelBuffer::new(3, 1, vec![0, 100, 250]).unwrap();
        assert_eq!(adjust_brightness(&buf, 10).as_bytes(), &[10, 110, 255]);
        assert_eq!(adjust_brightness(&buf, -120).as_bytes(), &[0, 0, 130]);
        assert_eq!(adjust_brightness(&buf, 10_000).as_bytes(), &[255, 255, 255]);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let buf = PixelBuffer::new(3, 1, vec![127, 128, 129]).unwrap();
        assert_eq!(threshold(&buf, 128.0, 255, 0).as_bytes(), &[0, 255, 255]);
        assert_eq!(threshold(&buf, 128.0, 10, 200).as_bytes(), &[200, 10, 10]);
    }

    #[test]
    fn test_zero_brightness_on_ramp() {
        let buf = ramp();
        assert_eq!(adjust_brightness(&buf, 0), buf);
    }

    proptest! {
        #[test]
        fn brightness_zero_is_identity(data in proptest::collection::vec(any::<u8>(), 12)) {
            let buf = PixelBuffer::new(3, 4, data).unwrap();
            prop_assert_eq!(adjust_brightness(&buf, 0), buf);
        }

        #[test]
        fn threshold_output_is_binary(
            data in proptest::collection::vec(any::<u8>(), 16),
            t in 0u8..=255,
        ) {
            let buf = PixelBuffer::new(4, 4, data).unwrap();
            let out = threshold(&buf, f64::from(t), 255, 0);
            for (&src, &dst) in buf.as_bytes().iter().zip(out.as_bytes()) {
                prop_assert_eq!(dst, if src >= t { 255 } else { 0 });
            }
        }
    }
}
