//! Conversion of multi-channel samples to 8-bit grayscale.

use crate::core::error::BufferError;
use crate::core::types::PixelBuffer;
use image::DynamicImage;

/// Slack for float accumulation error when truncating to an integer.
const SNAP_EPSILON: f64 = 1e-6;

/// Clip a sample to [0, 255] and truncate it to `u8`.
///
/// Values within a rounding error of an integer are snapped to it first, so
/// that sums like `9 * (v / 9)` land on `v` rather than `v - 1`. NaN maps to 0.
pub fn clip_to_u8(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let nearest = value.round();
    let value = if (value - nearest).abs() < SNAP_EPSILON {
        nearest
    } else {
        value
    };
    value.clamp(0.0, 255.0) as u8
}

/// Build a grayscale buffer from interleaved samples.
///
/// - 1 channel: kept as is.
/// - 2 channels (luma + alpha): luma kept, alpha dropped.
/// - 3 or 4 channels: mean of the first three, alpha dropped.
///
/// Samples are then clipped and truncated with [`clip_to_u8`].
pub fn normalize_channels(
    width: usize,
    height: usize,
    channels: usize,
    samples: &[f64],
) -> Result<PixelBuffer, BufferError> {
    if !(1..=4).contains(&channels) {
        return Err(BufferError::UnsupportedChannels(channels));
    }
    let expected = width * height * channels;
    if samples.len() != expected {
        return Err(BufferError::LengthMismatch {
            width,
            height,
            expected,
            actual: samples.len(),
        });
    }

    let data = samples
        .chunks_exact(channels)
        .map(|px| match channels {
            1 | 2 => clip_to_u8(px[0]),
            _ => clip_to_u8((px[0] + px[1] + px[2]) / 3.0),
        })
        .collect();
    PixelBuffer::new(width, height, data)
}

/// Convert a decoded image to a grayscale buffer.
///
/// Deeper formats are first reduced to 8 bits per channel without changing
/// the channel layout, then normalized with [`normalize_channels`].
pub fn from_dynamic_image(img: &DynamicImage) -> Result<PixelBuffer, BufferError> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let channels = img.color().channel_count() as usize;

    let bytes = match channels {
        1 => img.to_luma8().into_raw(),
        2 => img.to_luma_alpha8().into_raw(),
        3 => img.to_rgb8().into_raw(),
        4 => img.to_rgba8().into_raw(),
        other => return Err(BufferError::UnsupportedChannels(other)),
    };
    let samples: Vec<f64> = bytes.into_iter().map(f64::from).collect();
    normalize_channels(width, height, channels, &samples)
}
