//! Compressed image formats through the `image` crate.

use crate::core::error::{FlowResult, ImportResult};
use crate::core::types::PixelBuffer;
use crate::ops::grayscale::from_dynamic_image;
use std::path::Path;

/// Decode an encoded image (format guessed from content) to grayscale.
pub fn decode_image(bytes: &[u8]) -> ImportResult<PixelBuffer> {
    let img = image::load_from_memory(bytes)?;
    log::debug!(
        "Decoded {}x{} {:?} image",
        img.width(),
        img.height(),
        img.color()
    );
    Ok(from_dynamic_image(&img)?)
}

/// Save a buffer as an 8-bit grayscale PNG for previews.
pub fn save_png(path: &Path, buffer: &PixelBuffer) -> FlowResult<()> {
    buffer
        .to_gray_image()
        .save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{load, ImportFormat, ImportOptions};

    #[test]
    fn test_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.png");
        let buffer = PixelBuffer::from_fn(5, 3, |r, c| (r * 50 + c * 10) as u8).unwrap();

        save_png(&path, &buffer).unwrap();
        let imported = load(&path, &ImportOptions::new()).unwrap();
        assert_eq!(imported.format, ImportFormat::Image);
        assert!(imported.inferred.is_none());
        assert_eq!(*imported.buffer, buffer);
    }

    #[test]
    fn test_rgb_png_is_averaged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.png");
        let rgb = image::RgbImage::from_pixel(2, 2, image::Rgb([30, 60, 90]));
        rgb.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let buffer = decode_image(&bytes).unwrap();
        assert!(buffer.as_bytes().iter().all(|&v| v == 60));
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        assert!(decode_image(b"not an image").is_err());
    }
}
