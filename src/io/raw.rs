//! Headerless 8-bit raw files.

use crate::core::error::{ImportError, ImportResult};
use crate::core::types::PixelBuffer;
use std::path::Path;

/// Interpret `bytes` as a `width x height` buffer.
pub fn decode_raw(bytes: Vec<u8>, width: usize, height: usize) -> ImportResult<PixelBuffer> {
    let expected = width * height;
    if bytes.len() != expected {
        return Err(ImportError::SizeMismatch {
            width,
            height,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(PixelBuffer::new(width, height, bytes)?)
}

/// Write the samples of `buffer` row by row with no header.
pub fn write_raw(path: &Path, buffer: &PixelBuffer) -> std::io::Result<()> {
    std::fs::write(path, buffer.as_bytes())
}
