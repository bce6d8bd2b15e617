//! Loading external buffers and writing results.
//!
//! Three input formats are understood:
//! - Raw: headerless 8-bit samples, one byte per pixel.
//! - Text: whitespace-separated numbers, one sample each.
//! - Image: anything the `image` crate decodes, normalized to grayscale.
//!
//! Raw and text carry no shape, so unless dimensions are given they are
//! inferred from the sample count.

pub mod decode;
pub mod raw;
pub mod text;

use crate::core::error::{ImportError, ImportResult};
use crate::core::types::PixelBuffer;
use crate::ops::dimensions::{infer_dimensions, Confidence, Dimensions, InferredDimensions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Extensions decoded with the `image` crate.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

/// Extensions treated as numeric text.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "asc"];

/// Input format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    /// Pick by extension, then by content.
    #[default]
    Auto,
    Raw,
    Text,
    Image,
}

impl FromStr for ImportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ImportFormat::Auto),
            "raw" => Ok(ImportFormat::Raw),
            "text" | "txt" => Ok(ImportFormat::Text),
            "image" => Ok(ImportFormat::Image),
            other => Err(format!("unknown import format '{}'", other)),
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportFormat::Auto => "auto",
            ImportFormat::Raw => "raw",
            ImportFormat::Text => "text",
            ImportFormat::Image => "image",
        };
        f.write_str(name)
    }
}

/// Options for [`load`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Format to decode as.
    pub format: ImportFormat,
    /// Declared shape for raw and text input; inferred when absent.
    pub dimensions: Option<Dimensions>,
}

impl ImportOptions {
    /// Create default options (auto format, inferred shape).
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a format.
    pub fn with_format(mut self, format: ImportFormat) -> Self {
        self.format = format;
        self
    }

    /// Declare the shape of headerless input.
    pub fn with_dimensions(mut self, width: usize, height: usize) -> Self {
        self.dimensions = Some(Dimensions::new(width, height));
        self
    }
}

/// A successfully imported buffer.
#[derive(Debug, Clone)]
pub struct Imported {
    pub buffer: Arc<PixelBuffer>,
    /// Format actually used (never `Auto`).
    pub format: ImportFormat,
    /// Set when the shape was inferred rather than declared or decoded.
    pub inferred: Option<InferredDimensions>,
}

impl Imported {
    /// Whether the inferred shape is only a guess (`N x 1`).
    pub fn is_low_confidence(&self) -> bool {
        matches!(
            self.inferred,
            Some(InferredDimensions {
                confidence: Confidence::Low,
                ..
            })
        )
    }
}

/// Load a file into a grayscale buffer.
pub fn load(path: &Path, options: &ImportOptions) -> ImportResult<Imported> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let format = match options.format {
        ImportFormat::Auto => detect_format(path, &bytes, options.dimensions),
        explicit => explicit,
    };
    log::debug!("Importing {} as {}", path.display(), format);

    match format {
        ImportFormat::Image => {
            let buffer = decode::decode_image(&bytes)?;
            Ok(Imported {
                buffer: Arc::new(buffer),
                format,
                inferred: None,
            })
        }
        ImportFormat::Text => {
            let samples = text::parse_samples(&String::from_utf8_lossy(&bytes));
            shape_samples(samples, format, options.dimensions)
        }
        ImportFormat::Raw | ImportFormat::Auto => {
            shape_samples(bytes, ImportFormat::Raw, options.dimensions)
        }
    }
}

/// Decide a format from the extension, falling back to sniffing content.
///
/// A declared shape whose area equals the byte count selects raw before any
/// sniffing, so raw samples that happen to be ASCII digits stay raw.
pub fn detect_format(path: &Path, bytes: &[u8], declared: Option<Dimensions>) -> ImportFormat {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return ImportFormat::Image;
    }
    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return ImportFormat::Text;
    }
    if declared.is_some_and(|dims| dims.area() == bytes.len()) {
        return ImportFormat::Raw;
    }
    if text::looks_like_text(bytes) {
        if extension == "raw" {
            log::warn!(
                "{} looks like numeric text; reading it as text (pass the raw format or its size to override)",
                path.display()
            );
        }
        return ImportFormat::Text;
    }
    ImportFormat::Raw
}

/// Give headerless samples a shape, declared or inferred.
fn shape_samples(
    samples: Vec<u8>,
    format: ImportFormat,
    declared: Option<Dimensions>,
) -> ImportResult<Imported> {
    if let Some(dims) = declared {
        if dims.area() != samples.len() {
            return Err(ImportError::SizeMismatch {
                width: dims.width,
                height: dims.height,
                expected: dims.area(),
                actual: samples.len(),
            });
        }
        let buffer = PixelBuffer::new(dims.width, dims.height, samples)?;
        return Ok(Imported {
            buffer: Arc::new(buffer),
            format,
            inferred: None,
        });
    }

    let inferred = infer_dimensions(samples.len()).ok_or(ImportError::Empty)?;
    if inferred.confidence == Confidence::Low {
        log::warn!(
            "No rectangular shape fits {} samples; treating them as {}",
            samples.len(),
            inferred.dimensions
        );
    }
    let Dimensions { width, height } = inferred.dimensions;
    let buffer = PixelBuffer::new(width, height, samples)?;
    Ok(Imported {
        buffer: Arc::new(buffer),
        format,
        inferred: Some(inferred),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("a.PNG"), b"", None), ImportFormat::Image);
        assert_eq!(detect_format(Path::new("a.asc"), &[0, 1], None), ImportFormat::Text);
        assert_eq!(detect_format(Path::new("a.raw"), b"12 7\n3 4", None), ImportFormat::Text);
        assert_eq!(detect_format(Path::new("a.raw"), &[0, 200, 13], None), ImportFormat::Raw);
    }

    #[test]
    fn test_declared_shape_keeps_digit_bytes_raw() {
        let digits = [b'2'; 16];
        let declared = Some(Dimensions::new(4, 4));
        assert_eq!(detect_format(Path::new("flat.raw"), &digits, declared), ImportFormat::Raw);
        // A shape that does not match the byte count does not force raw.
        let other = Some(Dimensions::new(2, 2));
        assert_eq!(detect_format(Path::new("flat.raw"), &digits, other), ImportFormat::Text);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.raw");
        let buffer = PixelBuffer::filled(4, 4, 50).unwrap();
        raw::write_raw(&path, &buffer).unwrap();

        let imported = load(&path, &ImportOptions::new().with_dimensions(4, 4)).unwrap();
        assert_eq!(imported.format, ImportFormat::Raw);
        assert_eq!(*imported.buffer, buffer);
    }

    #[test]
    fn test_raw_with_inferred_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "square.raw", &[7u8; 16]);
        let imported = load(&path, &ImportOptions::new().with_format(ImportFormat::Raw)).unwrap();

        assert_eq!(imported.format, ImportFormat::Raw);
        assert_eq!((imported.buffer.width(), imported.buffer.height()), (4, 4));
        assert_eq!(imported.inferred.unwrap().confidence, Confidence::High);
    }

    #[test]
    fn test_raw_declared_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "short.raw", &[1, 2, 3]);
        let options = ImportOptions::new()
            .with_format(ImportFormat::Raw)
            .with_dimensions(2, 2);
        assert!(matches!(
            load(&path, &options),
            Err(ImportError::SizeMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_prime_count_is_low_confidence() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "row.txt", b"1 2 3 4 5 6 7");
        let imported = load(&path, &ImportOptions::new()).unwrap();
        assert_eq!(imported.format, ImportFormat::Text);
        assert!(imported.is_low_confidence());
        assert_eq!(imported.buffer.width(), 7);
    }

    #[test]
    fn test_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.raw", b"");
        assert!(matches!(
            load(&path, &ImportOptions::new()),
            Err(ImportError::Empty)
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = load(Path::new("/nonexistent/input.raw"), &ImportOptions::new());
        assert!(matches!(result, Err(ImportError::Io { .. })));
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("TXT".parse::<ImportFormat>(), Ok(ImportFormat::Text));
        assert!("jpeg".parse::<ImportFormat>().is_err());
    }
}
