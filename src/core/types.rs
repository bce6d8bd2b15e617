//! Core value types that flow through the processing graph.
//!
//! Two kinds of data exist in a flow:
//! - [`PixelBuffer`]: the 8-bit grayscale image carried along edges.
//! - [`Value`]: a node parameter set by the editing collaborator.

use crate::core::error::BufferError;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row-major 2D array of 8-bit grayscale samples.
///
/// Dimensions are fixed at creation and there is no mutating API: every
/// transform allocates a new buffer. Nodes publish buffers as
/// `Arc<PixelBuffer>` so downstream consumers share them read-only.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer from row-major samples.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::Empty { width, height });
        }
        let expected = width * height;
        if data.len() != expected {
            return Err(BufferError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a spatially constant buffer.
    pub fn filled(width: usize, height: usize, value: u8) -> Result<Self, BufferError> {
        Self::new(width, height, vec![value; width * height])
    }

    /// Create a buffer by evaluating `f(row, col)` for every sample.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Self, BufferError>
    where
        F: FnMut(usize, usize) -> u8,
    {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self::new(width, height, data)
    }

    /// Width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in samples.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of samples (`width * height`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; buffers cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// Sample at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    pub fn pixel(&self, row: usize, col: usize) -> u8 {
        assert!(
            row < self.height && col < self.width,
            "pixel ({row}, {col}) out of bounds for {}x{} buffer",
            self.width,
            self.height
        );
        self.data[row * self.width + col]
    }

    /// Sample at a possibly out-of-range position, replicating the nearest
    /// edge sample. Equivalent to reading from an edge-padded copy.
    pub fn pixel_replicated(&self, row: isize, col: isize) -> u8 {
        let r = row.clamp(0, self.height as isize - 1) as usize;
        let c = col.clamp(0, self.width as isize - 1) as usize;
        self.data[r * self.width + c]
    }

    /// One row of samples.
    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.width;
        &self.data[start..start + self.width]
    }

    /// All samples in row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning its samples.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Apply a per-sample transform into a new buffer of the same shape.
    pub fn map<F>(&self, f: F) -> PixelBuffer
    where
        F: Fn(u8) -> u8,
    {
        PixelBuffer {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Build a new buffer of the same shape from `f(row, col)`.
    pub fn map_indexed<F>(&self, mut f: F) -> PixelBuffer
    where
        F: FnMut(usize, usize) -> u8,
    {
        let mut data = Vec::with_capacity(self.data.len());
        for row in 0..self.height {
            for col in 0..self.width {
                data.push(f(row, col));
            }
        }
        PixelBuffer {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Copy the top-left `width x height` region.
    pub fn crop(&self, width: usize, height: usize) -> Result<PixelBuffer, BufferError> {
        let width = width.min(self.width);
        let height = height.min(self.height);
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            data.extend_from_slice(&self.row(row)[..width]);
        }
        PixelBuffer::new(width, height, data)
    }

    /// Convert into an `image` crate grayscale buffer for previews.
    pub fn to_gray_image(&self) -> GrayImage {
        // Dimensions were validated at construction, so the length always matches.
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Luma([self.data[y as usize * self.width + x as usize]])
        })
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelBuffer({}x{})", self.width, self.height)
    }
}

/// Parameter values stored on nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value
    Boolean(bool),
}

/// Types of parameter values, for checking assignments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Float,
    String,
    Boolean,
}

// ============================================================================
// Value Implementation
// ============================================================================

impl Value {
    /// Get the type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Boolean(_) => ValueType::Boolean,
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to get this value as a float.
    /// Integers are automatically converted to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_string(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{:.4}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

// ============================================================================
// ValueType Implementation
// ============================================================================

impl ValueType {
    /// Check if a value may be assigned to a slot of this type.
    ///
    /// Integers are accepted where floats are expected.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ValueType::Integer, Value::Integer(_))
                | (ValueType::Float, Value::Float(_))
                | (ValueType::Float, Value::Integer(_))
                | (ValueType::String, Value::String(_))
                | (ValueType::Boolean, Value::Boolean(_))
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::String => "String",
            ValueType::Boolean => "Boolean",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_rejects_bad_shapes() {
        assert!(matches!(
            PixelBuffer::new(0, 3, Vec::new()),
            Err(BufferError::Empty { .. })
        ));
        assert!(matches!(
            PixelBuffer::new(2, 2, vec![1, 2, 3]),
            Err(BufferError::LengthMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_buffer_accessors() {
        let buf = PixelBuffer::from_fn(3, 2, |r, c| (r * 10 + c) as u8).unwrap();
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.pixel(1, 2), 12);
        assert_eq!(buf.get(2, 0), None);
        assert_eq!(buf.row(1), &[10, 11, 12]);
        assert_eq!(buf.pixel_replicated(-1, -5), 0);
        assert_eq!(buf.pixel_replicated(9, 9), 12);
    }

    #[test]
    fn test_buffer_crop_top_left() {
        let buf = PixelBuffer::from_fn(4, 3, |r, c| (r * 4 + c) as u8).unwrap();
        let cropped = buf.crop(2, 2).unwrap();
        assert_eq!(cropped.as_bytes(), &[0, 1, 4, 5]);
    }

    #[test]
    fn test_gray_image_conversion() {
        let buf = PixelBuffer::from_fn(2, 2, |r, c| (r * 2 + c) as u8 * 50).unwrap();
        let img = buf.to_gray_image();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 1)[0], 150);
    }

    #[test]
    fn test_value_type_acceptance() {
        assert!(ValueType::Float.accepts(&Value::Integer(3)));
        assert!(!ValueType::Integer.accepts(&Value::Float(3.0)));
        assert!(ValueType::String.accepts(&Value::from("custom")));
        assert_eq!(Value::from(2.5).value_type(), ValueType::Float);
    }
}
