//! Pixel-level algorithms.
//!
//! Every function here is pure: it takes shared [`PixelBuffer`]s and returns
//! freshly allocated results. Node kinds in [`crate::nodes`] wrap these with
//! parameter handling.
//!
//! [`PixelBuffer`]: crate::core::types::PixelBuffer

pub mod grayscale;
pub mod point;
pub mod convolution;
pub mod median;
pub mod histogram;
pub mod metrics;
pub mod dimensions;

pub use convolution::{convolve, ConvolutionPreset, Kernel};
pub use dimensions::{infer_dimensions, Confidence, Dimensions, InferredDimensions};
pub use grayscale::{clip_to_u8, from_dynamic_image, normalize_channels};
pub use histogram::Histogram;
pub use median::median_filter;
pub use metrics::{image_difference, DiffMetrics};
pub use point::{adjust_brightness, threshold, PointOperation};
