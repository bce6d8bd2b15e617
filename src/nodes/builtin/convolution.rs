//! Convolution node with preset and custom kernels.

use crate::core::context::ProcessContext;
use crate::core::error::NodeResult;
use crate::core::node::{Category, NodeMetadata, NodeOutput};
use crate::core::port::{Constraint, ParameterDefinition};
use crate::core::types::{Value, ValueType};
use crate::nodes::IMAGE_PORT;
use crate::ops::convolution::{convolve, ConvolutionPreset, Kernel};
use crate::ops::median::median_filter;
use std::sync::Arc;

pub fn metadata() -> NodeMetadata {
    NodeMetadata::builder("convolution", "Convolution")
        .description("Apply a preset or custom kernel with edge-replicate padding")
        .category(Category::Filter)
        .input(IMAGE_PORT)
        .output(IMAGE_PORT)
        .parameter(
            ParameterDefinition::new("preset", ValueType::String, Value::from("mean3x3"))
                .with_description("Kernel: mean3x3, laplacian, median, custom")
                .with_constraint(Constraint::OneOf(
                    ConvolutionPreset::ALL
                        .iter()
                        .map(|p| p.as_str().to_string())
                        .collect(),
                )),
        )
        .parameter(
            ParameterDefinition::new("kernel", ValueType::String, Value::from(""))
                .with_description("Custom kernel, one row per line"),
        )
        .parameter(
            ParameterDefinition::new("size", ValueType::Integer, Value::Integer(3))
                .with_description("Window size for the median preset")
                .with_constraint(Constraint::MinValue(0.0)),
        )
        .build()
}

pub fn process(ctx: &mut ProcessContext) -> NodeResult<NodeOutput> {
    let input = ctx.input(IMAGE_PORT)?.clone();
    let preset: ConvolutionPreset = ctx
        .get_string("preset")
        .unwrap_or("mean3x3")
        .parse()
        .map_err(|e: String| ctx.invalid("preset", e))?;

    let kernel = match preset {
        ConvolutionPreset::Median => {
            let size = ctx.get_integer("size").unwrap_or(3).max(0) as usize;
            return Ok(NodeOutput::image(Arc::new(median_filter(&input, size))));
        }
        ConvolutionPreset::Custom => {
            let text = ctx.get_string("kernel").unwrap_or("");
            match Kernel::parse(text) {
                Ok(kernel) => kernel,
                Err(e) => {
                    ctx.notice(format!("custom kernel ignored, passing input through: {}", e));
                    return Ok(NodeOutput::image(input));
                }
            }
        }
        ConvolutionPreset::Mean3x3 => Kernel::mean3x3(),
        ConvolutionPreset::Laplacian => Kernel::laplacian(),
    };

    Ok(NodeOutput::image(Arc::new(convolve(&input, &kernel))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::NodeId;
    use crate::core::types::PixelBuffer;

    fn context(buffer: PixelBuffer) -> ProcessContext {
        ProcessContext::new(NodeId::new()).with_input(IMAGE_PORT, Arc::new(buffer))
    }

    #[test]
    fn test_mean_preset() {
        let mut ctx = context(PixelBuffer::filled(4, 4, 127).unwrap())
            .with_parameter("preset", "mean3x3");
        let out = process(&mut ctx).unwrap();
        assert!(out.image.unwrap().as_bytes().iter().all(|&v| v == 127));
    }

    #[test]
    fn test_median_preset_uses_size() {
        let buffer = PixelBuffer::from_fn(5, 5, |r, c| if (r, c) == (2, 2) { 255 } else { 3 }).unwrap();
        let mut ctx = context(buffer)
            .with_parameter("preset", "median")
            .with_parameter("size", 4i64);
        let out = process(&mut ctx).unwrap();
        assert!(out.image.unwrap().as_bytes().iter().all(|&v| v == 3));
    }

    #[test]
    fn test_malformed_custom_kernel_passes_through() {
        let buffer = Arc::new(PixelBuffer::from_fn(3, 3, |r, c| (r * 3 + c) as u8).unwrap());
        let mut ctx = ProcessContext::new(NodeId::new())
            .with_input(IMAGE_PORT, buffer.clone())
            .with_parameter("preset", "custom")
            .with_parameter("kernel", "1 2\n3");
        let out = process(&mut ctx).unwrap();
        assert!(Arc::ptr_eq(out.image.as_ref().unwrap(), &buffer));
        assert_eq!(ctx.take_notices().len(), 1);
    }

    #[test]
    fn test_custom_identity_kernel() {
        let buffer = PixelBuffer::from_fn(3, 2, |r, c| (r * 3 + c) as u8 * 20).unwrap();
        let mut ctx = context(buffer.clone())
            .with_parameter("preset", "custom")
            .with_parameter("kernel", "0 0 0\n0 1 0\n0 0 0");
        let out = process(&mut ctx).unwrap();
        assert_eq!(*out.image.unwrap(), buffer);
    }
}
