//! Median filter node.

use crate::core::context::ProcessContext;
use crate::core::error::NodeResult;
use crate::core::node::{Category, NodeMetadata, NodeOutput};
use crate::core::port::{Constraint, ParameterDefinition};
use crate::core::types::{Value, ValueType};
use crate::nodes::IMAGE_PORT;
use crate::ops::median::median_filter;
use std::sync::Arc;

pub fn metadata() -> NodeMetadata {
    NodeMetadata::builder("median", "Median Filter")
        .description("Replace each pixel with the median of its square window")
        .category(Category::Filter)
        .input(IMAGE_PORT)
        .output(IMAGE_PORT)
        .parameter(
            ParameterDefinition::new("size", ValueType::Integer, Value::Integer(3))
                .with_description("Window side; even values are rounded up to odd")
                .with_constraint(Constraint::MinValue(0.0)),
        )
        .build()
}

pub fn process(ctx: &mut ProcessContext) -> NodeResult<NodeOutput> {
    let input = ctx.input(IMAGE_PORT)?.clone();
    let size = ctx.get_integer("size").unwrap_or(3);
    if size < 0 {
        return Err(ctx.invalid("size", "window size cannot be negative"));
    }
    Ok(NodeOutput::image(Arc::new(median_filter(&input, size as usize))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::NodeId;
    use crate::core::types::PixelBuffer;

    #[test]
    fn test_default_size() {
        let buffer = PixelBuffer::from_fn(3, 3, |r, c| if (r, c) == (1, 1) { 200 } else { 0 }).unwrap();
        let mut ctx = ProcessContext::new(NodeId::new()).with_input(IMAGE_PORT, Arc::new(buffer));
        let out = process(&mut ctx).unwrap();
        assert!(out.image.unwrap().as_bytes().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_negative_size_rejected() {
        let buffer = PixelBuffer::filled(2, 2, 1).unwrap();
        let mut ctx = ProcessContext::new(NodeId::new())
            .with_input(IMAGE_PORT, Arc::new(buffer))
            .with_parameter("size", -1i64);
        assert!(process(&mut ctx).is_err());
    }
}
