//! Point operation node: brightness and threshold.

use crate::core::context::ProcessContext;
use crate::core::error::NodeResult;
use crate::core::node::{Category, NodeMetadata, NodeOutput};
use crate::core::port::{Constraint, ParameterDefinition};
use crate::core::types::{Value, ValueType};
use crate::nodes::IMAGE_PORT;
use crate::ops::point::{adjust_brightness, threshold, PointOperation};
use std::sync::Arc;

pub fn metadata() -> NodeMetadata {
    NodeMetadata::builder("point_op", "Point Operation")
        .description("Adjust brightness or apply a binary threshold per pixel")
        .category(Category::Adjust)
        .input(IMAGE_PORT)
        .output(IMAGE_PORT)
        .parameter(
            ParameterDefinition::new("operation", ValueType::String, Value::from("brightness"))
                .with_description("Operation: brightness, threshold")
                .with_constraint(Constraint::OneOf(vec![
                    "brightness".into(),
                    "threshold".into(),
                ])),
        )
        .parameter(
            ParameterDefinition::new("delta", ValueType::Float, Value::Float(0.0))
                .with_description("Offset added by brightness (truncated to an integer)")
                .with_constraint(Constraint::Range {
                    min: -255.0,
                    max: 255.0,
                }),
        )
        .parameter(
            ParameterDefinition::new("t", ValueType::Float, Value::Float(128.0))
                .with_description("Threshold; samples >= t become high"),
        )
        .parameter(
            ParameterDefinition::new("high", ValueType::Integer, Value::Integer(255))
                .with_description("Value for samples at or above the threshold")
                .with_constraint(Constraint::Range {
                    min: 0.0,
                    max: 255.0,
                }),
        )
        .parameter(
            ParameterDefinition::new("low", ValueType::Integer, Value::Integer(0))
                .with_description("Value for samples below the threshold")
                .with_constraint(Constraint::Range {
                    min: 0.0,
                    max: 255.0,
                }),
        )
        .build()
}

pub fn process(ctx: &mut ProcessContext) -> NodeResult<NodeOutput> {
    let input = ctx.input(IMAGE_PORT)?.clone();
    let operation: PointOperation = ctx
        .get_string("operation")
        .unwrap_or("brightness")
        .parse()
        .map_err(|e: String| ctx.invalid("operation", e))?;

    let output = match operation {
        PointOperation::Brightness => {
            let delta = ctx.get_float("delta").unwrap_or(0.0);
            adjust_brightness(&input, delta.trunc() as i64)
        }
        PointOperation::Threshold => {
            let t = ctx.get_float("t").unwrap_or(128.0);
            let high = sample_parameter(ctx, "high", 255)?;
            let low = sample_parameter(ctx, "low", 0)?;
            threshold(&input, t, high, low)
        }
    };

    Ok(NodeOutput::image(Arc::new(output)))
}

fn sample_parameter(ctx: &ProcessContext, name: &str, default: u8) -> NodeResult<u8> {
    let value = ctx.get_integer(name).unwrap_or(i64::from(default));
    u8::try_from(value).map_err(|_| ctx.invalid(name, format!("{} is outside [0, 255]", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{NodeError, NodeId};
    use crate::core::types::PixelBuffer;

    fn context(data: Vec<u8>) -> ProcessContext {
        let buffer = Arc::new(PixelBuffer::new(data.len(), 1, data).unwrap());
        ProcessContext::new(NodeId::new()).with_input(IMAGE_PORT, buffer)
    }

    #[test]
    fn test_brightness_truncates_delta() {
        let mut ctx = context(vec![10, 250])
            .with_parameter("operation", "brightness")
            .with_parameter("delta", 7.9);
        let out = process(&mut ctx).unwrap();
        assert_eq!(out.image.unwrap().as_bytes(), &[17, 255]);
    }

    #[test]
    fn test_threshold_with_defaults() {
        let mut ctx = context(vec![127, 128]).with_parameter("operation", "Threshold");
        let out = process(&mut ctx).unwrap();
        assert_eq!(out.image.unwrap().as_bytes(), &[0, 255]);
    }

    #[test]
    fn test_out_of_range_level_is_local_error() {
        let mut ctx = context(vec![1])
            .with_parameter("operation", "threshold")
            .with_parameter("high", 300i64);
        assert!(matches!(
            process(&mut ctx),
            Err(NodeError::InvalidParameter { parameter, .. }) if parameter == "high"
        ));
    }

    #[test]
    fn test_unknown_operation() {
        let mut ctx = context(vec![1]).with_parameter("operation", "gamma");
        assert!(process(&mut ctx).is_err());
    }
}
