//! Difference node: absolute difference image and fidelity metrics.

use crate::core::context::ProcessContext;
use crate::core::error::{NodeError, NodeResult};
use crate::core::node::{Category, NodeMetadata, NodeOutput};
use crate::nodes::{DIFF_A_PORT, DIFF_B_PORT, IMAGE_PORT};
use crate::ops::metrics::image_difference;
use std::sync::Arc;

pub fn metadata() -> NodeMetadata {
    NodeMetadata::builder("difference", "Difference")
        .description("Compare two images: |a - b| with MSE, PSNR and SNR")
        .category(Category::Analyze)
        .input(DIFF_A_PORT)
        .input(DIFF_B_PORT)
        .output(IMAGE_PORT)
        .build()
}

/// Both inputs are needed; with either one absent the node produces nothing
/// and reports a notice rather than failing.
pub fn process(ctx: &mut ProcessContext) -> NodeResult<NodeOutput> {
    let (a, b) = match (ctx.input_optional(DIFF_A_PORT), ctx.input_optional(DIFF_B_PORT)) {
        (Some(a), Some(b)) => (a.clone(), b.clone()),
        _ => {
            ctx.notice("difference needs both inputs; no output produced");
            return Ok(NodeOutput::default());
        }
    };

    let (diff, metrics) = image_difference(&a, &b).map_err(|e| NodeError::Processing {
        node_id: ctx.node_id,
        error: e.to_string(),
    })?;
    Ok(NodeOutput::image(Arc::new(diff)).with_metrics(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::NodeId;
    use crate::core::types::PixelBuffer;

    #[test]
    fn test_identical_inputs() {
        let buffer = Arc::new(PixelBuffer::from_fn(3, 3, |r, c| (r + c) as u8).unwrap());
        let mut ctx = ProcessContext::new(NodeId::new())
            .with_input(DIFF_A_PORT, buffer.clone())
            .with_input(DIFF_B_PORT, buffer);
        let out = process(&mut ctx).unwrap();

        let metrics = out.metrics.unwrap();
        assert_eq!(metrics.mse, 0.0);
        assert!(metrics.psnr.is_infinite());
        assert!(out.image.unwrap().as_bytes().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_missing_input_gives_empty_output() {
        let buffer = Arc::new(PixelBuffer::filled(2, 2, 1).unwrap());
        let mut ctx = ProcessContext::new(NodeId::new()).with_input(DIFF_A_PORT, buffer);
        ctx.add_input(DIFF_B_PORT, None);

        let out = process(&mut ctx).unwrap();
        assert!(out.is_empty());
        assert_eq!(ctx.take_notices().len(), 1);
    }
}
