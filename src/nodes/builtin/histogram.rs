//! Histogram node.

use crate::core::context::ProcessContext;
use crate::core::error::NodeResult;
use crate::core::node::{Category, NodeMetadata, NodeOutput};
use crate::nodes::IMAGE_PORT;
use crate::ops::histogram::Histogram;

/// Histogram node - counts intensities and forwards its input unchanged.
pub fn metadata() -> NodeMetadata {
    NodeMetadata::builder("histogram", "Histogram")
        .description("Count pixel intensities in 256 bins; the image passes through")
        .category(Category::Analyze)
        .input(IMAGE_PORT)
        .output(IMAGE_PORT)
        .build()
}

pub fn process(ctx: &mut ProcessContext) -> NodeResult<NodeOutput> {
    let input = ctx.input(IMAGE_PORT)?.clone();
    let histogram = Histogram::compute(&input);
    Ok(NodeOutput::image(input).with_histogram(histogram))
}
