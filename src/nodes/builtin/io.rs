//! I/O nodes: Source, Sink, Display

use crate::core::context::ProcessContext;
use crate::core::error::NodeResult;
use crate::core::node::{Category, NodeMetadata, NodeOutput};
use crate::nodes::IMAGE_PORT;

/// Source node - exposes a buffer loaded from outside the graph.
pub fn source_metadata() -> NodeMetadata {
    NodeMetadata::builder("source", "Source")
        .description("Expose a buffer loaded from a raw, text or image file")
        .category(Category::Input)
        .output(IMAGE_PORT)
        .build()
}

pub fn process_source(ctx: &mut ProcessContext) -> NodeResult<NodeOutput> {
    let loaded = ctx.loaded()?.clone();
    Ok(NodeOutput::image(loaded))
}

/// Sink node - holds its input so it can be exported.
///
/// The buffer is also forwarded on the output port so flows may continue
/// past a save point.
pub fn sink_metadata() -> NodeMetadata {
    NodeMetadata::builder("sink", "Sink")
        .description("Hold the incoming buffer for export as raw bytes")
        .category(Category::Output)
        .input(IMAGE_PORT)
        .output(IMAGE_PORT)
        .build()
}

pub fn process_sink(ctx: &mut ProcessContext) -> NodeResult<NodeOutput> {
    let input = ctx.input(IMAGE_PORT)?.clone();
    Ok(NodeOutput::image(input.clone()).with_persisted(input))
}

/// Display node - holds its input for a viewer.
pub fn display_metadata() -> NodeMetadata {
    NodeMetadata::builder("display", "Display")
        .description("Show the incoming buffer in a viewer")
        .category(Category::Output)
        .input(IMAGE_PORT)
        .build()
}

pub fn process_display(ctx: &mut ProcessContext) -> NodeResult<NodeOutput> {
    let input = ctx.input(IMAGE_PORT)?.clone();
    Ok(NodeOutput::image(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{NodeError, NodeId};
    use crate::core::types::PixelBuffer;
    use std::sync::Arc;

    #[test]
    fn test_source_without_buffer_fails() {
        let mut ctx = ProcessContext::new(NodeId::new());
        assert!(matches!(
            process_source(&mut ctx),
            Err(NodeError::NoBufferLoaded(_))
        ));
    }

    #[test]
    fn test_sink_persists_input() {
        let buffer = Arc::new(PixelBuffer::filled(2, 2, 9).unwrap());
        let mut ctx = ProcessContext::new(NodeId::new()).with_input(IMAGE_PORT, buffer.clone());
        let output = process_sink(&mut ctx).unwrap();
        assert_eq!(output.persisted.as_deref(), Some(&*buffer));
        assert!(Arc::ptr_eq(output.image.as_ref().unwrap(), &buffer));
    }

    #[test]
    fn test_display_requires_input() {
        let mut ctx = ProcessContext::new(NodeId::new());
        ctx.add_input(IMAGE_PORT, None);
        assert!(matches!(
            process_display(&mut ctx),
            Err(NodeError::MissingInput { .. })
        ));
    }
}
