//! # Pixelflow - Dataflow Graphs for Grayscale Images
//!
//! Pixelflow builds image-processing pipelines as directed graphs of nodes.
//! Each node reads 8-bit grayscale buffers from its input ports and publishes
//! one result on its output ports; a scheduler runs every node once its
//! upstream nodes have finished.
//!
//! ## Features
//!
//! - **Node kinds**: source, sink, display, brightness/threshold, convolution,
//!   median, histogram and image difference
//! - **Run-time cycle detection**: graphs may contain cycles; the scheduler
//!   reports them instead of looping
//! - **Local errors**: a failing node only empties its own output
//! - **Import**: raw bytes, numeric text and common image formats, with
//!   shape inference for headerless input
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixelflow::prelude::*;
//!
//! let mut graph = FlowGraph::new();
//! let source = graph.add_node(NodeKind::Source, &[]).unwrap();
//! let blur = graph
//!     .add_node(NodeKind::Convolution, &[("preset", Value::from("mean3x3"))])
//!     .unwrap();
//! let sink = graph.add_node(NodeKind::Sink, &[]).unwrap();
//!
//! graph.connect(source, IMAGE_PORT, blur, IMAGE_PORT).unwrap();
//! graph.connect(blur, IMAGE_PORT, sink, IMAGE_PORT).unwrap();
//!
//! graph
//!     .load_source_file(source, "input.raw", &ImportOptions::new())
//!     .unwrap();
//!
//! let report = ExecutionEngine::new().run(&mut graph).unwrap();
//! assert!(!report.has_errors());
//! graph.export_persisted(sink, "output.raw").unwrap();
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Buffers, values, ports, node metadata and error types
//! - [`ops`]: Pure pixel algorithms
//! - [`nodes`]: The closed set of node kinds
//! - [`graph`]: Graph structure and topology analysis
//! - [`execution`]: Scheduler and progress reporting
//! - [`validation`]: Advisory pre-run checks
//! - [`io`]: Import and export
//! - [`config`]: TOML configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod execution;
pub mod graph;
pub mod io;
pub mod nodes;
pub mod ops;
pub mod validation;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use pixelflow::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{PixelBuffer, Value, ValueType};

    // Node metadata
    pub use crate::core::node::{Category, NodeMetadata, NodeOutput};

    // Parameter definitions
    pub use crate::core::port::{Constraint, ParameterDefinition, PortDirection};

    // Errors
    pub use crate::core::error::{
        EdgeId, ExecutionError, FlowError, GraphError, ImportError, NodeError, NodeId, PortId,
        ValidationError, ValidationReport, ValidationWarning,
    };

    // Node kinds
    pub use crate::nodes::{NodeKind, DIFF_A_PORT, DIFF_B_PORT, IMAGE_PORT};

    // Graph
    pub use crate::graph::structure::{FlowGraph, GraphNode};
    pub use crate::graph::topology::TopologyAnalyzer;

    // Validation
    pub use crate::validation::pipeline::ValidationPipeline;

    // Execution
    pub use crate::execution::engine::{
        ExecutionEngine, ExecutionOptions, ExecutionStats, MessageLevel, NodeMessage, RunReport,
    };
    pub use crate::execution::progress::{ProgressTracker, ProgressUpdate, SkipReason};

    // Algorithms
    pub use crate::ops::{ConvolutionPreset, DiffMetrics, Dimensions, Histogram, Kernel};

    // I/O and configuration
    pub use crate::config::FlowConfig;
    pub use crate::io::{ImportFormat, ImportOptions, Imported};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "pixelflow");
    }

    #[test]
    fn test_threshold_then_histogram() {
        let mut graph = FlowGraph::new();
        let source = graph.add_node(NodeKind::Source, &[]).unwrap();
        let point = graph
            .add_node(
                NodeKind::PointOp,
                &[("operation", Value::from("threshold")), ("t", Value::from(2.0))],
            )
            .unwrap();
        let histogram = graph.add_node(NodeKind::Histogram, &[]).unwrap();
        graph.connect(source, IMAGE_PORT, point, IMAGE_PORT).unwrap();
        graph.connect(point, IMAGE_PORT, histogram, IMAGE_PORT).unwrap();

        let buffer = PixelBuffer::new(2, 2, vec![0, 1, 2, 3]).unwrap();
        graph.load_source(source, buffer).unwrap();

        assert!(ValidationPipeline::default().validate(&graph).errors.is_empty());
        let report = ExecutionEngine::new().run(&mut graph).unwrap();
        assert_eq!(report.processed, vec![source, point, histogram]);

        let counts = graph.histogram(histogram).unwrap().unwrap().counts();
        assert_eq!(counts[0], 2);
        assert_eq!(counts[255], 2);
    }

    #[test]
    fn test_difference_against_original() {
        let mut graph = FlowGraph::new();
        let source = graph.add_node(NodeKind::Source, &[]).unwrap();
        let point = graph
            .add_node(NodeKind::PointOp, &[("delta", Value::from(10.0))])
            .unwrap();
        let diff = graph.add_node(NodeKind::Difference, &[]).unwrap();
        graph.connect(source, IMAGE_PORT, point, IMAGE_PORT).unwrap();
        graph.connect(source, IMAGE_PORT, diff, DIFF_A_PORT).unwrap();
        graph.connect(point, IMAGE_PORT, diff, DIFF_B_PORT).unwrap();
        graph.load_source(source, PixelBuffer::filled(3, 3, 100).unwrap()).unwrap();

        ExecutionEngine::new().run(&mut graph).unwrap();

        let metrics = graph.metrics(diff).unwrap().unwrap();
        assert_eq!(metrics.mse, 100.0);
        let image = graph.output(diff).unwrap().unwrap();
        assert!(image.as_bytes().iter().all(|&v| v == 10));
    }

    #[test]
    fn test_export_then_reload_is_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.raw");
        // Samples in the ASCII digit range would also sniff as numeric text.
        let buffer = PixelBuffer::from_fn(4, 3, |r, c| b'0' + ((r * 4 + c) % 10) as u8).unwrap();

        let mut graph = FlowGraph::new();
        let source = graph.add_node(NodeKind::Source, &[]).unwrap();
        let sink = graph.add_node(NodeKind::Sink, &[]).unwrap();
        graph.connect(source, IMAGE_PORT, sink, IMAGE_PORT).unwrap();
        graph.load_source(source, buffer.clone()).unwrap();

        let engine = ExecutionEngine::new();
        engine.run(&mut graph).unwrap();
        graph.export_persisted(sink, &path).unwrap();

        let options = ImportOptions::new().with_dimensions(4, 3);
        let imported = graph.load_source_file(source, &path, &options).unwrap();
        assert_eq!(imported.format, ImportFormat::Raw);

        engine.run(&mut graph).unwrap();
        let persisted = graph.persisted(sink).unwrap().unwrap();
        assert_eq!(persisted.as_bytes(), buffer.as_bytes());
        assert_eq!(std::fs::read(&path).unwrap(), buffer.as_bytes());
    }
}
