//! Core types for the pixelflow processing system.
//!
//! This module contains the foundational types of the pipeline:
//! - Pixel buffers and parameter values
//! - Ports and parameter definitions
//! - Node metadata and outputs
//! - Error types
//! - The processing context

pub mod types;
pub mod port;
pub mod error;
pub mod context;
pub mod node;

// Re-export commonly used types
pub use types::{PixelBuffer, Value, ValueType};
pub use port::{Constraint, ParameterDefinition, Port, PortDirection};
pub use error::{
    BufferError, EdgeId, ExecutionError, FlowError, GraphError, ImportError, NodeError, NodeId,
    PortId,
};
pub use context::ProcessContext;
pub use node::{Category, NodeMetadata, NodeOutput};
