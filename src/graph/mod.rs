//! Graph module for managing flow graphs.
//!
//! A flow graph is a directed graph where nodes are processing steps and
//! edges carry pixel buffers from output ports to input ports. Cycles can be
//! built; they are reported by the scheduler at run time.

pub mod structure;
pub mod connection;
pub mod topology;

// Re-export commonly used types
pub use structure::{FlowGraph, GraphNode};
pub use connection::Edge;
pub use topology::TopologyAnalyzer;
