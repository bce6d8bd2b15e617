//! Edge type for the graph.

use crate::core::error::{EdgeId, PortId};
use serde::{Deserialize, Serialize};

/// A connection from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier for this edge.
    pub id: EdgeId,
    /// Producing output port.
    pub source: PortId,
    /// Consuming input port.
    pub target: PortId,
}

impl Edge {
    /// Create a new edge.
    pub fn new(source: PortId, target: PortId) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
        }
    }

    /// Whether the edge touches `port` at either end.
    pub fn touches(&self, port: PortId) -> bool {
        self.source == port || self.target == port
    }
}
