//! Error types for pixelflow.
//!
//! Uses thiserror for structured errors with context. Errors fall into three
//! groups that the caller treats differently:
//! - Model errors ([`GraphError`]) reject a single mutation of the graph.
//! - Local errors ([`NodeError`], [`ImportError`]) are reported for one node
//!   while the rest of the run continues.
//! - Run-fatal errors ([`ExecutionError`]) abort the whole run.

use crate::core::port::PortDirection;
use crate::core::types::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from a UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.0.to_string()[..8])
            }
        }
    };
}

opaque_id!(
    /// Unique identifier for a node in the graph.
    NodeId
);

opaque_id!(
    /// Unique identifier for a port owned by a node.
    PortId
);

opaque_id!(
    /// Unique identifier for an edge between two ports.
    EdgeId
);

/// Top-level error type for pixelflow.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("{0}")]
    Other(String),
}

/// Errors related to graph structure and mutation.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Port {0} not found")]
    PortNotFound(PortId),

    #[error("Port '{port}' not found on node {node_id}")]
    NamedPortNotFound { node_id: NodeId, port: String },

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Cannot connect port {0} to itself")]
    SamePort(PortId),

    #[error("Cannot connect two {direction} ports")]
    DirectionMismatch { direction: PortDirection },

    #[error("Input port {port} is already connected by edge {edge}; remove it first")]
    InputOccupied { port: PortId, edge: EdgeId },

    #[error("Cycle detected in graph involving nodes: {nodes:?}")]
    CycleDetected { nodes: Vec<NodeId> },

    #[error("Node kind '{kind}' has no parameter '{parameter}'")]
    UnknownParameter { kind: String, parameter: String },

    #[error("Parameter '{parameter}' expects {expected}, got {got}")]
    ParameterType {
        parameter: String,
        expected: ValueType,
        got: ValueType,
    },

    #[error("Parameter '{parameter}' rejected: {error}")]
    ParameterConstraint { parameter: String, error: String },

    #[error("Node {0} is not a source node")]
    NotASource(NodeId),

    #[error("Node {0} has no persisted data to export")]
    NothingToExport(NodeId),
}

/// Local errors raised while a single node processes.
///
/// These never abort a run: the node's output becomes absent and the
/// scheduler moves on.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeError {
    #[error("Missing input '{port}' for node {node_id}")]
    MissingInput { node_id: NodeId, port: String },

    #[error("Source node {0} has no loaded buffer")]
    NoBufferLoaded(NodeId),

    #[error("Invalid parameter '{parameter}' on node {node_id}: {error}")]
    InvalidParameter {
        node_id: NodeId,
        parameter: String,
        error: String,
    },

    #[error("Node {node_id} processing failed: {error}")]
    Processing { node_id: NodeId, error: String },
}

/// Run-fatal errors. The run stops; nodes already processed keep their output.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionError {
    /// No node has an empty dependency map. In a non-empty graph this means
    /// every node sits downstream of another, so the graph contains a cycle.
    #[error("No source node found")]
    NoSourceNode,

    #[error("Cycle or unsatisfiable dependency after {iterations} iterations; {} node(s) pending", pending.len())]
    Unsatisfiable {
        pending: Vec<NodeId>,
        processed: Vec<NodeId>,
        iterations: usize,
    },
}

impl ExecutionError {
    /// Nodes that finished processing before the run was aborted.
    pub fn processed(&self) -> &[NodeId] {
        match self {
            ExecutionError::NoSourceNode => &[],
            ExecutionError::Unsatisfiable { processed, .. } => processed,
        }
    }
}

/// Errors constructing a [`PixelBuffer`](crate::core::types::PixelBuffer).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferError {
    #[error("Buffer dimensions must be non-zero, got {width}x{height}")]
    Empty { width: usize, height: usize },

    #[error("Buffer of {width}x{height} needs {expected} samples, got {actual}")]
    LengthMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(usize),
}

/// Errors parsing a convolution kernel from text.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelError {
    #[error("Kernel has no rows")]
    Empty,

    #[error("Kernel row {row} has {found} values, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Kernel value '{0}' is not a number")]
    InvalidNumber(String),
}

/// Errors loading an external buffer into a source node.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Declared size {width}x{height} needs {expected} bytes, file has {actual}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Input contains no samples")]
    Empty,

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Findings of the advisory pre-run validation.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("No source node found")]
    NoSourceNode,

    #[error("Graph contains a cycle through nodes: {nodes:?}")]
    CycleDetected { nodes: Vec<NodeId> },

    #[error("Input '{port}' on node {node_id} is not connected")]
    UnconnectedInput { node_id: NodeId, port: String },

    #[error("Source node {0} has no loaded buffer")]
    SourceNotLoaded(NodeId),

    #[error("Custom kernel on node {node_id} is malformed: {error}")]
    MalformedKernel { node_id: NodeId, error: KernelError },
}

// ============================================================================
// Error Utilities
// ============================================================================

impl ValidationError {
    /// Check if this finding guarantees the next run will abort.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValidationError::NoSourceNode)
    }

    /// Get suggestion for fixing this finding.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ValidationError::NoSourceNode => {
                Some("Add a Source node with no connected inputs".to_string())
            }
            ValidationError::CycleDetected { .. } => {
                Some("Remove one of the edges that feeds a node back into itself".to_string())
            }
            ValidationError::UnconnectedInput { port, .. } => {
                Some(format!("Connect an output to the '{}' input", port))
            }
            ValidationError::SourceNotLoaded(_) => {
                Some("Load a raw, text or image file into the source".to_string())
            }
            ValidationError::MalformedKernel { .. } => {
                Some("Write one kernel row per line with the same number of values".to_string())
            }
        }
    }

    /// Get list of affected node IDs.
    pub fn affected_nodes(&self) -> Vec<NodeId> {
        match self {
            ValidationError::UnconnectedInput { node_id, .. }
            | ValidationError::MalformedKernel { node_id, .. }
            | ValidationError::SourceNotLoaded(node_id) => vec![*node_id],
            ValidationError::CycleDetected { nodes } => nodes.clone(),
            ValidationError::NoSourceNode => vec![],
        }
    }
}

impl NodeError {
    /// Get the node ID that caused this error.
    pub fn node_id(&self) -> NodeId {
        match self {
            NodeError::MissingInput { node_id, .. }
            | NodeError::InvalidParameter { node_id, .. }
            | NodeError::Processing { node_id, .. }
            | NodeError::NoBufferLoaded(node_id) => *node_id,
        }
    }
}

/// Result type alias for pixelflow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for node processing.
pub type NodeResult<T> = Result<T, NodeError>;

/// Result type alias for imports.
pub type ImportResult<T> = Result<T, ImportError>;

// ============================================================================
// Validation Report
// ============================================================================

/// Comprehensive validation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether no fatal finding was recorded.
    pub success: bool,
    /// Findings that will make nodes fail or the run abort.
    pub errors: Vec<ValidationError>,
    /// Non-fatal issues.
    pub warnings: Vec<ValidationWarning>,
}

/// Non-fatal validation warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    /// Warning message.
    pub message: String,
    /// Node that triggered the warning, if applicable.
    pub node_id: Option<NodeId>,
}

impl ValidationReport {
    /// Create a new empty report (success).
    pub fn new() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error to the report.
    pub fn add_error(&mut self, error: ValidationError) {
        if error.is_fatal() {
            self.success = false;
        }
        self.errors.push(error);
    }

    /// Add a warning to the report.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Check if a run is expected to get past scheduling.
    pub fn can_execute(&self) -> bool {
        self.success
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        match (self.success, self.errors.len(), self.warnings.len()) {
            (true, 0, 0) => "Graph is valid and ready to run".to_string(),
            (true, errors, warnings) => format!(
                "Graph can run with {} issue(s) and {} warning(s)",
                errors, warnings
            ),
            (false, errors, _) => format!("Graph cannot run: {} issue(s)", errors),
        }
    }

    /// Get detailed error messages with suggestions.
    pub fn detailed_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .enumerate()
            .map(|(i, error)| {
                let mut msg = format!("{}. {}", i + 1, error);
                if let Some(fix) = error.suggested_fix() {
                    msg.push_str(&format!("\n   -> Suggestion: {}", fix));
                }
                msg
            })
            .collect()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}
