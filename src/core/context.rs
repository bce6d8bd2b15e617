//! Processing context.
//!
//! The context gives a node kind access to its upstream buffers, its
//! parameters and (for sources) the externally loaded buffer. It also
//! collects notices: recoverable problems the node worked around, which the
//! engine forwards to the editing collaborator.

use crate::core::error::{NodeError, NodeId};
use crate::core::types::{PixelBuffer, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Context provided while a node processes.
#[derive(Debug, Clone)]
pub struct ProcessContext {
    /// ID of the node being processed.
    pub node_id: NodeId,
    /// Upstream buffers by input port name; `None` when the port is
    /// unconnected or its producer has no output.
    inputs: IndexMap<String, Option<Arc<PixelBuffer>>>,
    /// Parameter values.
    parameters: IndexMap<String, Value>,
    /// Externally loaded buffer (sources only).
    loaded: Option<Arc<PixelBuffer>>,
    /// Recoverable problems reported by the node.
    notices: Vec<String>,
}

impl ProcessContext {
    /// Create a new, empty context.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            inputs: IndexMap::new(),
            parameters: IndexMap::new(),
            loaded: None,
            notices: Vec::new(),
        }
    }

    /// Add an input buffer slot to the context.
    pub fn add_input(&mut self, name: impl Into<String>, buffer: Option<Arc<PixelBuffer>>) {
        self.inputs.insert(name.into(), buffer);
    }

    /// Add a parameter value to the context.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: Value) {
        self.parameters.insert(name.into(), value);
    }

    /// Set the externally loaded buffer.
    pub fn set_loaded(&mut self, buffer: Option<Arc<PixelBuffer>>) {
        self.loaded = buffer;
    }

    /// Builder-style variant of [`add_input`](Self::add_input).
    pub fn with_input(mut self, name: impl Into<String>, buffer: Arc<PixelBuffer>) -> Self {
        self.add_input(name, Some(buffer));
        self
    }

    /// Builder-style variant of [`add_parameter`](Self::add_parameter).
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_parameter(name, value.into());
        self
    }

    // ========================================================================
    // Input Getters
    // ========================================================================

    /// Get an input buffer by port name.
    pub fn input(&self, name: &str) -> Result<&Arc<PixelBuffer>, NodeError> {
        self.input_optional(name).ok_or_else(|| NodeError::MissingInput {
            node_id: self.node_id,
            port: name.to_string(),
        })
    }

    /// Get an input buffer if present.
    pub fn input_optional(&self, name: &str) -> Option<&Arc<PixelBuffer>> {
        self.inputs.get(name).and_then(|slot| slot.as_ref())
    }

    /// Get the externally loaded buffer.
    pub fn loaded(&self) -> Result<&Arc<PixelBuffer>, NodeError> {
        self.loaded
            .as_ref()
            .ok_or(NodeError::NoBufferLoaded(self.node_id))
    }

    // ========================================================================
    // Parameter Getters
    // ========================================================================

    /// Get a parameter value by name.
    pub fn get_parameter(&self, name: &str) -> Result<&Value, NodeError> {
        self.parameters
            .get(name)
            .ok_or_else(|| self.invalid(name, "parameter not set"))
    }

    /// Get a parameter as an integer.
    pub fn get_integer(&self, name: &str) -> Result<i64, NodeError> {
        self.get_parameter(name)?
            .as_integer()
            .ok_or_else(|| self.invalid(name, "not an integer"))
    }

    /// Get a parameter as a float.
    pub fn get_float(&self, name: &str) -> Result<f64, NodeError> {
        self.get_parameter(name)?
            .as_float()
            .ok_or_else(|| self.invalid(name, "not a number"))
    }

    /// Get a parameter as a string.
    pub fn get_string(&self, name: &str) -> Result<&str, NodeError> {
        self.get_parameter(name)?
            .as_string()
            .ok_or_else(|| self.invalid(name, "not a string"))
    }

    /// Build an [`NodeError::InvalidParameter`] for this node.
    pub fn invalid(&self, parameter: &str, error: impl Into<String>) -> NodeError {
        NodeError::InvalidParameter {
            node_id: self.node_id,
            parameter: parameter.to_string(),
            error: error.into(),
        }
    }

    // ========================================================================
    // Notices
    // ========================================================================

    /// Record a recoverable problem.
    pub fn notice(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }

    /// Take all recorded notices.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }
}
