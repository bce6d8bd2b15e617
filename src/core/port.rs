//! Ports and parameter definitions.
//!
//! Ports are the connection points of a node. Every port carries a
//! [`PixelBuffer`](crate::core::types::PixelBuffer), so a port is typed by its
//! direction alone. Parameters are configured by the editing collaborator
//! rather than connected to other nodes.

use crate::core::error::{EdgeId, NodeId, PortId};
use crate::core::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a port (input or output).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// A port instance in the graph arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Unique identifier.
    pub id: PortId,
    /// Node that owns this port.
    pub node_id: NodeId,
    /// Direction (input or output).
    pub direction: PortDirection,
    /// Name within the owning node (e.g. "image", "a").
    pub name: String,
    /// Connected edges, in connection order. Inputs hold at most one.
    pub(crate) edges: Vec<EdgeId>,
}

impl Port {
    pub(crate) fn new(node_id: NodeId, direction: PortDirection, name: impl Into<String>) -> Self {
        Self {
            id: PortId::new(),
            node_id,
            direction,
            name: name.into(),
            edges: Vec::new(),
        }
    }

    /// Edges attached to this port.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Whether any edge is attached.
    pub fn is_connected(&self) -> bool {
        !self.edges.is_empty()
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }
}

/// Definition of a node parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Unique name within the node
    pub name: String,
    /// Type of the parameter
    pub param_type: ValueType,
    /// Default value
    pub default_value: Value,
    /// Description for documentation
    pub description: String,
    /// Constraints checked when the parameter is set
    pub constraints: Vec<Constraint>,
}

impl ParameterDefinition {
    /// Create a new parameter definition.
    pub fn new(name: impl Into<String>, param_type: ValueType, default_value: Value) -> Self {
        Self {
            name: name.into(),
            param_type,
            default_value,
            description: String::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Check a candidate value against the type and every constraint.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if !self.param_type.accepts(value) {
            return Err(format!(
                "expected {}, got {}",
                self.param_type,
                value.value_type()
            ));
        }
        for constraint in &self.constraints {
            constraint.validate(value)?;
        }
        Ok(())
    }
}

/// Constraints that can be applied to parameter values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "params")]
pub enum Constraint {
    /// Numeric value must be within range [min, max]
    Range { min: f64, max: f64 },
    /// Numeric value must be >= min
    MinValue(f64),
    /// String value must be one of the options (case-insensitive)
    OneOf(Vec<String>),
}

impl Constraint {
    /// Validate a value against this constraint.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            Constraint::Range { min, max } => match value.as_float() {
                Some(v) if v >= *min && v <= *max => Ok(()),
                Some(v) => Err(format!("{} is outside [{}, {}]", v, min, max)),
                None => Err("expected a number".to_string()),
            },
            Constraint::MinValue(min) => match value.as_float() {
                Some(v) if v >= *min => Ok(()),
                Some(v) => Err(format!("{} is below {}", v, min)),
                None => Err("expected a number".to_string()),
            },
            Constraint::OneOf(options) => {
                let candidate = value.as_string().ok_or("expected a string")?;
                if options.iter().any(|o| o.eq_ignore_ascii_case(candidate)) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not one of {:?}", candidate, options))
                }
            }
        }
    }
}
