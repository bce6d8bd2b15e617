//! Node metadata and processing results.
//!
//! Behaviour lives on [`NodeKind`](crate::nodes::NodeKind); this module holds
//! the data that describes a kind to the editing collaborator and the results
//! a node caches after it has been processed.

use crate::core::port::ParameterDefinition;
use crate::core::types::PixelBuffer;
use crate::ops::histogram::Histogram;
use crate::ops::metrics::DiffMetrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Category for organizing node kinds in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Nodes that introduce buffers (file loads)
    Input,
    /// Nodes that persist or display buffers
    Output,
    /// Per-pixel adjustments
    Adjust,
    /// Neighbourhood filters
    Filter,
    /// Analysis and measurement
    Analyze,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Input => "Input",
            Category::Output => "Output",
            Category::Adjust => "Adjust",
            Category::Filter => "Filter",
            Category::Analyze => "Analyze",
        }
    }
}

/// Metadata describing a node kind.
///
/// Contains everything the editing collaborator needs to draw the node,
/// offer its ports for wiring and build its property panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Unique identifier for this kind (e.g., "point_op")
    pub id: String,
    /// Human-readable name (e.g., "Point Operation")
    pub name: String,
    /// Category for UI organization
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Input port names, in port order
    pub inputs: Vec<String>,
    /// Output port names, in port order
    pub outputs: Vec<String>,
    /// Parameter definitions
    pub parameters: Vec<ParameterDefinition>,
}

impl NodeMetadata {
    /// Create a new metadata builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> NodeMetadataBuilder {
        NodeMetadataBuilder::new(id, name)
    }

    /// Find a parameter by name.
    pub fn get_parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Builder for NodeMetadata.
pub struct NodeMetadataBuilder {
    id: String,
    name: String,
    category: Category,
    description: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    parameters: Vec<ParameterDefinition>,
}

impl NodeMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Category::Adjust,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an input port.
    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    /// Add an output port.
    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, param: ParameterDefinition) -> Self {
        self.parameters.push(param);
        self
    }

    /// Build the metadata.
    pub fn build(self) -> NodeMetadata {
        NodeMetadata {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            inputs: self.inputs,
            outputs: self.outputs,
            parameters: self.parameters,
        }
    }
}

/// Everything a node produces when it is processed.
///
/// All fields are absent until the node's first successful processing and
/// are cleared at the start of every run.
#[derive(Debug, Clone, Default)]
pub struct NodeOutput {
    /// Buffer exposed on the node's output port.
    pub image: Option<Arc<PixelBuffer>>,
    /// Buffer a sink holds for export.
    pub persisted: Option<Arc<PixelBuffer>>,
    /// Bin counts computed by a histogram node.
    pub histogram: Option<Histogram>,
    /// Fidelity metrics computed by a difference node.
    pub metrics: Option<DiffMetrics>,
}

impl NodeOutput {
    /// Output carrying only an image.
    pub fn image(image: Arc<PixelBuffer>) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    /// Attach a persisted buffer.
    pub fn with_persisted(mut self, persisted: Arc<PixelBuffer>) -> Self {
        self.persisted = Some(persisted);
        self
    }

    /// Attach a histogram.
    pub fn with_histogram(mut self, histogram: Histogram) -> Self {
        self.histogram = Some(histogram);
        self
    }

    /// Attach difference metrics.
    pub fn with_metrics(mut self, metrics: DiffMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// True when nothing was produced.
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
            && self.persisted.is_none()
            && self.histogram.is_none()
            && self.metrics.is_none()
    }
}
