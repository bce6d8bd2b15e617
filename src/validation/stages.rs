//! Individual validation stages.
//!
//! Each stage checks for a specific category of problems.

use crate::core::error::{GraphError, ValidationError, ValidationWarning};
use crate::graph::structure::FlowGraph;
use crate::graph::topology::TopologyAnalyzer;
use crate::nodes::NodeKind;
use crate::ops::convolution::{ConvolutionPreset, Kernel};

/// Trait for validation stages.
pub trait ValidationStage: Send + Sync {
    /// Name of this validation stage.
    fn name(&self) -> &str;

    /// Validate the graph.
    ///
    /// Returns Ok with warnings, or Err with errors.
    fn validate(&self, graph: &FlowGraph) -> Result<Vec<ValidationWarning>, Vec<ValidationError>>;
}

/// Structural validation - checks graph structure.
///
/// Verifies:
/// - At least one node has no connected input
/// - No cycles
/// - Every input port is connected
pub struct StructuralValidation;

impl ValidationStage for StructuralValidation {
    fn name(&self) -> &str {
        "Structural Validation"
    }

    fn validate(&self, graph: &FlowGraph) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if graph.source_nodes().is_empty() {
            return Err(vec![ValidationError::NoSourceNode]);
        }

        let analyzer = TopologyAnalyzer::new(graph);
        if let Err(GraphError::CycleDetected { nodes }) = analyzer.topological_sort() {
            errors.push(ValidationError::CycleDetected { nodes });
        }

        for node in graph.nodes() {
            for &port_id in node.inputs() {
                let Ok(port) = graph.port(port_id) else {
                    continue;
                };
                if !port.is_connected() {
                    errors.push(ValidationError::UnconnectedInput {
                        node_id: node.id,
                        port: port.name.clone(),
                    });
                }
            }
        }

        for node_id in analyzer.unreachable_nodes() {
            warnings.push(ValidationWarning {
                message: "Node is not reachable from any source and will not run".to_string(),
                node_id: Some(node_id),
            });
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors)
        }
    }
}

/// Source validation - checks what nodes will read at run time.
///
/// Verifies:
/// - Every source has a loaded buffer
/// - Custom convolution kernels parse
pub struct SourceValidation;

impl ValidationStage for SourceValidation {
    fn name(&self) -> &str {
        "Source Validation"
    }

    fn validate(&self, graph: &FlowGraph) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for node in graph.nodes() {
            match node.kind {
                NodeKind::Source if node.loaded().is_none() => {
                    errors.push(ValidationError::SourceNotLoaded(node.id));
                }
                NodeKind::Convolution => {
                    let preset = node
                        .get_parameter("preset")
                        .and_then(|v| v.as_string())
                        .and_then(|s| s.parse::<ConvolutionPreset>().ok());
                    if preset != Some(ConvolutionPreset::Custom) {
                        continue;
                    }
                    let text = node
                        .get_parameter("kernel")
                        .and_then(|v| v.as_string())
                        .unwrap_or("");
                    match Kernel::parse(text) {
                        Ok(kernel) if kernel.sum() == 0.0 => warnings.push(ValidationWarning {
                            message: "Custom kernel sums to 0; flat regions will turn black"
                                .to_string(),
                            node_id: Some(node.id),
                        }),
                        Ok(_) => {}
                        Err(error) => errors.push(ValidationError::MalformedKernel {
                            node_id: node.id,
                            error,
                        }),
                    }
                }
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PixelBuffer, Value};
    use crate::nodes::IMAGE_PORT;

    #[test]
    fn test_structural_no_source() {
        let graph = FlowGraph::new();
        let result = StructuralValidation.validate(&graph);
        assert_eq!(result.unwrap_err(), vec![ValidationError::NoSourceNode]);
    }

    #[test]
    fn test_structural_unconnected_input() {
        let mut graph = FlowGraph::new();
        let source = graph.add_node(NodeKind::Source, &[]).unwrap();
        let median = graph.add_node(NodeKind::Median, &[]).unwrap();
        let sink = graph.add_node(NodeKind::Sink, &[]).unwrap();
        graph.connect(source, IMAGE_PORT, sink, IMAGE_PORT).unwrap();

        let errors = StructuralValidation.validate(&graph).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnconnectedInput {
                node_id: median,
                port: IMAGE_PORT.to_string(),
            }]
        );
    }

    #[test]
    fn test_source_stage() {
        let mut graph = FlowGraph::new();
        let source = graph.add_node(NodeKind::Source, &[]).unwrap();
        let conv = graph
            .add_node(
                NodeKind::Convolution,
                &[
                    ("preset", Value::from("custom")),
                    ("kernel", Value::from("1 2\n3")),
                ],
            )
            .unwrap();

        let errors = SourceValidation.validate(&graph).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], ValidationError::SourceNotLoaded(source));
        assert!(matches!(
            &errors[1],
            ValidationError::MalformedKernel { node_id, .. } if *node_id == conv
        ));

        graph.load_source(source, PixelBuffer::filled(1, 1, 0).unwrap()).unwrap();
        graph.set_parameter(conv, "kernel", "0 1 0\n1 -4 1\n0 1 0").unwrap();
        let warnings = SourceValidation.validate(&graph).unwrap();
        assert_eq!(warnings.len(), 1);
    }
}
