//! Validation pipeline implementation.

use crate::core::error::ValidationReport;
use crate::graph::structure::FlowGraph;
use crate::validation::stages::{SourceValidation, StructuralValidation, ValidationStage};

/// Multi-stage validation pipeline.
///
/// Runs a series of validation stages on a graph before a run. The report
/// is advisory: the scheduler does not consult it.
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
}

impl ValidationPipeline {
    /// Create a new pipeline with the given stages.
    pub fn new(stages: Vec<Box<dyn ValidationStage>>) -> Self {
        Self { stages }
    }

    /// Create the default validation pipeline with all standard stages.
    pub fn default_pipeline() -> Self {
        Self {
            stages: vec![Box::new(StructuralValidation), Box::new(SourceValidation)],
        }
    }

    /// Add a custom validation stage.
    pub fn add_stage(&mut self, stage: Box<dyn ValidationStage>) {
        self.stages.push(stage);
    }

    /// Names of the configured stages, in run order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage and collect the findings.
    ///
    /// A fatal finding (no source node) ends validation early.
    pub fn validate(&self, graph: &FlowGraph) -> ValidationReport {
        let mut report = ValidationReport::new();

        for stage in &self.stages {
            let findings = stage.validate(graph);
            log::debug!(
                "{}: {}",
                stage.name(),
                match &findings {
                    Ok(warnings) => format!("{} warning(s)", warnings.len()),
                    Err(errors) => format!("{} error(s)", errors.len()),
                }
            );

            let errors = match findings {
                Ok(warnings) => {
                    warnings.into_iter().for_each(|w| report.add_warning(w));
                    continue;
                }
                Err(errors) => errors,
            };
            for error in errors {
                report.add_error(error);
            }
            if !report.can_execute() {
                break;
            }
        }

        report
    }

    /// Whether the graph has a node the scheduler can start from.
    pub fn can_execute(&self, graph: &FlowGraph) -> bool {
        self.validate(graph).can_execute()
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PixelBuffer;
    use crate::nodes::{NodeKind, IMAGE_PORT};

    #[test]
    fn test_empty_graph_cannot_execute() {
        let report = ValidationPipeline::default_pipeline().validate(&FlowGraph::new());
        assert!(!report.can_execute());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_stage_order() {
        let pipeline = ValidationPipeline::default();
        assert_eq!(
            pipeline.stage_names(),
            vec!["Structural Validation", "Source Validation"]
        );
        assert!(ValidationPipeline::new(Vec::new()).can_execute(&FlowGraph::new()));
    }

    #[test]
    fn test_valid_simple_graph() {
        let mut graph = FlowGraph::new();
        let source = graph.add_node(NodeKind::Source, &[]).unwrap();
        let sink = graph.add_node(NodeKind::Sink, &[]).unwrap();
        graph.connect(source, IMAGE_PORT, sink, IMAGE_PORT).unwrap();
        graph.load_source(source, PixelBuffer::filled(2, 2, 3).unwrap()).unwrap();

        let report = ValidationPipeline::default().validate(&graph);
        assert!(report.can_execute());
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_issues_do_not_block_execution() {
        let mut graph = FlowGraph::new();
        graph.add_node(NodeKind::Source, &[]).unwrap();
        let report = ValidationPipeline::default().validate(&graph);
        assert!(report.can_execute());
        assert_eq!(report.errors.len(), 1);
    }
}
