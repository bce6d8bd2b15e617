//! Execution engine implementation.
//!
//! The engine walks a flow graph with a work queue: nodes without connected
//! inputs seed the queue, a node is processed once every node it depends on
//! has been processed, and its consumers are queued behind it. A node that is
//! not ready goes to the back of the queue. An iteration budget proportional
//! to the node count bounds the walk, so a cycle reachable from a source ends
//! the run instead of spinning forever.

use crate::core::context::ProcessContext;
use crate::core::error::{ExecutionError, NodeId};
use crate::execution::progress::{ProgressCallback, ProgressTracker, ProgressUpdate, SkipReason};
use crate::graph::structure::FlowGraph;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

/// Default iterations allowed per node.
pub const DEFAULT_BUDGET_FACTOR: usize = 4;

/// Execution options.
#[derive(Clone)]
pub struct ExecutionOptions {
    /// Queue iterations allowed per node in the graph.
    pub budget_factor: usize,
    /// Progress callback.
    pub progress_callback: Option<Arc<ProgressCallback>>,
}

impl std::fmt::Debug for ExecutionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("budget_factor", &self.budget_factor)
            .field("progress_callback", &self.progress_callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            budget_factor: DEFAULT_BUDGET_FACTOR,
            progress_callback: None,
        }
    }
}

impl ExecutionOptions {
    /// Create a new options builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration budget per node.
    pub fn with_budget_factor(mut self, factor: usize) -> Self {
        self.budget_factor = factor;
        self
    }

    /// Set progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }
}

/// Severity of a per-node message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    /// The node worked around a problem and still produced output.
    Warning,
    /// The node failed; its output is absent.
    Error,
}

/// A problem reported for one node during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMessage {
    pub node_id: NodeId,
    pub level: MessageLevel,
    pub message: String,
}

/// Run statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionStats {
    /// Wall-clock duration of the run.
    pub total_duration_ms: u64,
    /// Queue iterations used.
    pub iterations: usize,
    /// Iterations available.
    pub budget: usize,
    /// Times a node was put back because a dependency was pending.
    pub deferrals: usize,
    /// Nodes that failed locally.
    pub nodes_failed: usize,
}

/// Outcome of a run that was not aborted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Nodes in the order they were processed.
    pub processed: Vec<NodeId>,
    /// Local errors and warnings, in the order they occurred.
    pub messages: Vec<NodeMessage>,
    /// Nodes never reached from a dependency-free node.
    pub unprocessed: Vec<NodeId>,
    /// Execution statistics.
    pub stats: ExecutionStats,
}

impl RunReport {
    /// Whether any node failed.
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.level == MessageLevel::Error)
    }

    /// Messages recorded for one node.
    pub fn messages_for(&self, node_id: NodeId) -> impl Iterator<Item = &NodeMessage> {
        self.messages.iter().filter(move |m| m.node_id == node_id)
    }
}

/// The execution engine.
#[derive(Debug, Default)]
pub struct ExecutionEngine {
    /// Default execution options.
    default_options: ExecutionOptions,
}

impl ExecutionEngine {
    /// Create a new execution engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set default options.
    pub fn with_default_options(mut self, options: ExecutionOptions) -> Self {
        self.default_options = options;
        self
    }

    /// Run the whole graph with the default options.
    pub fn run(&self, graph: &mut FlowGraph) -> Result<RunReport, ExecutionError> {
        self.run_with(graph, &self.default_options)
    }

    /// Run the whole graph.
    ///
    /// Every node's cached output is cleared first. Local node failures are
    /// collected in the report; a graph with no dependency-free node, or a
    /// walk that exhausts its iteration budget, aborts the run. Nodes
    /// processed before an abort keep their output.
    pub fn run_with(
        &self,
        graph: &mut FlowGraph,
        options: &ExecutionOptions,
    ) -> Result<RunReport, ExecutionError> {
        let start_time = Instant::now();
        graph.clear_outputs();

        let mut tracker = ProgressTracker::new(graph.node_count());
        if let Some(callback) = &options.progress_callback {
            tracker = tracker.with_shared_callback(callback.clone());
        }
        tracker.start();

        let seeds = graph.source_nodes();
        if seeds.is_empty() {
            let error = ExecutionError::NoSourceNode;
            log::error!("Run aborted: {}", error);
            tracker.abort(error.to_string());
            return Err(error);
        }

        let budget = options.budget_factor.saturating_mul(graph.node_count());
        let mut report = RunReport::default();
        report.stats.budget = budget;

        let mut queue: VecDeque<NodeId> = seeds.into();
        let mut processed: HashSet<NodeId> = HashSet::new();
        let mut iterations = 0;

        log::info!(
            "Running {} node(s) from {} seed(s), budget {}",
            graph.node_count(),
            queue.len(),
            budget
        );

        while !queue.is_empty() && iterations < budget {
            iterations += 1;
            let Some(node_id) = queue.pop_front() else {
                break;
            };
            if processed.contains(&node_id) {
                continue;
            }

            let ready = match graph.dependencies(node_id) {
                Ok(deps) => deps.values().all(|dep| processed.contains(dep)),
                Err(_) => continue,
            };
            if !ready {
                log::debug!("Deferring node {}: dependencies pending", node_id);
                report.stats.deferrals += 1;
                tracker.node_deferred(node_id);
                queue.push_back(node_id);
                continue;
            }

            self.process_node(graph, node_id, &tracker, &mut report);
            processed.insert(node_id);
            report.processed.push(node_id);

            if let Ok(consumers) = graph.downstream_nodes(node_id) {
                for consumer in consumers {
                    if !processed.contains(&consumer) {
                        queue.push_back(consumer);
                    }
                }
            }
        }

        report.stats.iterations = iterations;

        if !queue.is_empty() {
            let mut seen = HashSet::new();
            let pending: Vec<NodeId> = queue
                .into_iter()
                .filter(|id| !processed.contains(id) && seen.insert(*id))
                .collect();
            let error = ExecutionError::Unsatisfiable {
                pending,
                processed: report.processed,
                iterations,
            };
            log::error!("Run aborted: {}", error);
            tracker.abort(error.to_string());
            return Err(error);
        }

        report.unprocessed = graph
            .node_ids()
            .filter(|id| !processed.contains(id))
            .collect();
        for &node_id in &report.unprocessed {
            log::warn!("Node {} was not reached from any source", node_id);
            tracker.node_skipped(node_id, SkipReason::Unreachable);
        }

        report.stats.total_duration_ms = start_time.elapsed().as_millis() as u64;
        log::info!(
            "Run finished: {} processed, {} failed, {} unreached in {} iteration(s)",
            report.processed.len(),
            report.stats.nodes_failed,
            report.unprocessed.len(),
            iterations
        );
        tracker.complete();
        Ok(report)
    }

    /// Process a single node and store its output on the graph.
    fn process_node(
        &self,
        graph: &mut FlowGraph,
        node_id: NodeId,
        tracker: &ProgressTracker,
        report: &mut RunReport,
    ) {
        let Ok(node) = graph.node(node_id) else {
            return;
        };
        let kind = node.kind;
        tracker.node_started(node_id, node.display_name());

        let mut ctx = ProcessContext::new(node_id);
        for &port_id in node.inputs() {
            if let Ok(port) = graph.port(port_id) {
                ctx.add_input(port.name.clone(), graph.incoming(port_id));
            }
        }
        for (name, value) in node.parameters() {
            ctx.add_parameter(name.clone(), value.clone());
        }
        ctx.set_loaded(node.loaded().cloned());

        let exec_start = Instant::now();
        let result = kind.process(&mut ctx);
        let duration = exec_start.elapsed();

        for notice in ctx.take_notices() {
            log::warn!("Node {} ({}): {}", node_id, kind, notice);
            report.messages.push(NodeMessage {
                node_id,
                level: MessageLevel::Warning,
                message: notice,
            });
        }

        match result {
            Ok(output) => {
                log::debug!("Processed {} node {} in {:?}", kind, node_id, duration);
                graph.set_output(node_id, output);
            }
            Err(error) => {
                log::warn!("Node {} ({}) failed: {}", node_id, kind, error);
                report.stats.nodes_failed += 1;
                tracker.node_failed(node_id, error.to_string());
                report.messages.push(NodeMessage {
                    node_id,
                    level: MessageLevel::Error,
                    message: error.to_string(),
                });
            }
        }
        tracker.node_completed(node_id, duration.as_millis() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PixelBuffer, Value};
    use crate::nodes::{NodeKind, DIFF_A_PORT, DIFF_B_PORT, IMAGE_PORT};
    use parking_lot::Mutex;

    fn loaded_source(graph: &mut FlowGraph, buffer: PixelBuffer) -> NodeId {
        let id = graph.add_node(NodeKind::Source, &[]).unwrap();
        graph.load_source(id, buffer).unwrap();
        id
    }

    #[test]
    fn test_empty_graph_has_no_source() {
        let engine = ExecutionEngine::new();
        let mut graph = FlowGraph::new();
        assert_eq!(engine.run(&mut graph).unwrap_err(), ExecutionError::NoSourceNode);
    }

    #[test]
    fn test_linear_pipeline() {
        let engine = ExecutionEngine::new();
        let mut graph = FlowGraph::new();
        let source = loaded_source(&mut graph, PixelBuffer::new(3, 1, vec![10, 128, 200]).unwrap());
        let point = graph
            .add_node(NodeKind::PointOp, &[("operation", Value::from("threshold"))])
            .unwrap();
        let sink = graph.add_node(NodeKind::Sink, &[]).unwrap();
        graph.connect(source, IMAGE_PORT, point, IMAGE_PORT).unwrap();
        graph.connect(point, IMAGE_PORT, sink, IMAGE_PORT).unwrap();

        let report = engine.run(&mut graph).unwrap();
        assert_eq!(report.processed, vec![source, point, sink]);
        assert!(report.messages.is_empty());
        assert!(report.unprocessed.is_empty());
        assert_eq!(
            graph.persisted(sink).unwrap().unwrap().as_bytes(),
            &[0, 255, 255]
        );
    }

    #[test]
    fn test_mutual_dependency_is_fatal() {
        let engine = ExecutionEngine::new();
        let mut graph = FlowGraph::new();
        let a = graph.add_node(NodeKind::Median, &[]).unwrap();
        let b = graph.add_node(NodeKind::Median, &[]).unwrap();
        graph.connect(a, IMAGE_PORT, b, IMAGE_PORT).unwrap();
        graph.connect(b, IMAGE_PORT, a, IMAGE_PORT).unwrap();

        assert_eq!(engine.run(&mut graph).unwrap_err(), ExecutionError::NoSourceNode);
        assert!(graph.output(a).unwrap().is_none());
        assert!(graph.output(b).unwrap().is_none());
    }

    #[test]
    fn test_reachable_cycle_exhausts_budget() {
        let engine = ExecutionEngine::new();
        let mut graph = FlowGraph::new();
        let source = loaded_source(&mut graph, PixelBuffer::filled(2, 2, 5).unwrap());
        let diff = graph.add_node(NodeKind::Difference, &[]).unwrap();
        graph.connect(source, IMAGE_PORT, diff, DIFF_A_PORT).unwrap();
        graph.connect(diff, IMAGE_PORT, diff, DIFF_B_PORT).unwrap();

        match engine.run(&mut graph) {
            Err(ExecutionError::Unsatisfiable {
                pending,
                processed,
                iterations,
            }) => {
                assert_eq!(pending, vec![diff]);
                assert_eq!(processed, vec![source]);
                assert_eq!(iterations, 8);
            }
            other => panic!("expected Unsatisfiable, got {:?}", other),
        }
        // The source finished before the abort and keeps its output.
        assert!(graph.output(source).unwrap().is_some());
        assert!(graph.output(diff).unwrap().is_none());
    }

    #[test]
    fn test_local_error_propagates_absence() {
        let engine = ExecutionEngine::new();
        let mut graph = FlowGraph::new();
        let source = graph.add_node(NodeKind::Source, &[]).unwrap();
        let sink = graph.add_node(NodeKind::Sink, &[]).unwrap();
        graph.connect(source, IMAGE_PORT, sink, IMAGE_PORT).unwrap();

        let report = engine.run(&mut graph).unwrap();
        assert_eq!(report.processed.len(), 2);
        assert_eq!(report.stats.nodes_failed, 2);
        assert!(report.has_errors());
        assert!(graph.persisted(sink).unwrap().is_none());
    }

    #[test]
    fn test_difference_waits_for_both_inputs() {
        let engine = ExecutionEngine::new();
        let mut graph = FlowGraph::new();
        let source = loaded_source(&mut graph, PixelBuffer::from_fn(4, 4, |r, c| (r * 4 + c) as u8 * 10).unwrap());
        let blur = graph.add_node(NodeKind::Convolution, &[]).unwrap();
        let diff = graph.add_node(NodeKind::Difference, &[]).unwrap();
        graph.connect(source, IMAGE_PORT, diff, DIFF_A_PORT).unwrap();
        graph.connect(source, IMAGE_PORT, blur, IMAGE_PORT).unwrap();
        graph.connect(blur, IMAGE_PORT, diff, DIFF_B_PORT).unwrap();

        let report = engine.run(&mut graph).unwrap();
        let position = |id| report.processed.iter().position(|&n| n == id).unwrap();
        assert!(position(blur) < position(diff));
        let metrics = graph.metrics(diff).unwrap().unwrap();
        assert!(metrics.mse > 0.0);
    }

    #[test]
    fn test_unreached_cycle_is_not_fatal() {
        let engine = ExecutionEngine::new();
        let mut graph = FlowGraph::new();
        let source = loaded_source(&mut graph, PixelBuffer::filled(1, 1, 1).unwrap());
        let a = graph.add_node(NodeKind::Median, &[]).unwrap();
        let b = graph.add_node(NodeKind::Median, &[]).unwrap();
        graph.connect(a, IMAGE_PORT, b, IMAGE_PORT).unwrap();
        graph.connect(b, IMAGE_PORT, a, IMAGE_PORT).unwrap();

        let report = engine.run(&mut graph).unwrap();
        assert_eq!(report.processed, vec![source]);
        assert_eq!(report.unprocessed, vec![a, b]);
    }

    #[test]
    fn test_outputs_cleared_between_runs() {
        let engine = ExecutionEngine::new();
        let mut graph = FlowGraph::new();
        let source = loaded_source(&mut graph, PixelBuffer::filled(2, 2, 50).unwrap());
        let display = graph.add_node(NodeKind::Display, &[]).unwrap();
        let edge = graph.connect(source, IMAGE_PORT, display, IMAGE_PORT).unwrap();

        engine.run(&mut graph).unwrap();
        assert!(graph.output(display).unwrap().is_some());

        graph.remove_edge(edge).unwrap();
        let report = engine.run(&mut graph).unwrap();
        assert!(graph.output(display).unwrap().is_none());
        assert_eq!(report.messages_for(display).count(), 1);
    }

    #[test]
    fn test_progress_reports_abort_once() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let options = ExecutionOptions::new().with_progress(move |update| sink.lock().push(update));

        let mut graph = FlowGraph::new();
        let result = ExecutionEngine::new().run_with(&mut graph, &options);
        assert!(result.is_err());

        let aborts = events
            .lock()
            .iter()
            .filter(|u| matches!(u, ProgressUpdate::Aborted { .. }))
            .count();
        assert_eq!(aborts, 1);
    }

    #[test]
    fn test_budget_factor_option() {
        let options = ExecutionOptions::new().with_budget_factor(10);
        assert_eq!(options.budget_factor, 10);
        assert!(format!("{:?}", options).contains("budget_factor"));
    }
}
