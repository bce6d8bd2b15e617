//! Topological analysis of flow graphs.
//!
//! Provides algorithms for:
//! - Topological sorting (Kahn's algorithm)
//! - Cycle detection
//! - Reachability from source nodes

use crate::core::error::{GraphError, GraphResult, NodeId};
use crate::graph::structure::FlowGraph;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

/// Analyzer for graph topology.
pub struct TopologyAnalyzer<'a> {
    graph: &'a FlowGraph,
}

impl<'a> TopologyAnalyzer<'a> {
    /// Create a new analyzer for the given graph.
    pub fn new(graph: &'a FlowGraph) -> Self {
        Self { graph }
    }

    /// Get the topological sort order (Kahn's algorithm).
    ///
    /// Returns nodes in an order where dependencies come before dependents.
    /// Ties follow node insertion order.
    pub fn topological_sort(&self) -> GraphResult<Vec<NodeId>> {
        let mut in_degree: IndexMap<NodeId, usize> = IndexMap::new();
        for node_id in self.graph.node_ids() {
            let deps = self.graph.dependencies(node_id)?;
            in_degree.insert(node_id, deps.len());
        }

        // Start with nodes that have no connected inputs
        let mut queue: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut result = Vec::with_capacity(self.graph.node_count());

        while let Some(node) = queue.pop_front() {
            result.push(node);

            // One decrement per edge, so a consumer fed twice by the same
            // producer is released only after both edges are counted.
            for consumer in self.graph.node_ids() {
                let deps = self.graph.dependencies(consumer)?;
                let fed = deps.values().filter(|&&producer| producer == node).count();
                if fed == 0 {
                    continue;
                }
                if let Some(degree) = in_degree.get_mut(&consumer) {
                    *degree -= fed;
                    if *degree == 0 {
                        queue.push_back(consumer);
                    }
                }
            }
        }

        // If we haven't visited all nodes, there's a cycle
        if result.len() != self.graph.node_count() {
            let remaining: Vec<NodeId> = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(&id, _)| id)
                .collect();

            return Err(GraphError::CycleDetected { nodes: remaining });
        }

        Ok(result)
    }

    /// Check if the graph has any cycles.
    pub fn has_cycle(&self) -> bool {
        self.topological_sort().is_err()
    }

    /// Nodes reachable by following edges from any node without connected
    /// inputs (the sources themselves included).
    pub fn reachable_from_sources(&self) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeId> = self.graph.source_nodes().into();

        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                if let Ok(next) = self.graph.downstream_nodes(current) {
                    queue.extend(next);
                }
            }
        }

        visited
    }

    /// Nodes the scheduler will never reach.
    pub fn unreachable_nodes(&self) -> Vec<NodeId> {
        let reachable = self.reachable_from_sources();
        self.graph
            .node_ids()
            .filter(|id| !reachable.contains(id))
            .collect()
    }
}
