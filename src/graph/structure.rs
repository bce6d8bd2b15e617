//! Graph structure and node management.
//!
//! The FlowGraph is an arena of nodes, ports and edges addressed by opaque
//! ids. Alongside the arena it maintains a dependency map (per node, which
//! node produces each connected input) that is patched on every edge
//! mutation, so the scheduler never rebuilds it.

use crate::core::error::{
    EdgeId, FlowError, FlowResult, GraphError, GraphResult, NodeId, PortId,
};
use crate::core::node::NodeOutput;
use crate::core::port::{Port, PortDirection};
use crate::core::types::{PixelBuffer, Value};
use crate::graph::connection::Edge;
use crate::io::{self, ImportOptions, Imported};
use crate::nodes::NodeKind;
use crate::ops::histogram::Histogram;
use crate::ops::metrics::DiffMetrics;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

/// A node instance in the graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Unique identifier
    pub id: NodeId,
    /// What the node does
    pub kind: NodeKind,
    /// Optional display name override
    pub label: Option<String>,
    inputs: Vec<PortId>,
    outputs: Vec<PortId>,
    parameters: IndexMap<String, Value>,
    loaded: Option<Arc<PixelBuffer>>,
    output: NodeOutput,
}

impl GraphNode {
    /// Input ports, in the kind's port order.
    pub fn inputs(&self) -> &[PortId] {
        &self.inputs
    }

    /// Output ports, in the kind's port order.
    pub fn outputs(&self) -> &[PortId] {
        &self.outputs
    }

    /// Current parameter values (defaults filled in).
    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    /// Get a parameter value.
    pub fn get_parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Externally loaded buffer (sources only).
    pub fn loaded(&self) -> Option<&Arc<PixelBuffer>> {
        self.loaded.as_ref()
    }

    /// Results of the last run.
    pub fn output(&self) -> &NodeOutput {
        &self.output
    }

    /// Get the display name (label or kind name).
    pub fn display_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.kind.metadata().name)
    }
}

/// The processing graph.
///
/// Uses IndexMap to maintain insertion order for consistent iteration.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: IndexMap<NodeId, GraphNode>,
    ports: IndexMap<PortId, Port>,
    edges: IndexMap<EdgeId, Edge>,
    /// Per node: connected input port -> producing node, in connection order.
    dependencies: IndexMap<NodeId, IndexMap<PortId, NodeId>>,
}

impl FlowGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Node Management
    // ========================================================================

    /// Add a node of `kind`.
    ///
    /// Parameters not listed take the kind's defaults. Unknown names, wrong
    /// types and constraint violations are rejected and nothing is added.
    pub fn add_node(&mut self, kind: NodeKind, parameters: &[(&str, Value)]) -> GraphResult<NodeId> {
        let metadata = kind.metadata();
        for (name, value) in parameters {
            check_parameter(kind, name, value)?;
        }

        let id = NodeId::new();
        let mut values: IndexMap<String, Value> = metadata
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.default_value.clone()))
            .collect();
        for (name, value) in parameters {
            values.insert((*name).to_string(), value.clone());
        }

        let inputs = self.create_ports(id, PortDirection::Input, &metadata.inputs);
        let outputs = self.create_ports(id, PortDirection::Output, &metadata.outputs);

        self.nodes.insert(
            id,
            GraphNode {
                id,
                kind,
                label: None,
                inputs,
                outputs,
                parameters: values,
                loaded: None,
                output: NodeOutput::default(),
            },
        );
        self.dependencies.insert(id, IndexMap::new());
        log::debug!("Added {} node {}", kind, id);
        Ok(id)
    }

    fn create_ports(&mut self, node_id: NodeId, direction: PortDirection, names: &[String]) -> Vec<PortId> {
        names
            .iter()
            .map(|name| {
                let port = Port::new(node_id, direction, name.clone());
                let id = port.id;
                self.ports.insert(id, port);
                id
            })
            .collect()
    }

    /// Remove a node from the graph.
    ///
    /// Every edge touching one of its ports is removed first.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<GraphNode> {
        let node = self.node(id)?;
        let port_ids: Vec<PortId> = node.inputs.iter().chain(&node.outputs).copied().collect();

        let touching: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|edge| port_ids.iter().any(|&port| edge.touches(port)))
            .map(|edge| edge.id)
            .collect();
        for edge_id in touching {
            self.remove_edge(edge_id)?;
        }

        for port_id in &port_ids {
            self.ports.shift_remove(port_id);
        }
        self.dependencies.shift_remove(&id);
        log::debug!("Removed node {}", id);
        self.nodes.shift_remove(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Get a reference to a node.
    pub fn node(&self, id: NodeId) -> GraphResult<&GraphNode> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut GraphNode> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Check if a node exists.
    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get all nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Get all node IDs, in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Set a node's display label.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> GraphResult<()> {
        self.node_mut(id)?.label = Some(label.into());
        Ok(())
    }

    /// Set a parameter value after checking it against the kind's definition.
    pub fn set_parameter(&mut self, id: NodeId, name: &str, value: impl Into<Value>) -> GraphResult<()> {
        let value = value.into();
        let node = self.node_mut(id)?;
        check_parameter(node.kind, name, &value)?;
        node.parameters.insert(name.to_string(), value);
        Ok(())
    }

    // ========================================================================
    // Ports
    // ========================================================================

    /// Get a port.
    pub fn port(&self, id: PortId) -> GraphResult<&Port> {
        self.ports.get(&id).ok_or(GraphError::PortNotFound(id))
    }

    /// Find an input port of `node` by name.
    pub fn input_port(&self, node: NodeId, name: &str) -> GraphResult<PortId> {
        self.find_port(node, name, PortDirection::Input)
    }

    /// Find an output port of `node` by name.
    pub fn output_port(&self, node: NodeId, name: &str) -> GraphResult<PortId> {
        self.find_port(node, name, PortDirection::Output)
    }

    fn find_port(&self, node_id: NodeId, name: &str, direction: PortDirection) -> GraphResult<PortId> {
        let node = self.node(node_id)?;
        let candidates = match direction {
            PortDirection::Input => &node.inputs,
            PortDirection::Output => &node.outputs,
        };
        candidates
            .iter()
            .copied()
            .find(|id| self.ports.get(id).is_some_and(|p| p.name == name))
            .ok_or_else(|| GraphError::NamedPortNotFound {
                node_id,
                port: name.to_string(),
            })
    }

    // ========================================================================
    // Edge Management
    // ========================================================================

    /// Connect two ports.
    ///
    /// The pair may be given in either order; it is oriented from the output
    /// port to the input port. Rejected when both ids are the same port, when
    /// both ports share a direction, or when the input already has an edge.
    /// Cycles are not rejected here; the scheduler detects them at run time.
    pub fn add_edge(&mut self, a: PortId, b: PortId) -> GraphResult<EdgeId> {
        if a == b {
            return Err(GraphError::SamePort(a));
        }
        let port_a = self.port(a)?;
        let port_b = self.port(b)?;
        if port_a.direction == port_b.direction {
            return Err(GraphError::DirectionMismatch {
                direction: port_a.direction,
            });
        }

        let (source, target) = if port_a.is_input() { (b, a) } else { (a, b) };
        let target_port = self.port(target)?;
        if let Some(&existing) = target_port.edges.first() {
            return Err(GraphError::InputOccupied {
                port: target,
                edge: existing,
            });
        }
        let consumer = target_port.node_id;
        let producer = self.port(source)?.node_id;

        let edge = Edge::new(source, target);
        let id = edge.id;
        self.edges.insert(id, edge);
        for port in [source, target] {
            if let Some(port) = self.ports.get_mut(&port) {
                port.edges.push(id);
            }
        }
        self.dependencies
            .entry(consumer)
            .or_default()
            .insert(target, producer);

        log::debug!("Connected {} -> {} (edge {})", producer, consumer, id);
        Ok(id)
    }

    /// Connect by node and port names.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> GraphResult<EdgeId> {
        let source = self.output_port(from_node, from_port)?;
        let target = self.input_port(to_node, to_port)?;
        self.add_edge(source, target)
    }

    /// Remove an edge.
    pub fn remove_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self.edges.shift_remove(&id).ok_or(GraphError::EdgeNotFound(id))?;
        for port in [edge.source, edge.target] {
            if let Some(port) = self.ports.get_mut(&port) {
                port.edges.retain(|&e| e != id);
            }
        }
        if let Some(consumer) = self.ports.get(&edge.target).map(|p| p.node_id) {
            if let Some(deps) = self.dependencies.get_mut(&consumer) {
                deps.shift_remove(&edge.target);
            }
        }
        log::debug!("Removed edge {}", id);
        Ok(edge)
    }

    /// Get an edge.
    pub fn edge(&self, id: EdgeId) -> GraphResult<&Edge> {
        self.edges.get(&id).ok_or(GraphError::EdgeNotFound(id))
    }

    /// Get all edges, in creation order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ========================================================================
    // Graph Analysis
    // ========================================================================

    /// Connected inputs of a node and the node producing each.
    pub fn dependencies(&self, id: NodeId) -> GraphResult<&IndexMap<PortId, NodeId>> {
        self.dependencies.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Nodes with no connected input, in insertion order.
    pub fn source_nodes(&self) -> Vec<NodeId> {
        self.dependencies
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(&id, _)| id)
            .collect()
    }

    /// Immediate consumers of a node's outputs, in edge order, without
    /// duplicates.
    pub fn downstream_nodes(&self, id: NodeId) -> GraphResult<Vec<NodeId>> {
        let node = self.node(id)?;
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for port_id in &node.outputs {
            let port = self.port(*port_id)?;
            for edge_id in &port.edges {
                let edge = self.edge(*edge_id)?;
                let consumer = self.port(edge.target)?.node_id;
                if seen.insert(consumer) {
                    result.push(consumer);
                }
            }
        }
        Ok(result)
    }

    /// Check if `target` is reachable from `start` following edges.
    pub fn is_reachable(&self, start: NodeId, target: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == target {
                return true;
            }
            if visited.insert(current) {
                if let Ok(next) = self.downstream_nodes(current) {
                    queue.extend(next);
                }
            }
        }
        false
    }

    /// Whether connecting the two ports would close a cycle.
    ///
    /// Advisory only: [`add_edge`](Self::add_edge) accepts such edges.
    pub fn would_create_cycle(&self, a: PortId, b: PortId) -> GraphResult<bool> {
        let port_a = self.port(a)?;
        let port_b = self.port(b)?;
        let (producer, consumer) = if port_a.is_input() {
            (port_b.node_id, port_a.node_id)
        } else {
            (port_a.node_id, port_b.node_id)
        };
        Ok(self.is_reachable(consumer, producer))
    }

    // ========================================================================
    // Sources and Results
    // ========================================================================

    /// Load a buffer into a source node.
    pub fn load_source(&mut self, id: NodeId, buffer: PixelBuffer) -> GraphResult<()> {
        self.set_loaded(id, Some(Arc::new(buffer)))
    }

    /// Drop a source node's loaded buffer.
    pub fn clear_source(&mut self, id: NodeId) -> GraphResult<()> {
        self.set_loaded(id, None)
    }

    fn set_loaded(&mut self, id: NodeId, buffer: Option<Arc<PixelBuffer>>) -> GraphResult<()> {
        let node = self.node_mut(id)?;
        if node.kind != NodeKind::Source {
            return Err(GraphError::NotASource(id));
        }
        node.loaded = buffer;
        Ok(())
    }

    /// Import a file into a source node.
    ///
    /// On failure the source keeps whatever it held before.
    pub fn load_source_file(
        &mut self,
        id: NodeId,
        path: impl AsRef<Path>,
        options: &ImportOptions,
    ) -> FlowResult<Imported> {
        if self.node(id)?.kind != NodeKind::Source {
            return Err(GraphError::NotASource(id).into());
        }
        let imported = io::load(path.as_ref(), options)?;
        self.set_loaded(id, Some(imported.buffer.clone()))?;
        log::info!(
            "Loaded {} into source {} as {:?}",
            imported.buffer,
            id,
            imported.format
        );
        Ok(imported)
    }

    /// Write a sink's persisted buffer as raw bytes.
    pub fn export_persisted(&self, id: NodeId, path: impl AsRef<Path>) -> FlowResult<()> {
        let buffer = self
            .persisted(id)?
            .ok_or(FlowError::Graph(GraphError::NothingToExport(id)))?;
        io::raw::write_raw(path.as_ref(), buffer)?;
        log::info!("Exported {} from node {} to {}", buffer, id, path.as_ref().display());
        Ok(())
    }

    /// Buffer on a node's output port after the last run.
    pub fn output(&self, id: NodeId) -> GraphResult<Option<&Arc<PixelBuffer>>> {
        Ok(self.node(id)?.output.image.as_ref())
    }

    /// Buffer a sink holds for export.
    pub fn persisted(&self, id: NodeId) -> GraphResult<Option<&Arc<PixelBuffer>>> {
        Ok(self.node(id)?.output.persisted.as_ref())
    }

    /// Histogram computed by a histogram node.
    pub fn histogram(&self, id: NodeId) -> GraphResult<Option<&Histogram>> {
        Ok(self.node(id)?.output.histogram.as_ref())
    }

    /// Metrics computed by a difference node.
    pub fn metrics(&self, id: NodeId) -> GraphResult<Option<&DiffMetrics>> {
        Ok(self.node(id)?.output.metrics.as_ref())
    }

    /// Buffer arriving on an input port, if its producer has output.
    pub(crate) fn incoming(&self, input: PortId) -> Option<Arc<PixelBuffer>> {
        let port = self.ports.get(&input)?;
        let edge = self.edges.get(port.edges.first()?)?;
        let producer = self.ports.get(&edge.source)?.node_id;
        self.nodes.get(&producer)?.output.image.clone()
    }

    pub(crate) fn set_output(&mut self, id: NodeId, output: NodeOutput) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.output = output;
        }
    }

    pub(crate) fn clear_outputs(&mut self) {
        for node in self.nodes.values_mut() {
            node.output = NodeOutput::default();
        }
    }

    /// Clear all nodes, ports and edges.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.ports.clear();
        self.edges.clear();
        self.dependencies.clear();
    }
}

/// Check a parameter assignment against the kind's definition.
fn check_parameter(kind: NodeKind, name: &str, value: &Value) -> GraphResult<()> {
    let metadata = kind.metadata();
    let definition = metadata
        .get_parameter(name)
        .ok_or_else(|| GraphError::UnknownParameter {
            kind: kind.id().to_string(),
            parameter: name.to_string(),
        })?;
    if !definition.param_type.accepts(value) {
        return Err(GraphError::ParameterType {
            parameter: name.to_string(),
            expected: definition.param_type,
            got: value.value_type(),
        });
    }
    for constraint in &definition.constraints {
        constraint
            .validate(value)
            .map_err(|error| GraphError::ParameterConstraint {
                parameter: name.to_string(),
                error,
            })?;
    }
    Ok(())
}
