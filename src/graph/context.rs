//! Graph IR container
//!
//! `Graph` is the central structure for rewriting. It owns every node and
//! value in two append-only arenas indexed by [`NodeId`] and [`TensorId`];
//! edges are expressed as producer/consumer [`Edge`]s on each value, so no
//! node holds a reference to another.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::error::{RewriteError, RewriteResult};

use super::node::{Node, NodeId, ONNX_DOMAIN};
use super::value::{TensorId, Value};

/// In-memory dataflow graph
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node arena; `None` marks a removed node
    pub(crate) nodes: Vec<Option<Node>>,

    /// Value arena; `None` marks a removed value
    pub(crate) values: Vec<Option<Value>>,

    /// Maps value name → id
    pub(crate) value_index: FxHashMap<String, TensorId>,

    /// Maps node name → id
    pub(crate) node_index: FxHashMap<String, NodeId>,

    /// Graph inputs in declaration order
    pub(crate) inputs: Vec<TensorId>,

    /// Graph outputs in declaration order
    pub(crate) outputs: Vec<TensorId>,

    /// Maps domain → imported opset version
    pub(crate) opset_imports: IndexMap<String, i64>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph importing the given default-domain opset
    pub fn with_opset(version: i64) -> Self {
        let mut graph = Self::new();
        graph.set_opset_import(ONNX_DOMAIN, version);
        graph
    }

    /// Declare an opset import for a domain
    pub fn set_opset_import(&mut self, domain: impl Into<String>, version: i64) {
        self.opset_imports.insert(domain.into(), version);
    }

    /// Imported opset version for a domain
    pub fn opset_version(&self, domain: &str) -> Option<i64> {
        self.opset_imports.get(domain).copied()
    }

    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> RewriteResult<&Node> {
        self.nodes
            .get(id.index())
            .and_then(|n| n.as_ref())
            .ok_or(RewriteError::NodeNotFound(id))
    }

    /// Get a node by id for attribute edits
    ///
    /// Structural fields are crate-private, so only attributes can change
    /// through this handle; wiring goes through the mutators.
    pub fn node_mut(&mut self, id: NodeId) -> RewriteResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .and_then(|n| n.as_mut())
            .ok_or(RewriteError::NodeNotFound(id))
    }

    /// Check if a node id is live
    pub fn contains_node(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.index()), Some(Some(_)))
    }

    /// Look up a node id by name
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_index.get(name).copied()
    }

    /// Iterate over live nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter_map(|n| n.as_ref())
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// Find live nodes by op type
    pub fn find_nodes_by_op(&self, op_type: &str) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.op_type() == op_type)
            .map(|n| n.id)
            .collect()
    }

    // ========================================================================
    // Value accessors
    // ========================================================================

    /// Get a value by name
    pub fn tensor(&self, name: &str) -> RewriteResult<&Value> {
        let id = self
            .tensor_id(name)
            .ok_or_else(|| RewriteError::TensorNotFound(name.to_string()))?;
        self.value(id)
    }

    /// Get a value by id
    pub fn value(&self, id: TensorId) -> RewriteResult<&Value> {
        self.values
            .get(id.index())
            .and_then(|v| v.as_ref())
            .ok_or_else(|| RewriteError::TensorNotFound(id.to_string()))
    }

    pub(crate) fn value_mut(&mut self, id: TensorId) -> RewriteResult<&mut Value> {
        self.values
            .get_mut(id.index())
            .and_then(|v| v.as_mut())
            .ok_or_else(|| RewriteError::TensorNotFound(id.to_string()))
    }

    /// Look up a value id by name
    pub fn tensor_id(&self, name: &str) -> Option<TensorId> {
        self.value_index.get(name).copied()
    }

    /// Iterate over live values in creation order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter_map(|v| v.as_ref())
    }

    /// Number of live values
    pub fn value_count(&self) -> usize {
        self.values().count()
    }

    /// Graph inputs in declaration order
    pub fn graph_inputs(&self) -> &[TensorId] {
        &self.inputs
    }

    /// Graph outputs in declaration order
    pub fn graph_outputs(&self) -> &[TensorId] {
        &self.outputs
    }

    /// Check if a value is a declared graph output
    pub fn is_graph_output(&self, id: TensorId) -> bool {
        self.value(id).map(|v| v.is_graph_output).unwrap_or(false)
    }

    /// Check if a value is a declared graph input
    pub fn is_graph_input(&self, id: TensorId) -> bool {
        self.value(id).map(|v| v.is_graph_input).unwrap_or(false)
    }

    /// Number of initializers still present
    pub fn initializer_count(&self) -> usize {
        self.values().filter(|v| v.is_initializer()).count()
    }
}
