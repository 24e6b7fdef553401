//! Structural graph queries
//!
//! Read-only traversal helpers used by rule preconditions and the driver.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::error::RewriteResult;

use super::context::Graph;
use super::node::{Node, NodeId};
use super::value::{Edge, TensorId, Value};

impl Graph {
    // ========================================================================
    // Producer / consumer traversal
    // ========================================================================

    /// Get the node producing a value
    pub fn producer(&self, id: TensorId) -> Option<&Node> {
        let edge = self.value(id).ok()?.producer?;
        self.node(edge.node).ok()
    }

    /// Value feeding an input slot of a node
    pub fn input_value(&self, node: NodeId, index: usize) -> RewriteResult<Option<&Value>> {
        match self.node(node)?.input(index) {
            Some(id) => Ok(Some(self.value(id)?)),
            None => Ok(None),
        }
    }

    /// All consumer edges leaving a node, output by output
    pub fn output_edges(&self, node: NodeId) -> RewriteResult<Vec<Edge>> {
        let node = self.node(node)?;
        let mut edges = Vec::with_capacity(node.output_edges_count());
        for &out in &node.outputs {
            edges.extend_from_slice(&self.value(out)?.consumers);
        }
        Ok(edges)
    }

    /// Distinct consumer nodes of a node, in edge order
    pub fn output_nodes(&self, node: NodeId) -> RewriteResult<Vec<NodeId>> {
        let mut seen = FxHashSet::default();
        Ok(self
            .output_edges(node)?
            .into_iter()
            .map(|e| e.node)
            .filter(|n| seen.insert(*n))
            .collect())
    }

    /// The single consumer node of `node`, if it has exactly one consumer edge
    pub fn single_consumer(&self, node: NodeId) -> Option<NodeId> {
        let n = self.node(node).ok()?;
        if n.output_edges_count() != 1 {
            return None;
        }
        self.output_edges(node).ok()?.first().map(|e| e.node)
    }

    /// Check if a value has exactly one consumer edge
    pub fn is_single_use(&self, id: TensorId) -> bool {
        self.value(id).map(|v| v.consumers.len() == 1).unwrap_or(false)
    }

    // ========================================================================
    // Graph-output guard
    // ========================================================================

    /// True iff any output of `node` is a declared graph output
    ///
    /// Removing or rerouting such a node would change the model's visible
    /// result set.
    pub fn produces_graph_output(&self, node: NodeId) -> bool {
        match self.node(node) {
            Ok(n) => n.outputs.iter().any(|&out| self.is_graph_output(out)),
            Err(_) => false,
        }
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Get the topological order of live nodes (Kahn's algorithm)
    ///
    /// Ties are broken by insertion order, so the result is stable for a
    /// given graph. Nodes on a cycle are absent from the result.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut in_degree = vec![0usize; self.nodes.len()];

        for node in self.nodes() {
            in_degree[node.id.index()] = node
                .inputs
                .iter()
                .flatten()
                .filter(|&&t| {
                    self.value(t)
                        .map(|v| v.producer.is_some())
                        .unwrap_or(false)
                })
                .count();
        }

        let mut queue: VecDeque<NodeId> = self
            .nodes()
            .filter(|n| in_degree[n.id.index()] == 0)
            .map(|n| n.id)
            .collect();

        let mut order = Vec::with_capacity(queue.len());

        while let Some(id) = queue.pop_front() {
            order.push(id);

            let Ok(node) = self.node(id) else { continue };
            for &out in &node.outputs {
                let Ok(value) = self.value(out) else { continue };
                for edge in &value.consumers {
                    let Some(count) = in_degree.get_mut(edge.node.index()).filter(|c| **c > 0)
                    else {
                        continue;
                    };
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(edge.node);
                    }
                }
            }
        }

        order
    }
}
