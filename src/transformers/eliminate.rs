//! Elimination rules
//!
//! Rules that remove nodes which do not change their input.

use crate::error::{RewriteError, RewriteResult};
use crate::graph::{Graph, NodeId};
use crate::pattern::IDENTITY;
use crate::traits::{RewriteEffect, RewriteRule};

use super::common::decline;

/// Eliminate Identity nodes
///
/// Identity nodes simply pass their input to output without modification.
/// They can be safely removed by connecting predecessors directly to
/// successors, unless their output is a declared graph output.
#[derive(Debug, Default)]
pub struct EliminateIdentity;

impl EliminateIdentity {
    /// Create a new EliminateIdentity rule
    pub fn new() -> Self {
        Self
    }
}

impl RewriteRule for EliminateIdentity {
    fn name(&self) -> &str {
        "EliminateIdentity"
    }

    fn target_op_types(&self) -> &[&str] {
        &["Identity"]
    }

    fn satisfies_condition(&self, graph: &Graph, node: NodeId) -> bool {
        let Ok(n) = graph.node(node) else {
            return false;
        };
        if !IDENTITY.matches(n) {
            return decline(self.name(), graph, node, "not a supported Identity revision");
        }
        if n.input(0).is_none() {
            return decline(self.name(), graph, node, "Identity has no input");
        }
        if graph.produces_graph_output(node) {
            return decline(self.name(), graph, node, "Identity output is a graph output");
        }
        true
    }

    fn apply(&self, graph: &mut Graph, node: NodeId) -> RewriteResult<RewriteEffect> {
        let input = graph.node(node)?.input(0).ok_or(RewriteError::DanglingEdge {
            node,
            input_index: 0,
        })?;

        for edge in graph.output_edges(node)? {
            graph.replace_node_input(edge.node, edge.index, input)?;
        }

        let leftover = graph.remove_node_output_edges(node)?;
        if let Some(edge) = leftover.first() {
            return Err(RewriteError::DanglingEdge {
                node: edge.node,
                input_index: edge.index,
            });
        }
        graph.remove_node(node)?;

        Ok(RewriteEffect::NodeRemoved)
    }
}
