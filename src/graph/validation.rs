//! Structural invariant checks
//!
//! Verifies the bookkeeping every transform must preserve:
//!
//! - every populated input slot references a live value that lists the slot
//!   among its consumers, and vice versa
//! - every node output is produced by that node and nothing else
//! - a value with no producer is a graph input or an initializer
//! - cached consumer-edge counts equal the live consumer lists
//! - graph outputs are live
//! - the graph is acyclic

use crate::error::{RewriteError, RewriteResult};

use super::context::Graph;
use super::value::Edge;

/// Collected invariant violations
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Violations in discovery order
    pub errors: Vec<RewriteError>,
}

impl ValidationResult {
    /// True when no violation was found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn violation(&mut self, msg: String) {
        self.errors.push(RewriteError::InvariantViolation(msg));
    }
}

impl Graph {
    /// Check all structural invariants and collect every violation
    pub fn check_invariants(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for node in self.nodes() {
            for (index, input) in node.inputs.iter().enumerate() {
                let Some(t) = *input else { continue };
                match self.value(t) {
                    Ok(value) => {
                        let edge = Edge::new(node.id, index);
                        let listed = value.consumers.iter().filter(|&&e| e == edge).count();
                        if listed != 1 {
                            result.violation(format!(
                                "'{}' lists input {} of '{}' {} times",
                                value.name, index, node.name, listed
                            ));
                        }
                    }
                    Err(_) => result.errors.push(RewriteError::DanglingEdge {
                        node: node.id,
                        input_index: index,
                    }),
                }
            }

            if node.output_edge_counts.len() != node.outputs.len() {
                result.violation(format!(
                    "'{}' caches {} edge counts for {} outputs",
                    node.name,
                    node.output_edge_counts.len(),
                    node.outputs.len()
                ));
            }

            for (index, &out) in node.outputs.iter().enumerate() {
                let Ok(value) = self.value(out) else {
                    result.violation(format!("output {} of '{}' was removed", index, node.name));
                    continue;
                };
                if value.producer != Some(Edge::new(node.id, index)) {
                    result.violation(format!(
                        "'{}' is not attributed to output {} of '{}'",
                        value.name, index, node.name
                    ));
                }
                let cached = node.output_edges_at(index);
                if cached != value.consumers.len() {
                    result.violation(format!(
                        "'{}' caches {} consumer edges on '{}', live count is {}",
                        node.name,
                        cached,
                        value.name,
                        value.consumers.len()
                    ));
                }
            }
        }

        for value in self.values() {
            match value.producer {
                Some(p) => {
                    let owned = self
                        .node(p.node)
                        .map(|n| n.outputs.get(p.index) == Some(&value.id))
                        .unwrap_or(false);
                    if !owned {
                        result.violation(format!("'{}' has a stale producer link", value.name));
                    }
                    if value.is_initializer() || value.is_graph_input {
                        result.violation(format!(
                            "'{}' is both produced by a node and a graph input/initializer",
                            value.name
                        ));
                    }
                }
                None => {
                    if !value.is_graph_input && !value.is_initializer() {
                        result.violation(format!("'{}' has no producer", value.name));
                    }
                }
            }

            for edge in &value.consumers {
                let wired = self
                    .node(edge.node)
                    .map(|n| n.input(edge.index) == Some(value.id))
                    .unwrap_or(false);
                if !wired {
                    result.errors.push(RewriteError::DanglingEdge {
                        node: edge.node,
                        input_index: edge.index,
                    });
                }
            }
        }

        for &out in &self.outputs {
            if self.value(out).is_err() {
                result.violation(format!("graph output {} was removed", out));
            }
        }

        let ordered = self.topological_order().len();
        let live = self.node_count();
        if ordered != live {
            result.violation(format!(
                "graph has a cycle: {} of {} nodes are not orderable",
                live - ordered,
                live
            ));
        }

        result
    }

    /// Check all structural invariants, failing on the first violation
    pub fn validate(&self) -> RewriteResult<()> {
        match self.check_invariants().errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
