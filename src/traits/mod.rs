//! Core traits for furiosa-rewriter
//!
//! Defines the contract every rewrite rule satisfies. Rules are registered
//! as an ordered list of trait objects, so adding a new fusion never touches
//! the driver.

use std::fmt;

use crate::error::RewriteResult;
use crate::graph::{Graph, NodeId};

/// Outcome of a single transform invocation
///
/// Only the driver branches on this: it decides where the scan cursor goes
/// next and what ends up in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteEffect {
    /// Nothing was mutated
    NoChange,
    /// The candidate node survived with different attributes or inputs
    NodeModified,
    /// The candidate node was deleted
    NodeRemoved,
}

impl RewriteEffect {
    /// True for anything other than `NoChange`
    pub fn is_change(self) -> bool {
        !matches!(self, RewriteEffect::NoChange)
    }
}

impl fmt::Display for RewriteEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RewriteEffect::NoChange => "no-change",
            RewriteEffect::NodeModified => "node-modified",
            RewriteEffect::NodeRemoved => "node-removed",
        };
        f.write_str(s)
    }
}

/// Rewrite rule: a legality predicate paired with a transform
///
/// # Example
///
/// ```ignore
/// struct DropRelu;
///
/// impl RewriteRule for DropRelu {
///     fn name(&self) -> &str {
///         "DropRelu"
///     }
///
///     fn target_op_types(&self) -> &[&str] {
///         &["Relu"]
///     }
///
///     fn satisfies_condition(&self, graph: &Graph, node: NodeId) -> bool {
///         !graph.produces_graph_output(node)
///     }
///
///     fn apply(&self, graph: &mut Graph, node: NodeId) -> RewriteResult<RewriteEffect> {
///         // rewire consumers, then remove
///         Ok(RewriteEffect::NodeRemoved)
///     }
/// }
/// ```
pub trait RewriteRule: Send + Sync {
    /// Name used in logs and the change log
    fn name(&self) -> &str;

    /// Op types this rule anchors on; empty means every node
    fn target_op_types(&self) -> &[&str] {
        &[]
    }

    /// Pure legality check
    ///
    /// Reads the graph only and may be called any number of times in any
    /// order. An unmet condition is never an error.
    fn satisfies_condition(&self, graph: &Graph, node: NodeId) -> bool;

    /// Mutate the graph
    ///
    /// Called only right after `satisfies_condition` returned true for the
    /// same node. Errors are structural and abort the whole run.
    fn apply(&self, graph: &mut Graph, node: NodeId) -> RewriteResult<RewriteEffect>;

    /// Whether the rule should be consulted for this op type
    fn targets(&self, op_type: &str) -> bool {
        let targets = self.target_op_types();
        targets.is_empty() || targets.contains(&op_type)
    }
}
