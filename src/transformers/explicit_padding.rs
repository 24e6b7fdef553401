//! Explicit VALID padding
//!
//! `auto_pad="VALID"` means no padding at all, which is the same as an
//! explicit all-zero `pads`. Rewriting it that way lets Pad fusion treat the
//! node like any other explicitly padded consumer.

use crate::error::RewriteResult;
use crate::graph::{Graph, NodeId};
use crate::pattern::{matches_any, PAD_ABSORBERS, POOL_OPS};
use crate::traits::{RewriteEffect, RewriteRule};

use super::common::{attr_int_or, decline, window_spatial_rank};

/// Rewrites `auto_pad="VALID"` into explicit zero `pads`
///
/// Pooling nodes with `ceil_mode=1` are left alone: their output size with
/// explicit pads is computed differently from the VALID formula.
#[derive(Debug, Default)]
pub struct ExplicitValidPadding;

impl ExplicitValidPadding {
    /// Create a new ExplicitValidPadding rule
    pub fn new() -> Self {
        Self
    }
}

impl RewriteRule for ExplicitValidPadding {
    fn name(&self) -> &str {
        "ExplicitValidPadding"
    }

    fn target_op_types(&self) -> &[&str] {
        &["Conv", "AveragePool", "MaxPool"]
    }

    fn satisfies_condition(&self, graph: &Graph, node: NodeId) -> bool {
        let Ok(n) = graph.node(node) else {
            return false;
        };
        if !matches_any(n, PAD_ABSORBERS) {
            return false;
        }
        match n.attr_str("auto_pad") {
            Ok(Some("VALID")) => {}
            _ => return false,
        }
        if POOL_OPS.contains(&n.op_type()) && attr_int_or(n, "ceil_mode", 0) != Some(0) {
            return decline(self.name(), graph, node, "ceil_mode is set");
        }
        if window_spatial_rank(graph, node).is_none() {
            return decline(self.name(), graph, node, "spatial rank unknown");
        }
        true
    }

    fn apply(&self, graph: &mut Graph, node: NodeId) -> RewriteResult<RewriteEffect> {
        let Some(rank) = window_spatial_rank(graph, node) else {
            return Ok(RewriteEffect::NoChange);
        };

        let n = graph.node_mut(node)?;
        n.remove_attribute("auto_pad");
        n.set_attribute("pads", vec![0i64; rank * 2]);

        Ok(RewriteEffect::NodeModified)
    }
}
