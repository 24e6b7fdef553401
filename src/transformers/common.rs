//! Common utilities for transformers
//!
//! Shared helpers used across multiple rules: attribute defaults, opset
//! aware Pad reading, and the declined-precondition trace.

use tracing::trace;

use crate::constant::{is_constant, materialize};
use crate::graph::{Graph, Node, NodeId};

/// Pad revision from which `pads` and the fill value moved to inputs
pub const PAD_INPUTS_SINCE: i64 = 11;

/// Pad revision that renamed the `paddings` attribute to `pads`
pub const PAD_PADS_ATTR_SINCE: i64 = 2;

/// Log why a rule declined a node and return `false`
pub fn decline(rule: &str, graph: &Graph, node: NodeId, reason: &str) -> bool {
    let name = graph.node(node).map(|n| n.name()).unwrap_or("<removed>");
    trace!(rule, node = name, reason, "precondition not met");
    false
}

/// Pad `mode`, defaulting to `constant`; `None` if the attribute is malformed
pub fn pad_mode(node: &Node) -> Option<&str> {
    match node.attr_str("mode") {
        Ok(Some(mode)) => Some(mode),
        Ok(None) => Some("constant"),
        Err(_) => None,
    }
}

/// Check if a node relies on `auto_pad` rather than explicit pads
pub fn uses_auto_pad(node: &Node) -> bool {
    match node.attr_str("auto_pad") {
        Ok(Some(mode)) => mode != "NOTSET",
        Ok(None) => false,
        // unreadable: treat as implicit padding
        Err(_) => true,
    }
}

/// Integer attribute with a default; `None` if the attribute is malformed
pub fn attr_int_or(node: &Node, name: &str, default: i64) -> Option<i64> {
    node.attr_int(name).ok().map(|v| v.unwrap_or(default))
}

/// Explicit `pads` attribute of a windowed op; missing or empty gives `[]`
pub fn explicit_pads(node: &Node) -> Option<Vec<i64>> {
    node.attr_ints("pads")
        .ok()
        .map(|pads| pads.map(<[i64]>::to_vec).unwrap_or_default())
}

/// Compile-time pad amounts of a Pad node
///
/// From revision 11 the amounts are input 1 and must be constant. Revisions
/// 2 to 10 carry them in the `pads` attribute, revision 1 in `paddings`.
pub fn read_pad_amounts(graph: &Graph, pad: NodeId) -> Option<Vec<i64>> {
    let node = graph.node(pad).ok()?;
    let version = node.since_version();

    if version >= PAD_INPUTS_SINCE {
        let pads = node.input(1)?;
        if !is_constant(graph, pads) {
            return None;
        }
        materialize(graph, pads).ok()?.to_i64_vec().ok()
    } else if version >= PAD_PADS_ATTR_SINCE {
        node.attr_ints("pads").ok()?.map(<[i64]>::to_vec)
    } else {
        node.attr_ints("paddings").ok()?.map(<[i64]>::to_vec)
    }
}

/// Check that a Pad node fills with zero
///
/// Revision 11+: the optional fill input must be absent, or constant with
/// every byte zero (so `-0.0` does not qualify). Earlier revisions: the
/// `value` attribute must be absent or `0.0`.
pub fn pad_fill_is_zero(graph: &Graph, pad: NodeId) -> bool {
    let Ok(node) = graph.node(pad) else {
        return false;
    };

    if node.since_version() >= PAD_INPUTS_SINCE {
        match node.input(2) {
            None => true,
            Some(fill) => {
                is_constant(graph, fill)
                    && materialize(graph, fill)
                        .map(|view| view.is_all_zero())
                        .unwrap_or(false)
            }
        }
    } else {
        match node.attr_float("value") {
            Ok(Some(value)) => value == 0.0,
            Ok(None) => true,
            Err(_) => false,
        }
    }
}

/// Spatial rank of a Conv/pool node from `kernel_shape`, or a Conv weight shape
pub fn window_spatial_rank(graph: &Graph, node: NodeId) -> Option<usize> {
    let n = graph.node(node).ok()?;

    if let Ok(Some(kernel)) = n.attr_ints("kernel_shape") {
        return Some(kernel.len());
    }

    if n.op_type() == "Conv" {
        let weight = graph.value(n.input(1)?).ok()?;
        let rank = weight.shape()?.len();
        return rank.checked_sub(2).filter(|&r| r > 0);
    }

    None
}
