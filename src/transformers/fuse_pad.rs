//! Pad fusion
//!
//! Folds a zero-valued, spatial-only `Pad` into the explicit `pads` of the
//! Conv or pooling node that consumes it, optionally through one `Cast`.

use tracing::trace;

use crate::error::{RewriteError, RewriteResult};
use crate::graph::{Graph, NodeId, TensorId};
use crate::pattern::{matches_any, CAST, PAD, PAD_ABSORBERS};
use crate::tensor::rank_of_pads;
use crate::traits::{RewriteEffect, RewriteRule};

use super::common::{
    attr_int_or, decline, explicit_pads, pad_fill_is_zero, pad_mode, read_pad_amounts,
    uses_auto_pad,
};

/// Matched `Pad -> [Cast] -> consumer` chain
#[derive(Debug, Clone, PartialEq, Eq)]
struct FusionSite {
    /// Tensor the Pad reads
    data: TensorId,
    cast: Option<NodeId>,
    consumer: NodeId,
    /// Consumer pads with the Pad's spatial amounts added
    merged: Vec<i64>,
}

/// Fuses Pad into Conv / AveragePool / MaxPool
///
/// Transforms:
///   Pad(x) -> [Cast] -> Conv(pads=p)
/// Into:
///   [Cast] -> Conv(x) with pads = p + spatial pad amounts
///
/// For AveragePool the merged node gets `count_include_pad=1`, since the
/// removed Pad contributed real zeros to every window.
#[derive(Debug, Default)]
pub struct PadFusion;

impl PadFusion {
    /// Create a new PadFusion rule
    pub fn new() -> Self {
        Self
    }

    /// Walk the chain from `pad`; `Err` carries the reason for declining
    fn find_site(&self, graph: &Graph, pad: NodeId) -> Result<FusionSite, &'static str> {
        let node = graph.node(pad).map_err(|_| "node was removed")?;

        if !PAD.matches(node) {
            return Err("not a supported Pad revision");
        }
        if graph.produces_graph_output(pad) {
            return Err("Pad output is a graph output");
        }
        if node.input(3).is_some() {
            return Err("Pad has an axes input");
        }
        let data = node.input(0).ok_or("Pad has no data input")?;

        match pad_mode(node) {
            Some("constant") => {}
            _ => return Err("Pad mode is not constant"),
        }

        let pads = read_pad_amounts(graph, pad).ok_or("pad amounts are not constant")?;
        if !pad_fill_is_zero(graph, pad) {
            return Err("fill value is not constant zero");
        }
        check_spatial_pads(&pads)?;

        // Pad must feed input 0 of exactly one node
        let next = graph.single_consumer(pad).ok_or("Pad does not have exactly one consumer")?;
        if feeding_slot(graph, pad) != Some(0) {
            return Err("Pad does not feed the data input");
        }

        let next_node = graph.node(next).map_err(|_| "consumer was removed")?;
        let (cast, consumer) = if CAST.matches(next_node) {
            if graph.produces_graph_output(next) {
                return Err("Cast output is a graph output");
            }
            let consumer = graph
                .single_consumer(next)
                .ok_or("Cast does not have exactly one consumer")?;
            if feeding_slot(graph, next) != Some(0) {
                return Err("Cast does not feed the data input");
            }
            (Some(next), consumer)
        } else {
            (None, next)
        };

        let child = graph.node(consumer).map_err(|_| "consumer was removed")?;
        if !matches_any(child, PAD_ABSORBERS) {
            return Err("consumer cannot absorb padding");
        }
        if uses_auto_pad(child) {
            return Err("consumer uses auto_pad");
        }
        if child.outputs().len() != 1 {
            return Err("consumer has more than one output");
        }

        let child_len = pads.len() - 4;
        let mut consumer_pads = explicit_pads(child).ok_or("consumer pads is not an int list")?;
        if consumer_pads.is_empty() {
            consumer_pads = vec![0; child_len];
        } else if consumer_pads.len() != child_len {
            return Err("consumer pads rank differs from Pad rank");
        }

        if child.op_type() == "AveragePool" {
            let count_include_pad =
                attr_int_or(child, "count_include_pad", 0).ok_or("count_include_pad is malformed")?;
            if count_include_pad == 0 && consumer_pads.iter().any(|&p| p != 0) {
                return Err("AveragePool already pads without counting padding");
            }
        }

        let merged = merge_pads(&pads, &consumer_pads).ok_or("merged pads overflow")?;

        Ok(FusionSite {
            data,
            cast,
            consumer,
            merged,
        })
    }
}

/// Input slot of the single edge leaving `node`
fn feeding_slot(graph: &Graph, node: NodeId) -> Option<usize> {
    match graph.output_edges(node).ok()?.as_slice() {
        [edge] => Some(edge.index),
        _ => None,
    }
}

/// Require `[0, 0, s..., 0, 0, e...]` with every entry non-negative
fn check_spatial_pads(pads: &[i64]) -> Result<(), &'static str> {
    let Some(half) = rank_of_pads(pads).filter(|&rank| rank >= 2) else {
        return Err("pad amounts are malformed");
    };
    if pads[0] != 0 || pads[1] != 0 || pads[half] != 0 || pads[half + 1] != 0 {
        return Err("pad touches batch or channel dimension");
    }
    if pads.iter().any(|&p| p < 0) {
        return Err("negative pad amount");
    }
    Ok(())
}

/// Add the spatial Pad amounts onto a consumer's `[begin..., end...]` pads
///
/// `None` if any merged amount overflows `i64`.
fn merge_pads(pads: &[i64], consumer_pads: &[i64]) -> Option<Vec<i64>> {
    let half = pads.len() / 2;
    let child_half = consumer_pads.len() / 2;
    let mut merged = consumer_pads.to_vec();

    for pads_index in 2..half {
        let child_index = pads_index - 2;
        let begin = merged.get_mut(child_index)?;
        *begin = begin.checked_add(*pads.get(pads_index)?)?;
        let end = merged.get_mut(child_index + child_half)?;
        *end = end.checked_add(*pads.get(pads_index + half)?)?;
    }

    Some(merged)
}

impl RewriteRule for PadFusion {
    fn name(&self) -> &str {
        "PadFusion"
    }

    fn target_op_types(&self) -> &[&str] {
        &["Pad"]
    }

    fn satisfies_condition(&self, graph: &Graph, node: NodeId) -> bool {
        match self.find_site(graph, node) {
            Ok(_) => true,
            Err(reason) => decline(self.name(), graph, node, reason),
        }
    }

    fn apply(&self, graph: &mut Graph, node: NodeId) -> RewriteResult<RewriteEffect> {
        let site = match self.find_site(graph, node) {
            Ok(site) => site,
            Err(reason) => {
                trace!(reason, "pad fusion site no longer matches");
                return Ok(RewriteEffect::NoChange);
            }
        };

        let consumer = graph.node_mut(site.consumer)?;
        consumer.set_attribute("pads", site.merged);
        if consumer.op_type() == "AveragePool" {
            consumer.set_attribute("count_include_pad", 1i64);
        }

        let target = site.cast.unwrap_or(site.consumer);
        graph.replace_node_input(target, 0, site.data)?;

        if let Some(cast) = site.cast {
            let shape = graph.value(site.data)?.shape().map(<[i64]>::to_vec);
            let cast_out = graph
                .node(cast)?
                .outputs()
                .first()
                .copied()
                .ok_or_else(|| RewriteError::InvalidNode(format!("{} has no output", cast)))?;
            graph.set_value_shape(cast_out, shape)?;
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
