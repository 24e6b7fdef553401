//! Graph mutation operations
//!
//! Every primitive here keeps the producer/consumer links on values and the
//! cached consumer-edge counts on nodes in agreement before it returns.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::{RewriteError, RewriteResult};
use crate::tensor::{DataType, TensorData};

use super::attribute::AttributeValue;
use super::context::Graph;
use super::node::{Node, NodeId, OpIdentity};
use super::value::{Edge, TensorId, Value};

impl Graph {
    // ========================================================================
    // Value creation
    // ========================================================================

    fn add_value(
        &mut self,
        name: &str,
        elem_type: Option<DataType>,
        shape: Option<Vec<i64>>,
    ) -> RewriteResult<TensorId> {
        if name.is_empty() || self.value_index.contains_key(name) {
            return Err(RewriteError::DuplicateTensor(name.to_string()));
        }

        let id = TensorId::new(self.values.len());
        self.values
            .push(Some(Value::new(id, name.to_string(), elem_type, shape)));
        self.value_index.insert(name.to_string(), id);
        Ok(id)
    }

    /// Declare a graph input
    pub fn add_graph_input(
        &mut self,
        name: &str,
        elem_type: Option<DataType>,
        shape: Option<Vec<i64>>,
    ) -> RewriteResult<TensorId> {
        let id = self.add_value(name, elem_type, shape)?;
        self.value_mut(id)?.is_graph_input = true;
        self.inputs.push(id);
        Ok(id)
    }

    /// Add an initializer
    ///
    /// If `name` is already a graph input, the payload becomes that input's
    /// default value (an overridable initializer).
    pub fn add_initializer(&mut self, name: &str, data: TensorData) -> RewriteResult<TensorId> {
        data.validate(name)?;

        if let Some(id) = self.tensor_id(name) {
            let value = self.value_mut(id)?;
            if !value.is_graph_input || value.initializer.is_some() {
                return Err(RewriteError::DuplicateTensor(name.to_string()));
            }
            value.initializer = Some(data);
            return Ok(id);
        }

        let id = self.add_value(name, Some(data.dtype()), Some(data.dims().to_vec()))?;
        self.value_mut(id)?.initializer = Some(data);
        Ok(id)
    }

    /// Pin a value as a graph output
    pub fn mark_graph_output(&mut self, id: TensorId) -> RewriteResult<()> {
        let value = self.value_mut(id)?;
        if !value.is_graph_output {
            value.is_graph_output = true;
            self.outputs.push(id);
        }
        Ok(())
    }

    /// Update a value's static shape
    pub fn set_value_shape(&mut self, id: TensorId, shape: Option<Vec<i64>>) -> RewriteResult<()> {
        self.value_mut(id)?.shape = shape;
        Ok(())
    }

    /// Update a value's element type
    pub fn set_value_type(&mut self, id: TensorId, elem_type: Option<DataType>) -> RewriteResult<()> {
        self.value_mut(id)?.elem_type = elem_type;
        Ok(())
    }

    // ========================================================================
    // Node insertion
    // ========================================================================

    /// Insert a new node
    ///
    /// Inputs must name existing values (an empty name is an omitted
    /// optional input); outputs must be new names.
    pub fn add_node(
        &mut self,
        name: &str,
        op: OpIdentity,
        inputs: &[&str],
        outputs: &[&str],
        attributes: IndexMap<String, AttributeValue>,
    ) -> RewriteResult<NodeId> {
        if name.is_empty() || self.node_index.contains_key(name) {
            return Err(RewriteError::InvalidNode(format!(
                "node name '{}' is empty or already used",
                name
            )));
        }

        let mut input_ids = Vec::with_capacity(inputs.len());
        for &input in inputs {
            if input.is_empty() {
                input_ids.push(None);
            } else {
                let id = self
                    .tensor_id(input)
                    .ok_or_else(|| RewriteError::TensorNotFound(input.to_string()))?;
                input_ids.push(Some(id));
            }
        }

        for (i, &output) in outputs.iter().enumerate() {
            if output.is_empty()
                || self.value_index.contains_key(output)
                || outputs[..i].contains(&output)
            {
                return Err(RewriteError::DuplicateTensor(output.to_string()));
            }
        }

        let id = NodeId::new(self.nodes.len());

        let mut output_ids = Vec::with_capacity(outputs.len());
        for (index, &output) in outputs.iter().enumerate() {
            let out = self.add_value(output, None, None)?;
            self.value_mut(out)?.producer = Some(Edge::new(id, index));
            output_ids.push(out);
        }

        for (index, input) in input_ids.iter().enumerate() {
            if let Some(t) = *input {
                self.attach_edge(t, Edge::new(id, index))?;
            }
        }

        self.nodes.push(Some(Node {
            id,
            name: name.to_string(),
            op,
            inputs: input_ids,
            outputs: output_ids,
            attributes,
            output_edge_counts: SmallVec::from_elem(0, outputs.len()),
        }));
        self.node_index.insert(name.to_string(), id);

        Ok(id)
    }

    // ========================================================================
    // Edge bookkeeping
    // ========================================================================

    /// Record a consumer edge on a value and bump its producer's cached count
    fn attach_edge(&mut self, value: TensorId, consumer: Edge) -> RewriteResult<()> {
        let v = self.value_mut(value)?;
        v.consumers.push(consumer);
        let producer = v.producer;

        if let Some(p) = producer {
            let node = self.node_mut(p.node)?;
            let count = node.output_edge_counts.get_mut(p.index).ok_or_else(|| {
                RewriteError::InvariantViolation(format!("{} has no output {}", p.node, p.index))
            })?;
            *count += 1;
        }
        Ok(())
    }

    /// Drop a consumer edge from a value and decrement its producer's count
    fn detach_edge(&mut self, value: TensorId, consumer: Edge) -> RewriteResult<()> {
        let v = self.value_mut(value)?;
        let pos = v
            .consumers
            .iter()
            .position(|e| *e == consumer)
            .ok_or(RewriteError::DanglingEdge {
                node: consumer.node,
                input_index: consumer.index,
            })?;
        v.consumers.remove(pos);
        let producer = v.producer;

        if let Some(p) = producer {
            let node = self.node_mut(p.node)?;
            let count = node.output_edge_counts.get_mut(p.index).ok_or_else(|| {
                RewriteError::InvariantViolation(format!("{} has no output {}", p.node, p.index))
            })?;
            *count = count.checked_sub(1).ok_or_else(|| {
                RewriteError::InvariantViolation(format!(
                    "edge count underflow on output {} of {}",
                    p.index, p.node
                ))
            })?;
        }
        Ok(())
    }

    /// Detach every consumer edge from every output of `node`
    ///
    /// The node itself stays. Each detached consumer slot is left empty and
    /// must be re-spliced (see [`Graph::replace_node_input`]) before the
    /// transform returns. Returns the detached consumer ends.
    pub fn remove_node_output_edges(&mut self, node: NodeId) -> RewriteResult<Vec<Edge>> {
        let edges = self.output_edges(node)?;
        let outputs = self.node(node)?.outputs.clone();

        for out in outputs {
            let consumers = std::mem::take(&mut self.value_mut(out)?.consumers);
            for edge in consumers {
                let consumer = self.node_mut(edge.node)?;
                match consumer.inputs.get_mut(edge.index) {
                    Some(slot) if *slot == Some(out) => *slot = None,
                    _ => {
                        return Err(RewriteError::DanglingEdge {
                            node: edge.node,
                            input_index: edge.index,
                        })
                    }
                }
            }
        }

        for count in self.node_mut(node)?.output_edge_counts.iter_mut() {
            *count = 0;
        }

        Ok(edges)
    }

    /// Rewire one input slot of `node` to `new_input`
    ///
    /// The new edge is attached before the old one is detached, so both
    /// producers' cached counts are correct at every step.
    pub fn replace_node_input(
        &mut self,
        node: NodeId,
        input_index: usize,
        new_input: TensorId,
    ) -> RewriteResult<()> {
        let old = {
            let n = self.node(node)?;
            if input_index >= n.inputs.len() {
                return Err(RewriteError::InvalidNode(format!(
                    "{} has no input {}",
                    n.name, input_index
                )));
            }
            n.inputs[input_index]
        };
        self.value(new_input)?;

        if old == Some(new_input) {
            return Ok(());
        }

        let edge = Edge::new(node, input_index);
        self.attach_edge(new_input, edge)?;
        if let Some(old) = old {
            self.detach_edge(old, edge)?;
        }
        self.node_mut(node)?.inputs[input_index] = Some(new_input);

        Ok(())
    }

    // ========================================================================
    // Node removal
    // ========================================================================

    /// Delete a node with no remaining consumers
    ///
    /// Fails with `NodeStillReferenced` if any consumer edge remains and
    /// with `GraphOutputRemoval` if the node produces a graph output. The
    /// node's output values are deleted with it; its ids are never reused.
    pub fn remove_node(&mut self, id: NodeId) -> RewriteResult<Node> {
        let (edges, pinned) = {
            let node = self.node(id)?;
            let pinned = node
                .outputs
                .iter()
                .find(|&&out| self.is_graph_output(out))
                .copied();
            (node.output_edges_count(), pinned)
        };

        if edges != 0 {
            return Err(RewriteError::NodeStillReferenced { node: id, edges });
        }
        if let Some(out) = pinned {
            return Err(RewriteError::GraphOutputRemoval {
                node: id,
                tensor: self.value(out)?.name.clone(),
            });
        }

        let inputs = self.node(id)?.inputs.clone();
        for (index, input) in inputs.into_iter().enumerate() {
            if let Some(t) = input {
                self.detach_edge(t, Edge::new(id, index))?;
            }
        }

        let node = self.nodes[id.index()]
            .take()
            .ok_or(RewriteError::NodeNotFound(id))?;

        for &out in &node.outputs {
            if let Some(value) = self.values[out.index()].take() {
                self.value_index.remove(&value.name);
            }
        }
        self.node_index.remove(&node.name);

        Ok(node)
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    /// Drop initializers nothing reads any more
    ///
    /// Graph inputs and outputs are kept. Returns the number removed.
    pub fn prune_unused_initializers(&mut self) -> usize {
        let unused: Vec<TensorId> = self
            .values()
            .filter(|v| {
                v.is_initializer()
                    && v.consumers.is_empty()
                    && v.producer.is_none()
                    && !v.is_graph_input
                    && !v.is_graph_output
            })
            .map(|v| v.id)
            .collect();

        for &id in &unused {
            if let Some(value) = self.values[id.index()].take() {
                self.value_index.remove(&value.name);
            }
        }

        unused.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;

    fn make_test_graph() -> Graph {
        let mut b = GraphBuilder::new(13);
        b.input("X", &[1, 3, 8, 8]);
        b.input("Z", &[1, 3, 8, 8]);
        b.node("Relu", &["X"], &["relu_out"]).name("relu_0");
        b.node("Sigmoid", &["relu_out"], &["Y"]).name("sigmoid_0");
        b.output("Y");
        b.build().unwrap()
    }

    #[test]
    fn test_add_node_updates_counts() {
        let graph = make_test_graph();

        let relu = graph.find_node("relu_0").unwrap();
        assert_eq!(graph.node(relu).unwrap().output_edges_count(), 1);
        assert_eq!(graph.tensor("X").unwrap().consumers().len(), 1);
    }

    #[test]
    fn test_add_node_rejects_unknown_input() {
        let mut graph = make_test_graph();

        let err = graph
            .add_node("bad", OpIdentity::onnx("Relu", 14), &["missing"], &["o"], IndexMap::new())
            .unwrap_err();
        assert_eq!(err, RewriteError::TensorNotFound("missing".to_string()));
    }

    #[test]
    fn test_replace_node_input() {
        let mut graph = make_test_graph();

        let relu = graph.find_node("relu_0").unwrap();
        let sigmoid = graph.find_node("sigmoid_0").unwrap();
        let z = graph.tensor_id("Z").unwrap();

        graph.replace_node_input(sigmoid, 0, z).unwrap();

        assert_eq!(graph.node(sigmoid).unwrap().input(0), Some(z));
        assert_eq!(graph.node(relu).unwrap().output_edges_count(), 0);
        assert!(graph.tensor("relu_out").unwrap().consumers().is_empty());
        assert_eq!(graph.tensor("Z").unwrap().consumers().len(), 1);
        graph.validate().unwrap();
    }

    #[test]
    fn test_replace_node_input_bad_index() {
        let mut graph = make_test_graph();
        let sigmoid = graph.find_node("sigmoid_0").unwrap();
        let z = graph.tensor_id("Z").unwrap();

        assert!(matches!(
            graph.replace_node_input(sigmoid, 3, z),
            Err(RewriteError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_remove_node_still_referenced() {
        let mut graph = make_test_graph();

        let relu = graph.find_node("relu_0").unwrap();
        assert_eq!(
            graph.remove_node(relu).unwrap_err(),
            RewriteError::NodeStillReferenced { node: relu, edges: 1 }
        );
        assert!(graph.contains_node(relu));
    }

    #[test]
    fn test_remove_node_graph_output_guard() {
        let mut graph = make_test_graph();

        let sigmoid = graph.find_node("sigmoid_0").unwrap();
        assert!(matches!(
            graph.remove_node(sigmoid),
            Err(RewriteError::GraphOutputRemoval { .. })
        ));
    }

    #[test]
    fn test_detach_then_remove() {
        let mut graph = make_test_graph();

        let relu = graph.find_node("relu_0").unwrap();
        let sigmoid = graph.find_node("sigmoid_0").unwrap();
        let x = graph.tensor_id("X").unwrap();

        let detached = graph.remove_node_output_edges(relu).unwrap();
        assert_eq!(detached, vec![Edge::new(sigmoid, 0)]);
        assert_eq!(graph.node(sigmoid).unwrap().input(0), None);

        graph.replace_node_input(sigmoid, 0, x).unwrap();
        let removed = graph.remove_node(relu).unwrap();

        assert_eq!(removed.op_type(), "Relu");
        assert!(!graph.contains_node(relu));
        assert!(graph.tensor_id("relu_out").is_none());
        assert!(graph.find_node("relu_0").is_none());
        assert_eq!(graph.tensor("X").unwrap().consumers(), &[Edge::new(sigmoid, 0)]);
        graph.validate().unwrap();
    }

    #[test]
    fn test_ids_not_reused() {
        let mut graph = make_test_graph();

        let relu = graph.find_node("relu_0").unwrap();
        let sigmoid = graph.find_node("sigmoid_0").unwrap();
        let x = graph.tensor_id("X").unwrap();
        graph.replace_node_input(sigmoid, 0, x).unwrap();
        graph.remove_node(relu).unwrap();

        let fresh = graph
            .add_node("relu_1", OpIdentity::onnx("Relu", 14), &["X"], &["r1"], IndexMap::new())
            .unwrap();
        assert_ne!(fresh, relu);
        assert_eq!(graph.node(relu), Err(RewriteError::NodeNotFound(relu)));
    }

    #[test]
    fn test_overridable_initializer() {
        let mut graph = make_test_graph();

        let z = graph.tensor_id("Z").unwrap();
        let id = graph
            .add_initializer("Z", TensorData::from_f32(vec![1, 3, 8, 8], &[0.0; 192]))
            .unwrap();
        assert_eq!(id, z);
        assert!(graph.tensor("Z").unwrap().is_initializer());

        assert!(matches!(
            graph.add_initializer("Z", TensorData::scalar_f32(1.0)),
            Err(RewriteError::DuplicateTensor(_))
        ));
    }

    #[test]
    fn test_prune_unused_initializers() {
        let mut graph = make_test_graph();
        graph
            .add_initializer("unused", TensorData::vec_i64(&[1, 2]))
            .unwrap();

        assert_eq!(graph.prune_unused_initializers(), 1);
        assert!(graph.tensor_id("unused").is_none());
    }
}
