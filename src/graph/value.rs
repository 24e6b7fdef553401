//! Value definitions (tensors flowing between nodes)

use std::fmt;

use smallvec::SmallVec;

use crate::tensor::{DataType, TensorData};

use super::node::NodeId;

/// Stable value identifier, never reused within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(usize);

impl TensorId {
    /// Wrap an arena index
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor#{}", self.0)
    }
}

/// One end of an edge: a node and one of its slots
///
/// For a producer the slot is an output index; for a consumer it is an
/// input index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Node on this end
    pub node: NodeId,
    /// Slot index on that node
    pub index: usize,
}

impl Edge {
    /// Create an edge end
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

/// Consumer list; most values feed 1-4 nodes
pub type ConsumerList = SmallVec<[Edge; 4]>;

/// A named value in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub(crate) id: TensorId,
    pub(crate) name: String,
    pub(crate) elem_type: Option<DataType>,
    pub(crate) shape: Option<Vec<i64>>,
    pub(crate) producer: Option<Edge>,
    pub(crate) consumers: ConsumerList,
    pub(crate) initializer: Option<TensorData>,
    pub(crate) is_graph_input: bool,
    pub(crate) is_graph_output: bool,
}

impl Value {
    pub(crate) fn new(
        id: TensorId,
        name: String,
        elem_type: Option<DataType>,
        shape: Option<Vec<i64>>,
    ) -> Self {
        Self {
            id,
            name,
            elem_type,
            shape,
            producer: None,
            consumers: SmallVec::new(),
            initializer: None,
            is_graph_input: false,
            is_graph_output: false,
        }
    }

    /// Value id
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Unique name within the graph
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element type, if known
    pub fn elem_type(&self) -> Option<DataType> {
        self.elem_type
    }

    /// Static shape, if known
    pub fn shape(&self) -> Option<&[i64]> {
        self.shape.as_deref()
    }

    /// Producing node and output slot
    pub fn producer(&self) -> Option<Edge> {
        self.producer
    }

    /// Consumer edges: one entry per consuming input slot
    pub fn consumers(&self) -> &[Edge] {
        &self.consumers
    }

    /// Embedded initializer payload
    pub fn initializer(&self) -> Option<&TensorData> {
        self.initializer.as_ref()
    }

    /// Declared as a graph input
    pub fn is_graph_input(&self) -> bool {
        self.is_graph_input
    }

    /// Declared as a graph output
    pub fn is_graph_output(&self) -> bool {
        self.is_graph_output
    }

    /// Carries an initializer
    pub fn is_initializer(&self) -> bool {
        self.initializer.is_some()
    }
}
