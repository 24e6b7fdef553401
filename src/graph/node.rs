//! Operator nodes
//!
//! A node is one operator instance: a versioned identity, ordered input and
//! output slots referring to values by id, and a bag of typed attributes.

use std::fmt;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::{RewriteError, RewriteResult};

use super::attribute::{AttributeKind, AttributeValue};
use super::value::TensorId;

/// Default (standard ONNX) operator domain
pub const ONNX_DOMAIN: &str = "";

/// Stable node identifier
///
/// Ids index the graph's node arena. A removed node's id is never handed
/// out again by the same graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Wrap an arena index
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Operator identity: type, domain and resolved since-version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpIdentity {
    /// Operator type, e.g. `Conv`
    pub op_type: String,
    /// Operator domain; empty for the default ONNX domain
    pub domain: String,
    /// Opset version in which this operator signature was introduced
    pub since_version: i64,
}

impl OpIdentity {
    /// Identity in the default domain
    pub fn onnx(op_type: impl Into<String>, since_version: i64) -> Self {
        Self {
            op_type: op_type.into(),
            domain: ONNX_DOMAIN.to_string(),
            since_version,
        }
    }

    /// Identity in a custom domain
    pub fn with_domain(
        op_type: impl Into<String>,
        domain: impl Into<String>,
        since_version: i64,
    ) -> Self {
        Self {
            op_type: op_type.into(),
            domain: domain.into(),
            since_version,
        }
    }
}

/// Operator node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) op: OpIdentity,
    /// `None` marks an omitted optional input or a slot detached mid-rewrite
    pub(crate) inputs: Vec<Option<TensorId>>,
    pub(crate) outputs: Vec<TensorId>,
    pub(crate) attributes: IndexMap<String, AttributeValue>,
    /// Cached consumer-edge count per output slot
    pub(crate) output_edge_counts: SmallVec<[usize; 2]>,
}

impl Node {
    /// Node id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator identity
    pub fn op(&self) -> &OpIdentity {
        &self.op
    }

    /// Operator type
    pub fn op_type(&self) -> &str {
        &self.op.op_type
    }

    /// Operator domain
    pub fn domain(&self) -> &str {
        &self.op.domain
    }

    /// Resolved since-version
    pub fn since_version(&self) -> i64 {
        self.op.since_version
    }

    /// Input slots in order
    pub fn inputs(&self) -> &[Option<TensorId>] {
        &self.inputs
    }

    /// Value id at an input slot, if the slot is populated
    pub fn input(&self, index: usize) -> Option<TensorId> {
        self.inputs.get(index).copied().flatten()
    }

    /// Output values in order
    pub fn outputs(&self) -> &[TensorId] {
        &self.outputs
    }

    /// Cached consumer-edge count of one output
    pub fn output_edges_at(&self, index: usize) -> usize {
        self.output_edge_counts.get(index).copied().unwrap_or(0)
    }

    /// Total cached consumer-edge count across all outputs
    pub fn output_edges_count(&self) -> usize {
        self.output_edge_counts.iter().sum()
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// All attributes
    pub fn attributes(&self) -> &IndexMap<String, AttributeValue> {
        &self.attributes
    }

    /// Raw attribute lookup
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Check if node has attribute
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Integer attribute
    pub fn attr_int(&self, name: &str) -> RewriteResult<Option<i64>> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(AttributeValue::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(self.wrong_type(name, AttributeKind::Int, other)),
        }
    }

    /// Float attribute
    pub fn attr_float(&self, name: &str) -> RewriteResult<Option<f32>> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(AttributeValue::Float(v)) => Ok(Some(*v)),
            Some(other) => Err(self.wrong_type(name, AttributeKind::Float, other)),
        }
    }

    /// String attribute
    pub fn attr_str(&self, name: &str) -> RewriteResult<Option<&str>> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(AttributeValue::String(v)) => Ok(Some(v.as_str())),
            Some(other) => Err(self.wrong_type(name, AttributeKind::String, other)),
        }
    }

    /// Integer list attribute
    pub fn attr_ints(&self, name: &str) -> RewriteResult<Option<&[i64]>> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(AttributeValue::Ints(v)) => Ok(Some(v.as_slice())),
            Some(other) => Err(self.wrong_type(name, AttributeKind::Ints, other)),
        }
    }

    /// Float list attribute
    pub fn attr_floats(&self, name: &str) -> RewriteResult<Option<&[f32]>> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(AttributeValue::Floats(v)) => Ok(Some(v.as_slice())),
            Some(other) => Err(self.wrong_type(name, AttributeKind::Floats, other)),
        }
    }

    /// String list attribute
    pub fn attr_strings(&self, name: &str) -> RewriteResult<Option<&[String]>> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(AttributeValue::Strings(v)) => Ok(Some(v.as_slice())),
            Some(other) => Err(self.wrong_type(name, AttributeKind::Strings, other)),
        }
    }

    /// Set or replace an attribute
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute by name
    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.shift_remove(name)
    }

    fn wrong_type(&self, name: &str, expected: AttributeKind, found: &AttributeValue) -> RewriteError {
        RewriteError::WrongAttributeType {
            node: self.name.clone(),
            attribute: name.to_string(),
            expected,
            actual: found.kind(),
        }
    }
}
