//! Error types for furiosa-rewriter
//!
//! This module defines all error types used throughout the crate.
//!
//! A rule declining to fire is never an error: preconditions return `bool`.
//! Everything here signals either a caller mistake (asking for a missing
//! node, querying a runtime value as a constant) or a broken bookkeeping
//! invariant inside a transform, which aborts the whole rewrite run.

use thiserror::Error;

use crate::graph::{AttributeKind, NodeId};

/// Main error type for graph rewriting operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewriteError {
    /// Node id does not refer to a live node
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Tensor name does not refer to a live value
    #[error("Tensor not found: {0}")]
    TensorNotFound(String),

    /// A node was deleted while consumers still read its outputs
    #[error("Node {node} still has {edges} consumer edge(s)")]
    NodeStillReferenced {
        /// The node that was about to be removed
        node: NodeId,
        /// Number of live consumer edges
        edges: usize,
    },

    /// A node producing a declared graph output was about to be removed
    #[error("Node {node} produces graph output '{tensor}' and cannot be removed")]
    GraphOutputRemoval {
        /// The node that was about to be removed
        node: NodeId,
        /// The pinned output
        tensor: String,
    },

    /// An input slot references a value that no longer exists
    #[error("Dangling edge: input {input_index} of node {node}")]
    DanglingEdge {
        /// Consumer node
        node: NodeId,
        /// Input slot on the consumer
        input_index: usize,
    },

    /// Generic structural invariant failure found by graph validation
    #[error("Graph invariant violated: {0}")]
    InvariantViolation(String),

    /// A non-constant tensor was materialized
    #[error("Tensor is not a compile-time constant: {0}")]
    NotConstant(String),

    /// Attribute exists but holds a different kind of value
    #[error("Attribute '{attribute}' on node '{node}' is {actual}, expected {expected}")]
    WrongAttributeType {
        /// Node name
        node: String,
        /// Attribute name
        attribute: String,
        /// Requested kind
        expected: AttributeKind,
        /// Stored kind
        actual: AttributeKind,
    },

    /// Unknown or unsupported element type code
    #[error("Invalid data type: {0}")]
    InvalidDataType(i32),

    /// Constant payload size does not agree with its dims and element type
    #[error("Tensor '{name}' holds {actual} bytes, expected {expected}")]
    DataLengthMismatch {
        /// Tensor name
        name: String,
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },

    /// Two values were registered under one name
    #[error("Duplicate tensor name: {0}")]
    DuplicateTensor(String),

    /// Node is malformed (wrong arity, bad index)
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// The driver did not reach a fixpoint within its pass budget
    #[error("Rewrite did not converge after {passes} passes (rules still firing: {rules:?})")]
    IterationCapExceeded {
        /// Passes performed
        passes: usize,
        /// Rules that fired during the last pass
        rules: Vec<String>,
    },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RewriteError {
    /// True for bookkeeping failures that indicate a driver or rule bug
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RewriteError::NodeStillReferenced { .. }
                | RewriteError::GraphOutputRemoval { .. }
                | RewriteError::DanglingEdge { .. }
                | RewriteError::InvariantViolation(_)
        )
    }
}

/// Result type alias for rewrite operations
pub type RewriteResult<T> = Result<T, RewriteError>;
