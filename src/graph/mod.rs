//! Graph IR for rewriting
//!
//! This module provides the in-memory dataflow graph the rewriter mutates:
//!
//! - [`Graph`]: arena-backed container owning all nodes and values
//! - [`Node`]: one operator instance with versioned identity and attributes
//! - [`Value`]: a named tensor slot with producer/consumer edges
//! - [`AttributeValue`]: typed attribute union
//!
//! # Overview
//!
//! Nodes and values live in append-only arenas addressed by [`NodeId`] and
//! [`TensorId`]. Edges are stored on values (one producer, a list of
//! consumer slots) and mirrored by a cached consumer-edge count per node
//! output. The mutators keep both sides in agreement; `validate` checks it.
//!
//! # Example
//!
//! ```ignore
//! use furiosa_rewriter::builder::GraphBuilder;
//!
//! let mut b = GraphBuilder::new(13);
//! b.input("X", &[1, 3, 224, 224]);
//! b.node("Relu", &["X"], &["Y"]);
//! b.output("Y");
//! let graph = b.build()?;
//!
//! let relu = graph.find_node("Relu_0").unwrap();
//! assert_eq!(graph.node(relu)?.output_edges_count(), 0);
//! assert!(graph.produces_graph_output(relu));
//! ```
//!
//! # Primitives
//!
//! | Method | Effect |
//! |--------|--------|
//! | `node` / `tensor` | lookup, `NotFound` if absent |
//! | `produces_graph_output` | graph-output guard |
//! | `remove_node_output_edges` | detach all consumers of a node |
//! | `replace_node_input` | rewire one input slot |
//! | `remove_node` | delete an unreferenced node |

pub mod accessors;
pub mod attribute;
pub mod context;
pub mod mutators;
pub mod node;
pub mod validation;
pub mod value;

// Re-export main types
pub use attribute::{AttributeKind, AttributeValue};
pub use context::Graph;
pub use node::{Node, NodeId, OpIdentity, ONNX_DOMAIN};
pub use validation::ValidationResult;
pub use value::{ConsumerList, Edge, TensorId, Value};
