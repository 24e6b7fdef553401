//! # Furiosa Rewriter
//!
//! Rule-based graph rewriting for ONNX-style dataflow graphs.
//!
//! This crate provides an in-memory graph IR and a driver that applies
//! local rewrite rules to it until a fixpoint, keeping the graph
//! semantically equivalent at every step.
//!
//! ## Features
//!
//! - **Graph IR**: arena-backed nodes and values with checked edge bookkeeping
//! - **Constant Resolution**: typed read-only views over initializer bytes
//! - **Rule Driver**: fixpoint iteration with a pass cap and a change log
//! - **Pad Fusion**: fold zero spatial padding into Conv / pooling nodes
//!
//! ## Example
//!
//! ```ignore
//! use furiosa_rewriter::prelude::*;
//!
//! let mut b = GraphBuilder::new(13);
//! b.input("X", &[1, 3, 32, 32]);
//! b.initializer_i64("pads", &[8], &[0, 0, 1, 1, 0, 0, 1, 1]);
//! b.initializer_f32("W", &[8, 3, 3, 3], &weights);
//! b.node("Pad", &["X", "pads"], &["padded"]);
//! b.node("Conv", &["padded", "W"], &["Y"]).attr("kernel_shape", vec![3i64, 3]);
//! b.output("Y");
//!
//! let mut graph = b.build()?;
//! let report = OptimizationPipeline::default().run(&mut graph)?;
//! println!("{} rewrites", report.rewrites());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

pub mod builder;
pub mod constant;
pub mod error;
pub mod graph;
pub mod opset;
pub mod pattern;
pub mod tensor;
pub mod traits;
pub mod transform;
pub mod transformers;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use furiosa_rewriter::prelude::*`
pub mod prelude {
    pub use crate::builder::GraphBuilder;
    pub use crate::constant::{is_constant, materialize, TypedByteView};
    pub use crate::error::{RewriteError, RewriteResult};
    pub use crate::graph::{AttributeValue, Graph, Node, NodeId, OpIdentity, TensorId, Value};
    pub use crate::opset::{OpSchemaLookup, SinceVersionTable};
    pub use crate::pattern::{is_supported_op, OpMatcher};
    pub use crate::tensor::{DataType, TensorData};
    pub use crate::traits::{RewriteEffect, RewriteRule};
    pub use crate::transform::{ChangeLog, ChangeRecord, RewriteReport, RuleDriver, TransformConfig};
    pub use crate::transformers::{
        EliminateIdentity, ExplicitValidPadding, OptimizationPipeline, OptimizeOutcome, PadFusion,
    };
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{RewriteError, RewriteResult};
pub use graph::Graph;
pub use traits::{RewriteEffect, RewriteRule};

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
