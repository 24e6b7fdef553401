//! Operator matching for rewrite rules
//!
//! This module centralizes the "is this node the operator I handle?" check.
//!
//! # Overview
//!
//! - [`matcher`]: `is_supported_op` and the [`OpMatcher`] declaration type
//! - [`ops`]: the operator sets the bundled rules declare
//!
//! # Example
//!
//! ```ignore
//! use furiosa_rewriter::pattern::{ops, OpMatcher};
//!
//! if ops::PAD.matches(node) {
//!     // candidate for pad fusion
//! }
//! ```

pub mod matcher;
pub mod ops;

// Re-export main types
pub use matcher::{is_supported_onnx_op, is_supported_op, matches_any, OpMatcher};
pub use ops::{
    AVERAGE_POOL, CAST, CONV, IDENTITY, MAX_POOL, PAD, PAD_ABSORBERS, POOL_OPS,
};
