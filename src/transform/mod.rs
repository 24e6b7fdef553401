//! Graph rewrite driver
//!
//! - [`RuleDriver`]: runs an ordered rule set to a fixpoint
//! - [`TransformConfig`]: pass cap, invariant checking, initializer pruning
//! - [`ChangeLog`]: audit trail of applied rewrites
//!
//! # Overview
//!
//! Rules work on a [`Graph`](crate::graph::Graph) and modify it in place.
//! The typical workflow is:
//!
//! 1. Register rules on a `RuleDriver`
//! 2. Call `run` on the graph
//! 3. Inspect the returned `RewriteReport`
//!
//! # Example
//!
//! ```ignore
//! use furiosa_rewriter::transform::{RuleDriver, TransformConfig};
//! use furiosa_rewriter::transformers::{EliminateIdentity, PadFusion};
//!
//! let driver = RuleDriver::new(TransformConfig::default())
//!     .with_rule(EliminateIdentity::new())
//!     .with_rule(PadFusion::new());
//!
//! let report = driver.run(&mut graph)?;
//! for change in &report.changes {
//!     println!("{} {} {}", change.rule, change.node_name, change.effect);
//! }
//! ```

pub mod core;
pub mod log;

// Re-export main types
pub use self::core::{DriverState, RewriteReport, RuleDriver, TransformConfig};
pub use self::log::{ChangeLog, ChangeRecord};
