//! Rewrite rules module
//!
//! Ready-to-use rules for the driver:
//!
//! - **Fusion**: [`PadFusion`] folds a zero Pad into Conv / pooling pads
//! - **Elimination**: [`EliminateIdentity`] removes pass-through nodes
//! - **Canonicalization**: [`ExplicitValidPadding`] turns `auto_pad="VALID"`
//!   into explicit zero pads
//!
//! # Overview
//!
//! Each rule implements [`RewriteRule`](crate::traits::RewriteRule) and can
//! be registered on a [`RuleDriver`] individually or through a preset.
//!
//! # Using OptimizationPipeline
//!
//! ```ignore
//! use furiosa_rewriter::transformers::OptimizationPipeline;
//!
//! let pipeline = OptimizationPipeline::default();
//! let outcome = pipeline.optimize(&mut graph);
//! if let Some(report) = outcome.report() {
//!     println!("{} rewrites in {} passes", report.rewrites(), report.passes);
//! }
//! ```

/// Common utilities
pub mod common;
/// Elimination rules
pub mod eliminate;
/// Explicit VALID padding
pub mod explicit_padding;
/// Pad fusion
pub mod fuse_pad;

pub use eliminate::EliminateIdentity;
pub use explicit_padding::ExplicitValidPadding;
pub use fuse_pad::PadFusion;

use tracing::warn;

use crate::error::{RewriteError, RewriteResult};
use crate::graph::Graph;
use crate::transform::{RewriteReport, RuleDriver, TransformConfig};

/// Rule-set preset plus driver configuration
#[derive(Debug, Clone)]
pub struct OptimizationPipeline {
    /// Enable Pad fusion
    pub pad_fusion: bool,
    /// Enable Identity elimination
    pub eliminate_identity: bool,
    /// Enable VALID padding canonicalization
    pub explicit_valid_padding: bool,
    /// Driver configuration
    pub config: TransformConfig,
}

impl Default for OptimizationPipeline {
    fn default() -> Self {
        Self {
            pad_fusion: true,
            eliminate_identity: true,
            explicit_valid_padding: true,
            config: TransformConfig::default(),
        }
    }
}

impl OptimizationPipeline {
    /// Create a new pipeline with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable only fusion (and the canonicalization feeding it)
    pub fn fuse_only() -> Self {
        Self {
            eliminate_identity: false,
            ..Self::default()
        }
    }

    /// Enable only elimination
    pub fn eliminate_only() -> Self {
        Self {
            pad_fusion: false,
            explicit_valid_padding: false,
            ..Self::default()
        }
    }

    /// Replace the driver configuration
    pub fn with_config(mut self, config: TransformConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a driver with the enabled rules in priority order
    pub fn build_driver(&self) -> RuleDriver {
        let mut driver = RuleDriver::new(self.config.clone());
        if self.eliminate_identity {
            driver.register(Box::new(EliminateIdentity::new()));
        }
        if self.explicit_valid_padding {
            driver.register(Box::new(ExplicitValidPadding::new()));
        }
        if self.pad_fusion {
            driver.register(Box::new(PadFusion::new()));
        }
        driver
    }

    /// Run the pipeline, propagating failures
    pub fn run(&self, graph: &mut Graph) -> RewriteResult<RewriteReport> {
        self.build_driver().run(graph)
    }

    /// Run the pipeline, degrading failures to a skipped optimization
    ///
    /// The graph is left exactly as it was when the run fails.
    pub fn optimize(&self, graph: &mut Graph) -> OptimizeOutcome {
        match self.run(graph) {
            Ok(report) => OptimizeOutcome::Optimized(report),
            Err(err) => {
                warn!(error = %err, "optimization skipped");
                OptimizeOutcome::Skipped(err)
            }
        }
    }
}

/// Result of [`OptimizationPipeline::optimize`]
#[derive(Debug, Clone)]
pub enum OptimizeOutcome {
    /// The rule set reached a fixpoint
    Optimized(RewriteReport),
    /// The run failed and the graph was restored
    Skipped(RewriteError),
}

impl OptimizeOutcome {
    /// Check if the graph was optimized
    pub fn is_optimized(&self) -> bool {
        matches!(self, OptimizeOutcome::Optimized(_))
    }

    /// Report of a successful run
    pub fn report(&self) -> Option<&RewriteReport> {
        match self {
            OptimizeOutcome::Optimized(report) => Some(report),
            OptimizeOutcome::Skipped(_) => None,
        }
    }

    /// Error that caused the run to be skipped
    pub fn error(&self) -> Option<&RewriteError> {
        match self {
            OptimizeOutcome::Optimized(_) => None,
            OptimizeOutcome::Skipped(err) => Some(err),
        }
    }
}
