//! Core rewrite loop
//!
//! The driver walks the graph in topological order and, for every node,
//! asks each registered rule whether it applies. The first rule whose
//! condition holds is applied immediately; the scan cursor then follows the
//! reported effect. Passes repeat until one full pass rewrites nothing.

use tracing::{debug, debug_span, info, trace, warn};

use crate::error::{RewriteError, RewriteResult};
use crate::graph::{Graph, NodeId};
use crate::traits::{RewriteEffect, RewriteRule};
use crate::transform::log::{ChangeLog, ChangeRecord};

/// Transform configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    /// Maximum full passes before giving up with `IterationCapExceeded`
    pub max_iterations: usize,
    /// Run `Graph::validate` after every applied rewrite
    pub verify_invariants: bool,
    /// Drop unreferenced initializers after a successful run
    pub prune_initializers: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            verify_invariants: cfg!(debug_assertions),
            prune_initializers: true,
        }
    }
}

impl TransformConfig {
    /// Set the pass cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Toggle per-rewrite invariant checks
    pub fn with_verify_invariants(mut self, verify: bool) -> Self {
        self.verify_invariants = verify;
        self
    }

    /// Toggle initializer pruning
    pub fn with_prune_initializers(mut self, prune: bool) -> Self {
        self.prune_initializers = prune;
        self
    }
}

/// Driver state machine
///
/// `Scanning -> Applying -> Scanning ... -> Done`, tracked per visited node;
/// a pass in which every node reaches `Done` without a rewrite ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Looking for a rule whose condition holds
    Scanning,
    /// Running a transform
    Applying,
    /// No rule left to try at this site
    Done,
}

/// Summary of a driver run
#[derive(Debug, Clone, Default)]
pub struct RewriteReport {
    /// Passes performed, including the final quiet pass
    pub passes: usize,
    /// Applied rewrites in order
    pub changes: ChangeLog,
    /// Initializers dropped after rewriting
    pub initializers_pruned: usize,
    /// Live nodes before the run
    pub nodes_before: usize,
    /// Live nodes after the run
    pub nodes_after: usize,
}

impl RewriteReport {
    /// Number of applied rewrites
    pub fn rewrites(&self) -> usize {
        self.changes.len()
    }

    /// Check if nothing was rewritten
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }

    /// Nodes removed by the run
    pub fn nodes_removed(&self) -> usize {
        self.nodes_before.saturating_sub(self.nodes_after)
    }
}

/// Rule driver
///
/// Owns an ordered list of rules. Registration order is priority order: for
/// a given node the first rule whose condition holds wins.
///
/// A run is all-or-nothing: the graph is snapshotted up front and restored
/// if any transform fails, so callers see either the fully rewritten graph
/// or the original one.
pub struct RuleDriver {
    rules: Vec<Box<dyn RewriteRule>>,
    config: TransformConfig,
}

impl RuleDriver {
    /// Create a driver with no rules
    pub fn new(config: TransformConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    /// Append a rule (builder style)
    pub fn with_rule<R: RewriteRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Append a boxed rule
    pub fn register(&mut self, rule: Box<dyn RewriteRule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Registered rule names in priority order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Current configuration
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Rewrite `graph` in place until no rule fires
    ///
    /// On error the graph is restored to its state before the call.
    pub fn run(&self, graph: &mut Graph) -> RewriteResult<RewriteReport> {
        let snapshot = graph.clone();

        match self.run_to_fixpoint(graph) {
            Ok(report) => Ok(report),
            Err(err) => {
                warn!(error = %err, "rewrite aborted, restoring original graph");
                *graph = snapshot;
                Err(err)
            }
        }
    }

    fn run_to_fixpoint(&self, graph: &mut Graph) -> RewriteResult<RewriteReport> {
        let mut report = RewriteReport {
            nodes_before: graph.node_count(),
            ..Default::default()
        };
        let mut last_fired: Vec<String> = Vec::new();

        loop {
            if report.passes >= self.config.max_iterations {
                return Err(RewriteError::IterationCapExceeded {
                    passes: report.passes,
                    rules: last_fired,
                });
            }
            report.passes += 1;

            let span = debug_span!("pass", pass = report.passes);
            let _enter = span.enter();

            let fired = self.run_pass(graph, report.passes, &mut report.changes)?;
            if fired.is_empty() {
                trace!(state = ?DriverState::Done, "fixpoint reached");
                break;
            }
            debug!(rules = ?fired, "pass rewrote graph");
            last_fired = fired;
        }

        if self.config.prune_initializers {
            report.initializers_pruned = graph.prune_unused_initializers();
        }
        report.nodes_after = graph.node_count();

        info!(
            passes = report.passes,
            rewrites = report.rewrites(),
            nodes_before = report.nodes_before,
            nodes_after = report.nodes_after,
            initializers_pruned = report.initializers_pruned,
            "rewrite converged"
        );

        Ok(report)
    }

    /// One scan over a topological snapshot; returns the rules that fired
    fn run_pass(
        &self,
        graph: &mut Graph,
        pass: usize,
        log: &mut ChangeLog,
    ) -> RewriteResult<Vec<String>> {
        let mut fired: Vec<String> = Vec::new();

        for node in graph.topological_order() {
            let mut state = DriverState::Scanning;
            let mut selected: Option<&dyn RewriteRule> = None;
            let mut retried = false;

            while state != DriverState::Done {
                match state {
                    DriverState::Scanning => {
                        selected = self.select_rule(graph, node);
                        state = if selected.is_some() {
                            DriverState::Applying
                        } else {
                            DriverState::Done
                        };
                    }
                    DriverState::Applying => {
                        let Some(rule) = selected.take() else {
                            state = DriverState::Done;
                            continue;
                        };
                        let effect = self.apply_rule(graph, rule, node, pass, log)?;
                        if effect.is_change() && !fired.iter().any(|r| r == rule.name()) {
                            fired.push(rule.name().to_string());
                        }

                        // a modified node gets one more look before the cursor moves on
                        state = match effect {
                            RewriteEffect::NodeModified if !retried => {
                                retried = true;
                                DriverState::Scanning
                            }
                            _ => DriverState::Done,
                        };
                    }
                    DriverState::Done => {}
                }
            }
        }

        Ok(fired)
    }

    /// First rule targeting the node whose condition holds
    fn select_rule(&self, graph: &Graph, node: NodeId) -> Option<&dyn RewriteRule> {
        let op_type = graph.node(node).ok()?.op_type();
        self.rules
            .iter()
            .map(Box::as_ref)
            .filter(|r| r.targets(op_type))
            .find(|r| r.satisfies_condition(graph, node))
    }

    fn apply_rule(
        &self,
        graph: &mut Graph,
        rule: &dyn RewriteRule,
        node: NodeId,
        pass: usize,
        log: &mut ChangeLog,
    ) -> RewriteResult<RewriteEffect> {
        let node_name = graph.node(node)?.name().to_string();
        let effect = rule.apply(graph, node)?;

        if !effect.is_change() {
            trace!(rule = rule.name(), node = %node_name, "rule applied without change");
            return Ok(effect);
        }

        debug!(rule = rule.name(), node = %node_name, effect = %effect, "rewrite applied");

        if self.config.verify_invariants {
            graph.validate()?;
        }

        log.push(ChangeRecord {
            pass,
            rule: rule.name().to_string(),
            node,
            node_name,
            effect,
        });

        Ok(effect)
    }
}
