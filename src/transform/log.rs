//! Change log
//!
//! Every applied rewrite is recorded as `(pass, rule, node, effect)` so
//! callers can audit what the driver did without re-diffing graphs.

use indexmap::IndexMap;

use crate::graph::NodeId;
use crate::traits::RewriteEffect;

/// One applied rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// 1-based pass number
    pub pass: usize,
    /// Rule that fired
    pub rule: String,
    /// Candidate node
    pub node: NodeId,
    /// Candidate name, kept because removed nodes can no longer be looked up
    pub node_name: String,
    /// Reported effect
    pub effect: RewriteEffect,
}

/// Ordered record of applied rewrites
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLog {
    records: Vec<ChangeRecord>,
}

impl ChangeLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn push(&mut self, record: ChangeRecord) {
        self.records.push(record);
    }

    /// All records in application order
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Iterate over records
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.records.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// How many times `rule` fired
    pub fn count_by_rule(&self, rule: &str) -> usize {
        self.records.iter().filter(|r| r.rule == rule).count()
    }

    /// Firing counts per rule, in first-fired order
    pub fn rule_counts(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for record in &self.records {
            *counts.entry(record.rule.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of records with the given effect
    pub fn count_effect(&self, effect: RewriteEffect) -> usize {
        self.records.iter().filter(|r| r.effect == effect).count()
    }

    /// Records produced during one pass
    pub fn pass_records(&self, pass: usize) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(move |r| r.pass == pass)
    }
}

impl<'a> IntoIterator for &'a ChangeLog {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pass: usize, rule: &str, node: usize, effect: RewriteEffect) -> ChangeRecord {
        ChangeRecord {
            pass,
            rule: rule.to_string(),
            node: NodeId::new(node),
            node_name: format!("n{}", node),
            effect,
        }
    }

    #[test]
    fn test_counts() {
        let mut log = ChangeLog::new();
        log.push(record(1, "ExplicitValidPadding", 1, RewriteEffect::NodeModified));
        log.push(record(2, "PadFusion", 0, RewriteEffect::NodeRemoved));
        log.push(record(2, "PadFusion", 3, RewriteEffect::NodeRemoved));

        assert_eq!(log.len(), 3);
        assert_eq!(log.count_by_rule("PadFusion"), 2);
        assert_eq!(log.count_by_rule("EliminateIdentity"), 0);
        assert_eq!(log.count_effect(RewriteEffect::NodeRemoved), 2);
        assert_eq!(log.pass_records(2).count(), 2);

        let counts = log.rule_counts();
        let order: Vec<_> = counts.keys().map(|s| s.as_str()).collect();
        assert_eq!(order, vec!["ExplicitValidPadding", "PadFusion"]);
    }

    #[test]
    fn test_empty() {
        let log = ChangeLog::new();
        assert!(log.is_empty());
        assert!(log.rule_counts().is_empty());
        assert_eq!((&log).into_iter().count(), 0);
    }
}
