//! Operator identity matching
//!
//! Rules never compare op types or versions by hand; they declare an
//! [`OpMatcher`] and ask it. Keeping the check in one place stops rules from
//! drifting apart as supported version sets change.

use crate::graph::{Node, ONNX_DOMAIN};
use crate::opset::normalize_domain;

/// Check op type, domain and since-version membership
///
/// The match is exact on type and (normalized) domain; the node's
/// since-version must be one of `versions`.
pub fn is_supported_op(node: &Node, op_type: &str, versions: &[i64], domain: &str) -> bool {
    node.op_type() == op_type
        && normalize_domain(node.domain()) == normalize_domain(domain)
        && versions.contains(&node.since_version())
}

/// [`is_supported_op`] for the default ONNX domain
pub fn is_supported_onnx_op(node: &Node, op_type: &str, versions: &[i64]) -> bool {
    is_supported_op(node, op_type, versions, ONNX_DOMAIN)
}

/// Declared supported operator set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpMatcher {
    /// Operator type
    pub op_type: &'static str,
    /// Operator domain
    pub domain: &'static str,
    /// Accepted since-versions
    pub versions: &'static [i64],
}

impl OpMatcher {
    /// Matcher in the default domain
    pub const fn onnx(op_type: &'static str, versions: &'static [i64]) -> Self {
        Self {
            op_type,
            domain: ONNX_DOMAIN,
            versions,
        }
    }

    /// Check a node against this declaration
    pub fn matches(&self, node: &Node) -> bool {
        is_supported_op(node, self.op_type, self.versions, self.domain)
    }
}

/// Check a node against any of several declarations
pub fn matches_any(node: &Node, matchers: &[OpMatcher]) -> bool {
    matchers.iter().any(|m| m.matches(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;

    #[test]
    fn test_version_membership() {
        let mut b = GraphBuilder::new(17);
        b.input("X", &[1, 1, 4, 4]);
        b.node("Relu", &["X"], &["Y"]).name("relu");
        b.output("Y");
        let graph = b.build().unwrap();
        let relu = graph.node(graph.find_node("relu").unwrap()).unwrap();

        assert_eq!(relu.since_version(), 14);
        assert!(is_supported_onnx_op(relu, "Relu", &[13, 14]));
        assert!(!is_supported_onnx_op(relu, "Relu", &[6, 13]));
        assert!(!is_supported_onnx_op(relu, "Sigmoid", &[14]));
        assert!(is_supported_op(relu, "Relu", &[14], "ai.onnx"));
        assert!(!is_supported_op(relu, "Relu", &[14], "com.microsoft"));
    }

    #[test]
    fn test_op_matcher() {
        const RELU: OpMatcher = OpMatcher::onnx("Relu", &[6, 13, 14]);
        const NEG: OpMatcher = OpMatcher::onnx("Neg", &[13]);

        let mut b = GraphBuilder::new(14);
        b.input("X", &[4]);
        b.node("Relu", &["X"], &["Y"]).name("relu");
        b.output("Y");
        let graph = b.build().unwrap();
        let relu = graph.node(graph.find_node("relu").unwrap()).unwrap();

        assert!(RELU.matches(relu));
        assert!(!NEG.matches(relu));
        assert!(matches_any(relu, &[NEG, RELU]));
    }
}
