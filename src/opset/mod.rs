//! Operator schema version lookup
//!
//! A node's numeric version is the *since-version* of the operator schema
//! in effect for the model's imported opset: the newest schema revision not
//! newer than the import. Rules match against since-versions, so a model
//! importing opset 15 carries `Pad` nodes of version 13.
//!
//! | Operator | Since-versions |
//! |----------|----------------|
//! | Pad | 1, 2, 11, 13, 18, 19, 21 |
//! | Conv | 1, 11, 22 |
//! | AveragePool | 1, 7, 10, 11, 19, 22 |
//! | MaxPool | 1, 8, 10, 11, 12, 22 |
//! | Cast | 1, 6, 9, 13, 19, 21 |
//!
//! # Example
//!
//! ```ignore
//! use furiosa_rewriter::opset::{OpSchemaLookup, SinceVersionTable};
//!
//! let table = SinceVersionTable::standard();
//! assert_eq!(table.since_version("Pad", "", 15), Some(13));
//! ```

use rustc_hash::FxHashMap;

use crate::graph::ONNX_DOMAIN;

/// Alias accepted for the default domain
const ONNX_DOMAIN_ALIAS: &str = "ai.onnx";

/// Resolves operator since-versions for an imported opset
///
/// Lookups are read-only and may be shared across threads.
pub trait OpSchemaLookup: Send + Sync {
    /// Since-version of `op_type` in `domain` under opset `opset`
    ///
    /// `None` if the operator is unknown or did not exist yet.
    fn since_version(&self, op_type: &str, domain: &str, opset: i64) -> Option<i64>;
}

/// Static since-version table
#[derive(Debug, Clone, Default)]
pub struct SinceVersionTable {
    entries: FxHashMap<(String, String), Vec<i64>>,
}

impl SinceVersionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table covering the standard operators the bundled rules and tests use
    pub fn standard() -> Self {
        let mut table = Self::new();
        table
            .register("Pad", ONNX_DOMAIN, &[1, 2, 11, 13, 18, 19, 21])
            .register("Conv", ONNX_DOMAIN, &[1, 11, 22])
            .register("AveragePool", ONNX_DOMAIN, &[1, 7, 10, 11, 19, 22])
            .register("MaxPool", ONNX_DOMAIN, &[1, 8, 10, 11, 12, 22])
            .register("Cast", ONNX_DOMAIN, &[1, 6, 9, 13, 19, 21])
            .register("Identity", ONNX_DOMAIN, &[1, 13, 14, 16, 19, 21])
            .register("Relu", ONNX_DOMAIN, &[1, 6, 13, 14])
            .register("Sigmoid", ONNX_DOMAIN, &[1, 6, 13])
            .register("Neg", ONNX_DOMAIN, &[1, 6, 13])
            .register("Add", ONNX_DOMAIN, &[1, 6, 7, 13, 14])
            .register("Mul", ONNX_DOMAIN, &[1, 6, 7, 13, 14])
            .register("Dropout", ONNX_DOMAIN, &[1, 6, 7, 10, 12, 13, 22])
            .register("Reshape", ONNX_DOMAIN, &[1, 5, 13, 14, 19, 21])
            .register("Transpose", ONNX_DOMAIN, &[1, 13, 21])
            .register("BatchNormalization", ONNX_DOMAIN, &[1, 6, 7, 9, 14, 15])
            .register("Gemm", ONNX_DOMAIN, &[1, 6, 7, 9, 11, 13])
            .register("MatMul", ONNX_DOMAIN, &[1, 9, 13]);
        table
    }

    /// Register the since-versions of an operator
    pub fn register(&mut self, op_type: &str, domain: &str, versions: &[i64]) -> &mut Self {
        let mut versions = versions.to_vec();
        versions.sort_unstable();
        versions.dedup();
        self.entries
            .insert((op_type.to_string(), normalize_domain(domain).to_string()), versions);
        self
    }

    /// Check if the table knows an operator
    pub fn contains(&self, op_type: &str, domain: &str) -> bool {
        self.entries
            .contains_key(&(op_type.to_string(), normalize_domain(domain).to_string()))
    }
}

impl OpSchemaLookup for SinceVersionTable {
    fn since_version(&self, op_type: &str, domain: &str, opset: i64) -> Option<i64> {
        let versions = self
            .entries
            .get(&(op_type.to_string(), normalize_domain(domain).to_string()))?;
        versions.iter().rev().find(|&&v| v <= opset).copied()
    }
}

/// Map the `ai.onnx` alias onto the empty default domain
pub fn normalize_domain(domain: &str) -> &str {
    if domain == ONNX_DOMAIN_ALIAS {
        ONNX_DOMAIN
    } else {
        domain
    }
}
