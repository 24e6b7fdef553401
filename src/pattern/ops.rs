//! Declared operator sets
//!
//! Since-versions each bundled rule accepts. A version missing here means
//! the rule has not been checked against that schema revision, not that the
//! operator is unsupported by the runtime.

use super::matcher::OpMatcher;

/// Pad (opset 18 added the `axes` input; fusion requires it absent)
pub const PAD: OpMatcher = OpMatcher::onnx("Pad", &[1, 2, 11, 13, 18, 19]);

/// Cast between Pad and its consumer
pub const CAST: OpMatcher = OpMatcher::onnx("Cast", &[1, 6, 9, 13]);

/// Conv
pub const CONV: OpMatcher = OpMatcher::onnx("Conv", &[1, 11]);

/// AveragePool
pub const AVERAGE_POOL: OpMatcher = OpMatcher::onnx("AveragePool", &[7, 10, 11, 19]);

/// MaxPool
pub const MAX_POOL: OpMatcher = OpMatcher::onnx("MaxPool", &[1, 8, 10, 11, 12]);

/// Identity
pub const IDENTITY: OpMatcher = OpMatcher::onnx("Identity", &[1, 13, 14, 16]);

/// Consumers that can absorb a zero-valued spatial pad
pub const PAD_ABSORBERS: &[OpMatcher] = &[CONV, AVERAGE_POOL, MAX_POOL];

/// Pooling operations that carry an explicit `pads` attribute
pub const POOL_OPS: &[&str] = &["AveragePool", "MaxPool"];
