//! Compile-time constant resolution
//!
//! Whether a rewrite is legal often depends on values known before the
//! model runs: a pad amount, a fill value. This module answers "is this
//! value a constant?" and hands out read-only typed views of its bytes.
//!
//! A value is constant iff it carries an initializer and is **not** also a
//! graph input; an initializer listed among the inputs is only a default
//! that callers may override at run time.
//!
//! Views borrow graph-owned storage, so they end before the next mutation.
//!
//! # Example
//!
//! ```ignore
//! use furiosa_rewriter::constant::{is_constant, materialize};
//!
//! if is_constant(&graph, pads_id) {
//!     let pads = materialize(&graph, pads_id)?.to_i64_vec()?;
//! }
//! ```

use ndarray::ArrayD;

use crate::error::{RewriteError, RewriteResult};
use crate::graph::{Graph, TensorId};
use crate::tensor::{
    decode_raw_to_f32, decode_raw_to_i64, raw_to_array_f32, raw_to_array_i64, DataType,
};

/// Check if a value is a non-overridable initializer
pub fn is_constant(graph: &Graph, tensor: TensorId) -> bool {
    graph
        .value(tensor)
        .map(|v| v.is_initializer() && !v.is_graph_input())
        .unwrap_or(false)
}

/// Borrow the payload of a constant value
///
/// Fails with `NotConstant` for runtime values and overridable
/// initializers, and with `TensorNotFound` for unknown ids.
pub fn materialize(graph: &Graph, tensor: TensorId) -> RewriteResult<TypedByteView<'_>> {
    let value = graph.value(tensor)?;
    match value.initializer() {
        Some(data) if !value.is_graph_input() => Ok(TypedByteView {
            name: value.name(),
            dtype: data.dtype(),
            dims: data.dims(),
            bytes: data.raw(),
        }),
        _ => Err(RewriteError::NotConstant(value.name().to_string())),
    }
}

/// Read-only typed view over a constant's bytes
#[derive(Debug, Clone, Copy)]
pub struct TypedByteView<'a> {
    name: &'a str,
    dtype: DataType,
    dims: &'a [i64],
    bytes: &'a [u8],
}

impl<'a> TypedByteView<'a> {
    /// Name of the viewed value
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Element type
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Static dims
    pub fn dims(&self) -> &'a [i64] {
        self.dims
    }

    /// Flat little-endian bytes
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// True if every byte is zero (vacuously true for empty tensors)
    pub fn is_all_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Elements widened to `i64`; integer element types only
    pub fn to_i64_vec(&self) -> RewriteResult<Vec<i64>> {
        decode_raw_to_i64(self.bytes, self.dtype)
    }

    /// Elements as `f32`
    pub fn to_f32_vec(&self) -> RewriteResult<Vec<f32>> {
        decode_raw_to_f32(self.bytes, self.dtype)
    }

    /// Elements as an `i64` ndarray shaped by dims
    pub fn to_array_i64(&self) -> RewriteResult<ArrayD<i64>> {
        raw_to_array_i64(self.bytes, self.dtype, self.dims)
    }

    /// Elements as an `f32` ndarray shaped by dims
    pub fn to_array_f32(&self) -> RewriteResult<ArrayD<f32>> {
        raw_to_array_f32(self.bytes, self.dtype, self.dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::tensor::TensorData;

    fn make_test_graph() -> Graph {
        let mut b = GraphBuilder::new(13);
        b.input("X", &[1, 1, 4, 4]);
        b.initializer_i64("pads", &[8], &[0, 0, 1, 1, 0, 0, 1, 1]);
        b.initializer_f32("fill", &[], &[0.0]);
        b.input("bias", &[1]);
        b.initializer_f32("bias", &[1], &[0.5]);
        b.node("Pad", &["X", "pads", "fill"], &["Y"]).name("pad");
        b.output("Y");
        b.build().unwrap()
    }

    #[test]
    fn test_is_constant() {
        let graph = make_test_graph();

        assert!(is_constant(&graph, graph.tensor_id("pads").unwrap()));
        assert!(!is_constant(&graph, graph.tensor_id("X").unwrap()));
        assert!(!is_constant(&graph, graph.tensor_id("Y").unwrap()));
        // overridable initializer
        assert!(!is_constant(&graph, graph.tensor_id("bias").unwrap()));
    }

    #[test]
    fn test_materialize_i64() {
        let graph = make_test_graph();
        let view = materialize(&graph, graph.tensor_id("pads").unwrap()).unwrap();

        assert_eq!(view.name(), "pads");
        assert_eq!(view.dtype(), DataType::Int64);
        assert_eq!(view.to_i64_vec().unwrap(), vec![0, 0, 1, 1, 0, 0, 1, 1]);
        assert_eq!(view.to_array_i64().unwrap().shape(), &[8]);
        assert!(!view.is_all_zero());
    }

    #[test]
    fn test_materialize_zero_fill() {
        let graph = make_test_graph();
        let view = materialize(&graph, graph.tensor_id("fill").unwrap()).unwrap();

        assert!(view.is_all_zero());
        assert_eq!(view.to_f32_vec().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_negative_zero_is_not_all_zero_bytes() {
        let mut graph = make_test_graph();
        let id = graph
            .add_initializer("neg_zero", TensorData::scalar_f32(-0.0))
            .unwrap();

        assert!(!materialize(&graph, id).unwrap().is_all_zero());
    }

    #[test]
    fn test_materialize_not_constant() {
        let graph = make_test_graph();

        assert_eq!(
            materialize(&graph, graph.tensor_id("X").unwrap()).unwrap_err(),
            RewriteError::NotConstant("X".to_string())
        );
        assert_eq!(
            materialize(&graph, graph.tensor_id("bias").unwrap()).unwrap_err(),
            RewriteError::NotConstant("bias".to_string())
        );
    }
}
