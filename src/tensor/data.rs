//! Materialized constant payloads
//!
//! `TensorData` is the graph-owned storage behind an initializer: an element
//! type, static dims and a flat little-endian byte buffer.

use crate::error::{RewriteError, RewriteResult};

use super::dtype::{dtype_size, DataType};
use super::shape::numel;

/// Constant tensor payload
#[derive(Debug, Clone, PartialEq)]
pub struct TensorData {
    dtype: DataType,
    dims: Vec<i64>,
    raw: Vec<u8>,
}

impl TensorData {
    /// Wrap raw little-endian bytes
    ///
    /// The length is not checked here; see [`TensorData::validate`].
    pub fn from_raw(dtype: DataType, dims: Vec<i64>, raw: Vec<u8>) -> Self {
        Self { dtype, dims, raw }
    }

    /// Build an `int64` tensor
    pub fn from_i64(dims: Vec<i64>, values: &[i64]) -> Self {
        let raw = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::from_raw(DataType::Int64, dims, raw)
    }

    /// Build an `int32` tensor
    pub fn from_i32(dims: Vec<i64>, values: &[i32]) -> Self {
        let raw = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::from_raw(DataType::Int32, dims, raw)
    }

    /// Build a `float` tensor
    pub fn from_f32(dims: Vec<i64>, values: &[f32]) -> Self {
        let raw = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::from_raw(DataType::Float, dims, raw)
    }

    /// 1-D `int64` tensor, the usual encoding of a `pads` input
    pub fn vec_i64(values: &[i64]) -> Self {
        Self::from_i64(vec![values.len() as i64], values)
    }

    /// Rank-0 `float` tensor
    pub fn scalar_f32(value: f32) -> Self {
        Self::from_f32(vec![], &[value])
    }

    /// Element type
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Static dims
    pub fn dims(&self) -> &[i64] {
        &self.dims
    }

    /// Flat byte buffer
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Element count implied by dims
    pub fn numel(&self) -> usize {
        numel(&self.dims)
    }

    /// Check that the byte length agrees with dims and element type
    pub fn validate(&self, name: &str) -> RewriteResult<()> {
        let expected = self.numel() * dtype_size(self.dtype)?;
        if expected != self.raw.len() {
            return Err(RewriteError::DataLengthMismatch {
                name: name.to_string(),
                expected,
                actual: self.raw.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_i64_layout() {
        let data = TensorData::vec_i64(&[1, -2]);
        assert_eq!(data.dtype(), DataType::Int64);
        assert_eq!(data.dims(), &[2]);
        assert_eq!(data.raw().len(), 16);
        assert_eq!(&data.raw()[..8], &1i64.to_le_bytes());
    }

    #[test]
    fn test_validate_length() {
        assert!(TensorData::scalar_f32(0.0).validate("v").is_ok());

        let bad = TensorData::from_raw(DataType::Int64, vec![2], vec![0; 12]);
        assert_eq!(
            bad.validate("pads"),
            Err(RewriteError::DataLengthMismatch {
                name: "pads".to_string(),
                expected: 16,
                actual: 12,
            })
        );
    }

    #[test]
    fn test_string_payload_rejected() {
        let data = TensorData::from_raw(DataType::String, vec![1], vec![b'a']);
        assert!(data.validate("s").is_err());
    }
}
