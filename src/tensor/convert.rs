//! Tensor conversion utilities
//!
//! Decode little-endian constant bytes into typed Rust values and ndarray
//! views. Integer decoding widens to `i64`; float decoding widens to `f32`
//! only for types that convert losslessly or by plain cast.

use ndarray::{Array, ArrayD, IxDyn};

use crate::error::{RewriteError, RewriteResult};

use super::dtype::{dtype_size, DataType};

/// Decode raw bytes as a sequence of `i64`
///
/// Accepts every fixed-width integer type; other types fail with
/// `InvalidDataType`.
pub fn decode_raw_to_i64(raw: &[u8], dtype: DataType) -> RewriteResult<Vec<i64>> {
    check_alignment(raw, dtype)?;

    match dtype {
        DataType::Int64 => Ok(raw
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect()),
        DataType::Int32 => Ok(raw
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64)
            .collect()),
        DataType::Int16 => Ok(raw
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as i64)
            .collect()),
        DataType::Uint64 => Ok(raw
            .chunks_exact(8)
            .map(|b| u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as i64)
            .collect()),
        DataType::Uint32 => Ok(raw
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64)
            .collect()),
        DataType::Uint16 => Ok(raw
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]) as i64)
            .collect()),
        DataType::Uint8 => Ok(raw.iter().map(|&b| b as i64).collect()),
        DataType::Int8 => Ok(raw.iter().map(|&b| b as i8 as i64).collect()),
        _ => Err(RewriteError::InvalidDataType(dtype as i32)),
    }
}

/// Decode raw bytes as a sequence of `f32`
pub fn decode_raw_to_f32(raw: &[u8], dtype: DataType) -> RewriteResult<Vec<f32>> {
    check_alignment(raw, dtype)?;

    match dtype {
        DataType::Float => Ok(raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()),
        DataType::Double => Ok(raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect()),
        DataType::Bfloat16 => Ok(raw
            .chunks_exact(2)
            .map(|b| f32::from_bits((u16::from_le_bytes([b[0], b[1]]) as u32) << 16))
            .collect()),
        _ => decode_raw_to_i64(raw, dtype).map(|v| v.into_iter().map(|x| x as f32).collect()),
    }
}

/// Decode raw bytes into an `i64` ndarray of the given dims
pub fn raw_to_array_i64(raw: &[u8], dtype: DataType, dims: &[i64]) -> RewriteResult<ArrayD<i64>> {
    let data = decode_raw_to_i64(raw, dtype)?;
    let shape: Vec<usize> = dims.iter().map(|&d| d.max(0) as usize).collect();
    Array::from_shape_vec(IxDyn(&shape), data).map_err(|e| RewriteError::Internal(e.to_string()))
}

/// Decode raw bytes into an `f32` ndarray of the given dims
pub fn raw_to_array_f32(raw: &[u8], dtype: DataType, dims: &[i64]) -> RewriteResult<ArrayD<f32>> {
    let data = decode_raw_to_f32(raw, dtype)?;
    let shape: Vec<usize> = dims.iter().map(|&d| d.max(0) as usize).collect();
    Array::from_shape_vec(IxDyn(&shape), data).map_err(|e| RewriteError::Internal(e.to_string()))
}

fn check_alignment(raw: &[u8], dtype: DataType) -> RewriteResult<()> {
    let elem_size = dtype_size(dtype)?;
    if raw.len() % elem_size != 0 {
        return Err(RewriteError::Internal(format!(
            "{} raw bytes are not a whole number of {} elements",
            raw.len(),
            dtype
        )));
    }
    Ok(())
}
