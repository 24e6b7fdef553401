//! Tensor element types
//!
//! Element type codes follow the ONNX `TensorProto.DataType` numbering so a
//! model reader can pass its codes straight through.

use std::fmt;

use crate::error::{RewriteError, RewriteResult};

/// Element type of a tensor value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DataType {
    /// Unknown element type
    Undefined = 0,
    /// 32-bit float
    Float = 1,
    /// 8-bit unsigned integer
    Uint8 = 2,
    /// 8-bit signed integer
    Int8 = 3,
    /// 16-bit unsigned integer
    Uint16 = 4,
    /// 16-bit signed integer
    Int16 = 5,
    /// 32-bit signed integer
    Int32 = 6,
    /// 64-bit signed integer
    Int64 = 7,
    /// Variable-length string
    String = 8,
    /// Boolean stored as one byte
    Bool = 9,
    /// IEEE half precision
    Float16 = 10,
    /// 64-bit float
    Double = 11,
    /// 32-bit unsigned integer
    Uint32 = 12,
    /// 64-bit unsigned integer
    Uint64 = 13,
    /// bfloat16
    Bfloat16 = 16,
}

impl TryFrom<i32> for DataType {
    type Error = RewriteError;

    fn try_from(value: i32) -> RewriteResult<Self> {
        Ok(match value {
            0 => DataType::Undefined,
            1 => DataType::Float,
            2 => DataType::Uint8,
            3 => DataType::Int8,
            4 => DataType::Uint16,
            5 => DataType::Int16,
            6 => DataType::Int32,
            7 => DataType::Int64,
            8 => DataType::String,
            9 => DataType::Bool,
            10 => DataType::Float16,
            11 => DataType::Double,
            12 => DataType::Uint32,
            13 => DataType::Uint64,
            16 => DataType::Bfloat16,
            other => return Err(RewriteError::InvalidDataType(other)),
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Size in bytes of one element
///
/// Fails for types without a fixed width (`String`, `Undefined`).
pub fn dtype_size(dtype: DataType) -> RewriteResult<usize> {
    match dtype {
        DataType::Uint8 | DataType::Int8 | DataType::Bool => Ok(1),
        DataType::Uint16 | DataType::Int16 | DataType::Float16 | DataType::Bfloat16 => Ok(2),
        DataType::Float | DataType::Int32 | DataType::Uint32 => Ok(4),
        DataType::Double | DataType::Int64 | DataType::Uint64 => Ok(8),
        DataType::String | DataType::Undefined => Err(RewriteError::InvalidDataType(dtype as i32)),
    }
}
