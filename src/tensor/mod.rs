//! Tensor utilities
//!
//! This module provides the value-level pieces the graph IR builds on:
//! - Element types (`dtype`)
//! - Constant payload storage (`data`)
//! - Shape helpers (`shape`)
//! - Decoding constant bytes into typed values and ndarray views (`convert`)
//!
//! # Example
//!
//! ```ignore
//! use furiosa_rewriter::tensor::{TensorData, raw_to_array_i64};
//!
//! let pads = TensorData::vec_i64(&[0, 0, 1, 1, 0, 0, 1, 1]);
//! let array = raw_to_array_i64(pads.raw(), pads.dtype(), pads.dims())?;
//! ```

pub mod convert;
pub mod data;
pub mod dtype;
pub mod shape;

// Re-export commonly used items
pub use convert::{decode_raw_to_f32, decode_raw_to_i64, raw_to_array_f32, raw_to_array_i64};
pub use data::TensorData;
pub use dtype::{dtype_size, DataType};
pub use shape::{numel, rank_of_pads};
