//! Shape utilities
//!
//! Static shapes are plain `i64` dimension lists; a negative entry marks a
//! dimension that is only known at run time.

/// Calculate total number of elements from shape
pub fn numel(shape: &[i64]) -> usize {
    if shape.is_empty() {
        1 // scalar
    } else {
        shape.iter().map(|&d| d.max(0) as usize).product()
    }
}

/// Rank of the tensor an ONNX Pad `pads` array applies to
///
/// `pads` is laid out as all begin offsets followed by all end offsets, so
/// its length must be even. The rank counts every axis, batch and channel
/// included; a windowed op's own `pads` gives its spatial rank instead.
pub fn rank_of_pads(pads: &[i64]) -> Option<usize> {
    if pads.len() % 2 == 0 {
        Some(pads.len() / 2)
    } else {
        None
    }
}
