//! Size Estimation Module
//!
//! Byte sizes are the UTF-8 length of the canonical JSON serialization.
//! The same estimator is used for writes, deletions and eviction so the
//! used-space counter never drifts.

use serde::Serialize;

use crate::error::Result;

/// Estimates the stored size of a value in bytes.
pub fn estimate_size<T: Serialize + ?Sized>(value: &T) -> Result<usize> {
    Ok(serde_json::to_string(value)?.len())
}

/// Estimates the combined size of a list of values, item by item.
///
/// This is the sum of the item sizes, not the size of the serialized list
/// (which would also count brackets and separators).
pub fn estimate_list_size<T: Serialize>(items: &[T]) -> Result<usize> {
    items
        .iter()
        .try_fold(0usize, |total, item| Ok(total + estimate_size(item)?))
}
