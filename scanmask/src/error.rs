//! Error types shared by the mask-generation stages.

use thiserror::Error;

/// Errors that can occur while building or applying a mask.
///
/// Every stage fails fast with one of these at the point where the
/// precondition is violated. Nothing in the pipeline retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaskError {
    #[error("Invalid intensity range: high ({high}) must be greater than low ({low})")]
    InvalidRange { low: f64, high: f64 },
    #[error("Operation received an empty {rows}x{cols} grid")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("Seed point ({row}, {col}) lies outside the {rows}x{cols} grid")]
    SeedOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("Seed point ({row}, {col}) lies on a wall or edge pixel")]
    SeedOnBarrier { row: usize, col: usize },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Reject grids with a zero dimension.
pub(crate) fn ensure_non_empty(dim: (usize, usize)) -> Result<(), MaskError> {
    let (rows, cols) = dim;
    if rows == 0 || cols == 0 {
        return Err(MaskError::EmptyGrid { rows, cols });
    }
    Ok(())
}

/// Reject ranges where `high <= low`, including NaN bounds.
pub(crate) fn ensure_range(low: f64, high: f64) -> Result<(), MaskError> {
    if !(high > low) {
        return Err(MaskError::InvalidRange { low, high });
    }
    Ok(())
}
