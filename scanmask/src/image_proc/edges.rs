//! Casing outline extraction from a clustered palette image.

use ndarray::{Array2, ArrayView2};

use super::convolve::sobel_magnitude;
use crate::error::{ensure_non_empty, MaskError};

/// Level used for active pixels in binary edge grids.
pub const EDGE_LEVEL: u8 = 255;

/// Mark the brightest palette level, taken to be the casing, as [`EDGE_LEVEL`].
pub fn select_brightest(palette: ArrayView2<u8>) -> Result<Array2<u8>, MaskError> {
    ensure_non_empty(palette.dim())?;
    let brightest = palette.iter().copied().max().unwrap_or(0);
    Ok(palette.mapv(|v| if v == brightest { EDGE_LEVEL } else { 0 }))
}

/// Sobel gradient magnitude scaled so the strongest response is 255.
///
/// Scaling truncates. A flat input has no gradient and returns all zero.
pub fn gradient_magnitude(binary: ArrayView2<u8>) -> Result<Array2<u8>, MaskError> {
    ensure_non_empty(binary.dim())?;
    let magnitude = sobel_magnitude(binary);
    let peak = magnitude.iter().copied().fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return Ok(Array2::zeros(binary.dim()));
    }
    Ok(magnitude.mapv(|m| (m / peak * 255.0) as u8))
}

/// Binary outline of the brightest cluster: any gradient response becomes [`EDGE_LEVEL`].
pub fn edges(palette: ArrayView2<u8>) -> Result<Array2<u8>, MaskError> {
    let casing = select_brightest(palette)?;
    Ok(binarize_edges(gradient_magnitude(casing.view())?.view()))
}

/// Threshold a magnitude grid at zero into {0, [`EDGE_LEVEL`]}.
pub fn binarize_edges(magnitude: ArrayView2<u8>) -> Array2<u8> {
    magnitude.mapv(|m| if m > 0 { EDGE_LEVEL } else { 0 })
}
