//! Blur-threshold boundary detection and scanline masking.
//!
//! This is the faster, cruder alternative to the clustering pipeline: dark
//! levels are clipped away, the enhanced image is smoothed heavily and
//! thresholded, and the resulting
//! boundary blob is applied by walking outwards from the middle column of
//! each row. It works when the specimen is roughly centered and convex.

use log::debug;
use ndarray::{s, Array2, ArrayView2};
use num_traits::Zero;

use super::convolve::box_blur;
use super::density::enhance;
use super::edges::EDGE_LEVEL;
use super::image::resize_nearest;
use super::normalize::{normalize, renormalize, value_range};
use crate::config::{CoarseConfig, DensityConfig};
use crate::error::{ensure_non_empty, MaskError};

/// Boundary map of a normalized image: pixels at or above `cutoff` after the
/// final smoothing become [`EDGE_LEVEL`], everything else 0.
///
/// The image is first stretched from `[floor, max]` back onto 0-255, so levels
/// at or below `floor` never contribute. An image with no level above `floor`
/// has no boundary.
pub fn coarse_boundary(
    image: ArrayView2<u8>,
    density: &DensityConfig,
    coarse: &CoarseConfig,
) -> Result<Array2<u8>, MaskError> {
    if coarse.final_kernel == 0 {
        return Err(MaskError::InvalidParameter(
            "coarse smoothing kernel must be non-zero".to_string(),
        ));
    }

    let clipped = clip_floor(image, coarse.floor)?;
    let enhanced = enhance(clipped.view(), density)?;
    let smoothed = renormalize(box_blur(enhanced.view(), coarse.final_kernel).view())?;
    let boundary = smoothed.mapv(|v| if v < coarse.cutoff { 0 } else { EDGE_LEVEL });

    debug!(
        "coarse boundary: {} of {} pixels at or above {}",
        boundary.iter().filter(|&&v| v > 0).count(),
        boundary.len(),
        coarse.cutoff
    );
    Ok(boundary)
}

fn clip_floor(image: ArrayView2<u8>, floor: f64) -> Result<Array2<u8>, MaskError> {
    ensure_non_empty(image.dim())?;
    match value_range(image) {
        Some((_, max)) if max > floor => normalize(image, floor, max, true),
        _ => Ok(Array2::zeros(image.dim())),
    }
}

/// Zero everything outside the boundary by scanning each row from its middle.
///
/// For every row, the walk left from the middle column zeroes all pixels left
/// of the first boundary pixel it meets, and the walk right zeroes the first
/// boundary pixel and everything after it. Once a row in the lower half has
/// the boundary under its middle column, that row and all rows below are
/// zeroed and the scan ends.
///
/// A boundary of a different size is resized to the image first.
pub fn apply_scanline<T>(image: &mut Array2<T>, boundary: ArrayView2<u8>) -> Result<(), MaskError>
where
    T: Copy + Zero,
{
    let (rows, cols) = image.dim();
    ensure_non_empty((rows, cols))?;
    ensure_non_empty(boundary.dim())?;

    let resized;
    let boundary = if boundary.dim() == (rows, cols) {
        boundary.reborrow()
    } else {
        resized = resize_nearest(boundary, (rows, cols));
        resized.view()
    };

    let middle = cols / 2;
    for r in 0..rows {
        let line = boundary.row(r);

        let mut col = middle;
        while col > 1 {
            if line[col] == EDGE_LEVEL {
                image.slice_mut(s![r, ..col]).fill(T::zero());
                break;
            }
            col -= 1;
        }

        let mut col = middle;
        while col + 1 < cols {
            if line[col] == EDGE_LEVEL {
                image.slice_mut(s![r, col..]).fill(T::zero());
                break;
            }
            col += 1;
        }

        if r > rows / 2 && line[middle] == EDGE_LEVEL {
            image.slice_mut(s![r.., ..]).fill(T::zero());
            debug!("scanline stopped at row {}", r);
            break;
        }
    }

    Ok(())
}
