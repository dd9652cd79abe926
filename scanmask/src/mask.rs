//! Mask generation and application entry points.
//!
//! [`create_mask`] chains the image processing stages into one call:
//!
//! 1. normalize raw samples onto 0-255
//! 2. local-contrast enhancement
//! 3. downsample by `downsample_factor`
//! 4. k-means intensity clustering
//! 5. outline of the brightest cluster (the casing)
//! 6. prune interior edge fragments
//! 7. frame the border and flood fill from the seed
//! 8. reclaim the specimen side of the edge band
//! 9. upsample back to full resolution as a {0, 1} mask

use log::debug;
use ndarray::{Array2, ArrayView2, Zip};
use num_traits::{ToPrimitive, Zero};

use crate::config::{Frame, MaskParams, SeedPoint};
use crate::error::{ensure_non_empty, MaskError};
use crate::image_proc::edges::{binarize_edges, gradient_magnitude, select_brightest};
use crate::image_proc::fill::{apply_frame, fill, reclaim_boundary};
use crate::image_proc::image::{downsample, resize_nearest};
use crate::image_proc::{components, density, normalize, segment};

/// Build a binary region-of-interest mask for a raw scan slice.
///
/// # Arguments
/// * `image` - Raw slice samples
/// * `frame` - Border margins forced to background, in full-resolution pixels
/// * `seed` - A point inside the specimen, in full-resolution pixels
/// * `min_size_check` - Keep large interior edge components instead of erasing them
/// * `params` - Tuning for every stage
///
/// # Returns
/// * A mask with the dimensions of `image`, 1 inside the specimen and 0 elsewhere
///
/// # Errors
/// * `MaskError::EmptyGrid` for an empty image
/// * `MaskError::SeedOutOfBounds` when the seed is outside the image
/// * `MaskError::SeedOnBarrier` when the seed lands on the casing outline or frame
/// * `MaskError::InvalidRange` / `MaskError::InvalidParameter` for bad parameters
pub fn create_mask<T>(
    image: ArrayView2<T>,
    frame: &Frame,
    seed: SeedPoint,
    min_size_check: bool,
    params: &MaskParams,
) -> Result<Array2<u8>, MaskError>
where
    T: ToPrimitive + Copy,
{
    let (rows, cols) = image.dim();
    ensure_non_empty((rows, cols))?;
    if !seed.is_within((rows, cols)) {
        return Err(MaskError::SeedOutOfBounds {
            row: seed.row,
            col: seed.col,
            rows,
            cols,
        });
    }
    params.validate()?;

    let window = &params.intensity;
    let high = match window.high {
        Some(high) => high,
        None => normalize::value_range(image)
            .map(|(_, max)| max)
            .unwrap_or(window.low),
    };
    let normalized = normalize::normalize(image, window.low, high, window.clamp)?;
    debug!(
        "normalized {}x{} slice over [{}, {}]",
        rows, cols, window.low, high
    );

    let enhanced = density::enhance(normalized.view(), &params.density)?;

    let factor = params.downsample_factor;
    let reduced = downsample(enhanced.view(), factor);
    debug!("downsampled by {} to {:?}", factor, reduced.dim());

    let palette = segment(reduced.view(), &params.clusters)?;
    let casing = select_brightest(palette.view())?;
    let mut edge_grid = binarize_edges(gradient_magnitude(casing.view())?.view());

    components::prune(&mut edge_grid, min_size_check, params.min_component_size)?;

    let reduced_frame = frame.scaled_down(factor);
    let reduced_seed = seed.scaled_down(factor, edge_grid.dim());
    let mut mask = fill(edge_grid.view(), &reduced_frame, reduced_seed)?;

    if params.reclaim_boundary {
        let added = reclaim_boundary(&mut mask, edge_grid.view(), casing.view())?;
        apply_frame(&mut mask, &reduced_frame, 0);
        debug!("reclaimed {} boundary pixels", added);
    }

    let full = resize_nearest(mask.view(), (rows, cols)).mapv(|v| u8::from(v > 0));
    debug!(
        "mask selects {} of {} pixels",
        full.iter().filter(|&&v| v == 1).count(),
        full.len()
    );
    Ok(full)
}

/// Zero every pixel the mask rejects.
///
/// Pixels under a non-zero mask value are copied unchanged. A mask of a
/// different size is resized to the image with nearest-neighbor sampling.
pub fn apply_mask<T>(image: ArrayView2<T>, mask: ArrayView2<u8>) -> Result<Array2<T>, MaskError>
where
    T: Copy + Zero,
{
    ensure_non_empty(image.dim())?;
    ensure_non_empty(mask.dim())?;

    let resized;
    let mask = if mask.dim() == image.dim() {
        mask.reborrow()
    } else {
        resized = resize_nearest(mask, image.dim());
        resized.view()
    };

    Ok(Zip::from(&image)
        .and(&mask)
        .map_collect(|&sample, &m| if m != 0 { sample } else { T::zero() }))
}
