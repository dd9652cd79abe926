//! Local-contrast enhancement ("density blur").
//!
//! Each cycle subtracts a weighted difference between a fine and a
//! background box blur, which darkens thin dense structures relative to their
//! surroundings, then stretches the result back onto 0-255.

use log::debug;
use ndarray::{Array2, ArrayView2, Zip};

use super::convolve::box_blur;
use super::normalize::renormalize;
use crate::config::DensityConfig;
use crate::error::{ensure_non_empty, MaskError};

/// Run `config.cycles` enhancement cycles over a normalized image.
///
/// One cycle computes
/// `renormalize(max(0, current - multiplier * |blur_small - blur_large|))`.
/// Zero cycles return the input unchanged.
///
/// # Errors
/// * `MaskError::InvalidParameter` for zero kernel sizes or a non-finite multiplier
/// * `MaskError::EmptyGrid` for an empty image
pub fn enhance(image: ArrayView2<u8>, config: &DensityConfig) -> Result<Array2<u8>, MaskError> {
    config.validate()?;
    ensure_non_empty(image.dim())?;

    let mut current = image.to_owned();
    for cycle in 0..config.cycles {
        current = enhance_cycle(current.view(), config)?;
        debug!(
            "density cycle {}/{}: mean level {:.1}",
            cycle + 1,
            config.cycles,
            current.iter().map(|&v| v as f64).sum::<f64>() / current.len() as f64
        );
    }
    Ok(current)
}

fn enhance_cycle(current: ArrayView2<u8>, config: &DensityConfig) -> Result<Array2<u8>, MaskError> {
    let fine = box_blur(current, config.small_kernel);
    let background = box_blur(current, config.large_kernel);

    let residual = Zip::from(&current)
        .and(&fine)
        .and(&background)
        .map_collect(|&value, &f, &b| {
            let diff = (f as i16 - b as i16).abs() as f32;
            (value as f32 - config.diff_multiplier * diff).max(0.0)
        });

    renormalize(residual.view())
}
