//! Intensity normalization from raw sample ranges into the 0-255 domain.
//!
//! Raw scan slices arrive with wide sample ranges (typically 16-bit sensor
//! counts). Every later stage of the mask pipeline works on 8-bit levels, so
//! this module is the single place where the domain changes.
//!
//! Scaling truncates toward zero, so `(x - low) / (high - low) * 255` maps
//! `high` to exactly 255 and anything just below it to 254.

use ndarray::{Array2, ArrayView2};
use num_traits::{NumCast, ToPrimitive};

use crate::error::{ensure_non_empty, ensure_range, MaskError};

/// Highest level of the normalized domain.
pub const MAX_LEVEL: f64 = 255.0;

/// Rescale samples from `[low, high]` into 0-255.
///
/// The input is never modified. With `clamp` enabled, samples outside the
/// window are pinned to `low`/`high` before scaling. Without it they saturate
/// to 0 or 255 instead of wrapping.
///
/// # Arguments
/// * `image` - Raw samples of any numeric type
/// * `low` - Sample value that maps to 0
/// * `high` - Sample value that maps to 255
/// * `clamp` - Pin out-of-window samples before scaling
///
/// # Errors
/// * `MaskError::InvalidRange` when `high <= low`
/// * `MaskError::EmptyGrid` when the image has a zero dimension
pub fn normalize<T>(
    image: ArrayView2<T>,
    low: f64,
    high: f64,
    clamp: bool,
) -> Result<Array2<u8>, MaskError>
where
    T: ToPrimitive + Copy,
{
    ensure_range(low, high)?;
    ensure_non_empty(image.dim())?;

    let span = high - low;
    Ok(image.mapv(|sample| {
        let mut value = sample.to_f64().unwrap_or(low);
        if clamp {
            value = value.clamp(low, high);
        }
        to_level((value - low) / span)
    }))
}

/// Pin every sample of `image` into `[low, high]`, mutating it.
///
/// Kept apart from [`normalize`] so that modifying the source grid is always
/// an explicit call.
pub fn clamp_in_place<T>(image: &mut Array2<T>, low: f64, high: f64) -> Result<(), MaskError>
where
    T: NumCast + ToPrimitive + Copy,
{
    ensure_range(low, high)?;
    let low_sample: T = NumCast::from(low).ok_or_else(|| {
        MaskError::InvalidParameter(format!("clamp bound {low} is not representable"))
    })?;
    let high_sample: T = NumCast::from(high).ok_or_else(|| {
        MaskError::InvalidParameter(format!("clamp bound {high} is not representable"))
    })?;

    image.mapv_inplace(|sample| match sample.to_f64() {
        Some(v) if v < low => low_sample,
        Some(v) if v > high => high_sample,
        _ => sample,
    });
    Ok(())
}

/// Minimum and maximum sample of a grid, or `None` when it is empty.
pub fn value_range<T>(image: ArrayView2<T>) -> Option<(f64, f64)>
where
    T: ToPrimitive + Copy,
{
    image
        .iter()
        .filter_map(|v| v.to_f64())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Stretch the observed `[min, max]` of `image` onto 0-255.
///
/// A flat image has no range to stretch and comes back all zero.
pub fn renormalize<T>(image: ArrayView2<T>) -> Result<Array2<u8>, MaskError>
where
    T: ToPrimitive + Copy,
{
    ensure_non_empty(image.dim())?;
    match value_range(image) {
        Some((lo, hi)) if hi > lo => normalize(image, lo, hi, false),
        _ => Ok(Array2::zeros(image.dim())),
    }
}

/// Fraction of the window to an 8-bit level, truncating and saturating.
fn to_level(fraction: f64) -> u8 {
    (fraction * MAX_LEVEL) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_normalize_truncates() {
        let image = arr2(&[[0u16, 100], [200, 1000]]);
        let out = normalize(image.view(), 0.0, 1000.0, false).unwrap();

        // 100/1000*255 = 25.5, 200/1000*255 = 51.0
        assert_eq!(out, arr2(&[[0u8, 25], [51, 255]]));
    }

    #[test]
    fn test_normalize_with_clamp() {
        let image = arr2(&[[10u16, 18000], [40000, 65535]]);
        let out = normalize(image.view(), 18000.0, 40000.0, true).unwrap();

        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[0, 1]], 0);
        assert_eq!(out[[1, 0]], 255);
        assert_eq!(out[[1, 1]], 255);
        // Input untouched
        assert_eq!(image[[0, 0]], 10);
    }

    #[test]
    fn test_normalize_without_clamp_saturates() {
        let image = arr2(&[[-50.0f32, 50.0, 500.0]]);
        let out = normalize(image.view(), 0.0, 100.0, false).unwrap();
        assert_eq!(out, arr2(&[[0u8, 127, 255]]));
    }

    #[test]
    fn test_normalize_output_bounded() {
        let image = Array2::from_shape_fn((16, 16), |(r, c)| (r * 4000 + c * 97) as u16);
        for (low, high) in [(0.0, 1.0), (1000.0, 2000.0), (0.0, 65535.0), (-5.0, 5.0)] {
            let out = normalize(image.view(), low, high, false).unwrap();
            assert_eq!(out.dim(), image.dim());
            // u8 already bounds the domain; check the ends are reachable and ordered
            let (lo, hi) = value_range(out.view()).unwrap();
            assert!(lo >= 0.0 && hi <= 255.0);
        }
    }

    #[test]
    fn test_normalize_invalid_range() {
        let image = arr2(&[[1u8, 2]]);
        assert_eq!(
            normalize(image.view(), 5.0, 5.0, true),
            Err(MaskError::InvalidRange {
                low: 5.0,
                high: 5.0
            })
        );
        assert!(normalize(image.view(), 6.0, 5.0, false).is_err());
    }

    #[test]
    fn test_normalize_empty_grid() {
        let image = Array2::<u16>::zeros((0, 3));
        assert_eq!(
            normalize(image.view(), 0.0, 1.0, false),
            Err(MaskError::EmptyGrid { rows: 0, cols: 3 })
        );
    }

    #[test]
    fn test_clamp_in_place_mutates() {
        let mut image = arr2(&[[5u16, 60], [300, 9000]]);
        clamp_in_place(&mut image, 60.0, 255.0).unwrap();
        assert_eq!(image[[0, 0]], 60);
        assert_eq!(image[[0, 1]], 60);
        assert_eq!(image[[1, 0]], 255);
        assert_eq!(image[[1, 1]], 255);
    }

    #[test]
    fn test_clamp_in_place_unrepresentable_bound() {
        let mut image = arr2(&[[1u8, 2]]);
        assert!(matches!(
            clamp_in_place(&mut image, -1.0, 10.0),
            Err(MaskError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_value_range() {
        let image = arr2(&[[3i32, -2], [8, 0]]);
        assert_eq!(value_range(image.view()), Some((-2.0, 8.0)));
        assert_eq!(value_range(Array2::<u8>::zeros((0, 0)).view()), None);
    }

    #[test]
    fn test_renormalize_flat_image_is_zero() {
        let image = Array2::from_elem((4, 4), 42u8);
        let out = renormalize(image.view()).unwrap();
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_renormalize_stretches() {
        let image = arr2(&[[10.0f32, 20.0], [30.0, 110.0]]);
        let out = renormalize(image.view()).unwrap();
        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[1, 1]], 255);
        assert_eq!(out[[0, 1]], 25);
    }
}
