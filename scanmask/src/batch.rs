//! Per-slice conversion used by the `compress_slices` batch tool.
//!
//! A slice directory holds numbered 16-bit files `{index:05}.tif`. Each one is
//! clipped to the intensity window, optionally masked, and written next to the
//! source as an 8-bit `{index:05}.png`.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::{debug, warn};
use thiserror::Error;

use crate::config::{Frame, MaskParams, SeedPoint};
use crate::error::MaskError;
use crate::image_proc::coarse::{apply_scanline, coarse_boundary};
use crate::image_proc::normalize::normalize;
use crate::io::{load_image, save_gray_u8, ImageIoError};
use crate::mask::{apply_mask, create_mask};

/// Extension of the raw slices read by the batch
pub const SOURCE_EXTENSION: &str = "tif";
/// Extension of the converted slices
pub const TARGET_EXTENSION: &str = "png";

/// How each slice is masked before writing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Clip and convert only
    #[default]
    Basic,
    /// Clustering, edge and fill mask
    Masked,
    /// Blur-threshold boundary with scanline masking
    Coarse,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Basic => write!(f, "basic"),
            Method::Masked => write!(f, "masked"),
            Method::Coarse => write!(f, "coarse"),
        }
    }
}

/// What happened to one slice index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The converted PNG was written
    Written,
    /// No source file exists for the index
    Missing,
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Image(#[from] ImageIoError),
    #[error(transparent)]
    Mask(#[from] MaskError),
    #[error("Failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Settings shared by every slice of one batch run.
#[derive(Debug, Clone, Default)]
pub struct SliceJob {
    pub dir: PathBuf,
    pub method: Method,
    /// Delete the source once its PNG is written
    pub remove_original: bool,
    /// Margins forced to background by the masked method
    pub frame: Frame,
    /// Fill seed for the masked method; the slice center when unset
    pub seed: Option<SeedPoint>,
    pub min_size_check: bool,
}

/// Path of slice `index` with the given extension inside `dir`.
pub fn slice_path(dir: &Path, index: u32, extension: &str) -> PathBuf {
    dir.join(format!("{index:05}.{extension}"))
}

/// Convert one slice.
///
/// A missing source is logged and reported as [`Outcome::Missing`] rather than
/// an error, so a batch over a sparse index range keeps going.
pub fn process_slice(
    index: u32,
    job: &SliceJob,
    params: &MaskParams,
) -> Result<Outcome, BatchError> {
    let source = slice_path(&job.dir, index, SOURCE_EXTENSION);
    if !source.is_file() {
        warn!("Source file {} could not be found", source.display());
        return Ok(Outcome::Missing);
    }

    let raw = load_image(&source)?;
    let window = &params.intensity;
    let high = window.high.unwrap_or(f64::from(u16::MAX));
    let mut output = normalize(raw.view(), window.low, high, true)?;

    match job.method {
        Method::Basic => {}
        Method::Masked => {
            let seed = job.seed.unwrap_or_else(|| SeedPoint::center_of(raw.dim()));
            let mask = create_mask(raw.view(), &job.frame, seed, job.min_size_check, params)?;
            output = apply_mask(output.view(), mask.view())?;
        }
        Method::Coarse => {
            let boundary = coarse_boundary(output.view(), &params.density, &params.coarse)?;
            apply_scanline(&mut output, boundary.view())?;
        }
    }

    let target = slice_path(&job.dir, index, TARGET_EXTENSION);
    save_gray_u8(output.view(), &target)?;
    debug!("Wrote {} with method {}", target.display(), job.method);

    if job.remove_original {
        std::fs::remove_file(&source).map_err(|source_err| BatchError::Remove {
            path: source.clone(),
            source: source_err,
        })?;
    }

    Ok(Outcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::save_gray_u16;
    use ndarray::Array2;
    use tempfile::tempdir;

    /// 100x100 slice: bright casing ring around a darker specimen
    fn phantom() -> Array2<u16> {
        Array2::from_shape_fn((100, 100), |(r, c)| {
            let inside = |lo: usize, hi: usize| (lo..hi).contains(&r) && (lo..hi).contains(&c);
            if inside(30, 70) {
                20000
            } else if inside(10, 90) {
                50000
            } else {
                0
            }
        })
    }

    fn phantom_params() -> MaskParams {
        let mut params = MaskParams::default();
        params.intensity.low = 0.0;
        params.intensity.high = Some(65535.0);
        params.density.cycles = 1;
        params.density.diff_multiplier = 0.0;
        params.downsample_factor = 1;
        params.clusters.clusters = 2;
        params.clusters.seed = Some(11);
        params.min_component_size = 100;
        params
    }

    fn write_slice(dir: &Path, index: u32) -> PathBuf {
        let path = slice_path(dir, index, SOURCE_EXTENSION);
        save_gray_u16(phantom().view(), &path).unwrap();
        path
    }

    fn read_output(dir: &Path, index: u32) -> Array2<u16> {
        load_image(&slice_path(dir, index, TARGET_EXTENSION)).unwrap()
    }

    #[test]
    fn test_slice_path_is_zero_padded() {
        assert_eq!(
            slice_path(Path::new("scans"), 42, "tif"),
            Path::new("scans").join("00042.tif")
        );
    }

    #[test]
    fn test_missing_slice_is_skipped() {
        let dir = tempdir().unwrap();
        let job = SliceJob {
            dir: dir.path().to_path_buf(),
            ..SliceJob::default()
        };

        let outcome = process_slice(7, &job, &phantom_params()).unwrap();

        assert_eq!(outcome, Outcome::Missing);
        assert!(!slice_path(dir.path(), 7, TARGET_EXTENSION).exists());
    }

    #[test]
    fn test_basic_keeps_casing_and_original() {
        let dir = tempdir().unwrap();
        let source = write_slice(dir.path(), 3);
        let job = SliceJob {
            dir: dir.path().to_path_buf(),
            ..SliceJob::default()
        };

        assert_eq!(
            process_slice(3, &job, &phantom_params()).unwrap(),
            Outcome::Written
        );
        assert!(source.exists());

        // 8-bit output is widened to 16 bits on load
        let out = read_output(dir.path(), 3);
        assert_eq!(out[[50, 50]], u16::from(normalize_level(20000)) * 257);
        assert_eq!(out[[20, 20]], u16::from(normalize_level(50000)) * 257);
        assert_eq!(out[[5, 5]], 0);
    }

    #[test]
    fn test_remove_original_deletes_source() {
        let dir = tempdir().unwrap();
        let source = write_slice(dir.path(), 0);
        let job = SliceJob {
            dir: dir.path().to_path_buf(),
            remove_original: true,
            ..SliceJob::default()
        };

        process_slice(0, &job, &phantom_params()).unwrap();

        assert!(!source.exists());
        assert!(slice_path(dir.path(), 0, TARGET_EXTENSION).exists());
    }

    #[test]
    fn test_masked_method_clears_casing() {
        let dir = tempdir().unwrap();
        write_slice(dir.path(), 1);
        let job = SliceJob {
            dir: dir.path().to_path_buf(),
            method: Method::Masked,
            min_size_check: true,
            ..SliceJob::default()
        };

        process_slice(1, &job, &phantom_params()).unwrap();

        let out = read_output(dir.path(), 1);
        assert_eq!(out[[50, 50]], u16::from(normalize_level(20000)) * 257);
        assert_eq!(out[[30, 30]], u16::from(normalize_level(20000)) * 257);
        assert_eq!(out[[20, 20]], 0);
        assert_eq!(out[[29, 50]], 0);
    }

    #[test]
    fn test_coarse_method_clears_outer_columns() {
        let dir = tempdir().unwrap();
        write_slice(dir.path(), 2);
        let mut params = phantom_params();
        params.density.small_kernel = 3;
        params.density.large_kernel = 9;
        params.coarse.final_kernel = 5;
        let job = SliceJob {
            dir: dir.path().to_path_buf(),
            method: Method::Coarse,
            ..SliceJob::default()
        };

        process_slice(2, &job, &params).unwrap();

        let basic = normalize(phantom().view(), 0.0, 65535.0, true).unwrap();
        let out = read_output(dir.path(), 2);
        assert_eq!(out.dim(), basic.dim());
        // The casing forms the boundary, so the outer casing columns are cleared
        assert_eq!(out[[50, 12]], 0);
        assert_eq!(out[[50, 87]], 0);
        assert_ne!(basic[[50, 12]], 0);
    }

    #[test]
    fn test_method_display_matches_cli_names() {
        for method in Method::value_variants() {
            let name = method.to_string();
            assert_eq!(Method::from_str(&name, false), Ok(*method));
        }
    }

    fn normalize_level(sample: u16) -> u8 {
        (f64::from(sample) / 65535.0 * 255.0) as u8
    }
}
