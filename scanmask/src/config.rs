//! Tuning parameters for mask generation.
//!
//! Every knob of the pipeline lives in [`MaskParams`], which is passed
//! explicitly to each call. The defaults are tuned for full-resolution
//! 16-bit scroll slices, so `MaskParams::default()` is a reasonable starting
//! point for other CT data but not a guarantee of a correct mask.
//!
//! Parameters serialize to JSON, which lets batch runs keep their tuning next
//! to the data:
//!
//! ```rust
//! use scanmask::config::MaskParams;
//!
//! let mut params = MaskParams::default();
//! params.downsample_factor = 4;
//! let json = serde_json::to_string(&params).unwrap();
//! let restored: MaskParams = serde_json::from_str(&json).unwrap();
//! assert_eq!(restored.downsample_factor, 4);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MaskError;
use crate::image_proc::normalize::MAX_LEVEL;

/// Interior components larger than this survive pruning when size checks are on.
pub const DEFAULT_MIN_COMPONENT_SIZE: usize = 1000;

/// Errors raised while loading or saving parameter files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access parameter file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse parameter file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid parameters: {0}")]
    Invalid(#[from] MaskError),
}

/// Raw intensity window mapped onto 0-255 by the first pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityWindow {
    /// Raw value mapped to 0
    pub low: f64,
    /// Raw value mapped to 255; `None` uses the image maximum
    pub high: Option<f64>,
    /// Pin samples outside the window before scaling
    pub clamp: bool,
}

impl Default for IntensityWindow {
    fn default() -> Self {
        Self {
            low: 18000.0,
            high: None,
            clamp: true,
        }
    }
}

/// Local-contrast ("density blur") enhancement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Number of blur/subtract/renormalize cycles
    pub cycles: usize,
    /// Edge length of the fine box kernel
    pub small_kernel: usize,
    /// Edge length of the background box kernel
    pub large_kernel: usize,
    /// Weight applied to the fine/background difference before subtraction
    pub diff_multiplier: f32,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            cycles: 5,
            small_kernel: 10,
            large_kernel: 80,
            diff_multiplier: 2.0,
        }
    }
}

impl DensityConfig {
    pub fn validate(&self) -> Result<(), MaskError> {
        if self.small_kernel == 0 || self.large_kernel == 0 {
            return Err(MaskError::InvalidParameter(format!(
                "density kernels must be non-zero (small {}, large {})",
                self.small_kernel, self.large_kernel
            )));
        }
        if !self.diff_multiplier.is_finite() {
            return Err(MaskError::InvalidParameter(
                "density diff multiplier must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// K-means settings for the cluster segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of intensity clusters
    pub clusters: usize,
    /// Random restarts; the most compact result wins
    pub attempts: usize,
    /// Iteration cap per restart
    pub max_iterations: usize,
    /// Stop once no center moves by this much
    pub epsilon: f64,
    /// RNG seed for reproducible initialization
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            clusters: 3,
            attempts: 10,
            max_iterations: 100,
            epsilon: 0.2,
            seed: None,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), MaskError> {
        if self.clusters == 0 || self.attempts == 0 || self.max_iterations == 0 {
            return Err(MaskError::InvalidParameter(format!(
                "clusters ({}), attempts ({}) and max_iterations ({}) must be non-zero",
                self.clusters, self.attempts, self.max_iterations
            )));
        }
        if !(self.epsilon >= 0.0) {
            return Err(MaskError::InvalidParameter(format!(
                "cluster epsilon must be non-negative, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Settings for the blur-threshold boundary variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoarseConfig {
    /// Level below which input pixels are clipped before enhancement
    pub floor: f64,
    /// Edge length of the final smoothing kernel
    pub final_kernel: usize,
    /// Renormalized level at or above which a pixel is boundary
    pub cutoff: u8,
}

impl Default for CoarseConfig {
    fn default() -> Self {
        Self {
            floor: 60.0,
            final_kernel: 60,
            cutoff: 130,
        }
    }
}

/// Complete parameter set for [`crate::create_mask`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskParams {
    pub intensity: IntensityWindow,
    pub density: DensityConfig,
    /// Spatial reduction per axis before clustering
    pub downsample_factor: usize,
    pub clusters: ClusterConfig,
    /// Size above which interior edge components are kept
    pub min_component_size: usize,
    /// Add the specimen-side half of edge bands back to the fill
    pub reclaim_boundary: bool,
    pub coarse: CoarseConfig,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            intensity: IntensityWindow::default(),
            density: DensityConfig::default(),
            downsample_factor: 10,
            clusters: ClusterConfig::default(),
            min_component_size: DEFAULT_MIN_COMPONENT_SIZE,
            reclaim_boundary: true,
            coarse: CoarseConfig::default(),
        }
    }
}

impl MaskParams {
    /// Check every numeric parameter before any pixel is touched.
    pub fn validate(&self) -> Result<(), MaskError> {
        if let Some(high) = self.intensity.high {
            crate::error::ensure_range(self.intensity.low, high)?;
        }
        if self.downsample_factor == 0 {
            return Err(MaskError::InvalidParameter(
                "downsample factor must be non-zero".to_string(),
            ));
        }
        if self.coarse.final_kernel == 0 {
            return Err(MaskError::InvalidParameter(
                "coarse smoothing kernel must be non-zero".to_string(),
            ));
        }
        if !(0.0..MAX_LEVEL).contains(&self.coarse.floor) {
            return Err(MaskError::InvalidParameter(format!(
                "coarse floor must lie in [0, 255), got {}",
                self.coarse.floor
            )));
        }
        self.density.validate()?;
        self.clusters.validate()
    }

    /// Load parameters from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let params: MaskParams = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    /// Write parameters as pretty-printed JSON.
    pub fn to_json_file(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Border margins forced to background, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Frame {
    pub fn new(top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Same margin on all four sides
    pub fn uniform(margin: usize) -> Self {
        Self::new(margin, margin, margin, margin)
    }

    /// Margins for a grid shrunk by `factor`, rounded up so none disappear.
    pub fn scaled_down(&self, factor: usize) -> Self {
        let factor = factor.max(1);
        Self {
            top: self.top.div_ceil(factor),
            bottom: self.bottom.div_ceil(factor),
            left: self.left.div_ceil(factor),
            right: self.right.div_ceil(factor),
        }
    }
}

impl FromStr for Frame {
    type Err = String;

    /// Parse `"top,bottom,left,right"` or a single uniform margin.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid frame margin: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [m] => Ok(Frame::uniform(*m)),
            [t, b, l, r] => Ok(Frame::new(*t, *b, *l, *r)),
            _ => Err("Frame must be 'margin' or 'top,bottom,left,right'".to_string()),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.top, self.bottom, self.left, self.right)
    }
}

/// A (row, column) coordinate known to lie inside the specimen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPoint {
    pub row: usize,
    pub col: usize,
}

impl SeedPoint {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Center pixel of a (rows, cols) grid
    pub fn center_of(dim: (usize, usize)) -> Self {
        Self::new(dim.0 / 2, dim.1 / 2)
    }

    /// Whether the point addresses a pixel of a (rows, cols) grid
    pub fn is_within(&self, dim: (usize, usize)) -> bool {
        self.row < dim.0 && self.col < dim.1
    }

    /// Position on a grid shrunk by `factor` with dimensions `reduced`.
    pub fn scaled_down(&self, factor: usize, reduced: (usize, usize)) -> Self {
        let factor = factor.max(1);
        Self {
            row: (self.row / factor).min(reduced.0.saturating_sub(1)),
            col: (self.col / factor).min(reduced.1.saturating_sub(1)),
        }
    }
}

impl FromStr for SeedPoint {
    type Err = String;

    /// Parse `"row,col"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 2 {
            return Err("Seed point must be in format 'row,col'".to_string());
        }

        let row = parts[0]
            .trim()
            .parse::<usize>()
            .map_err(|_| "Invalid seed row".to_string())?;
        let col = parts[1]
            .trim()
            .parse::<usize>()
            .map_err(|_| "Invalid seed column".to_string())?;

        Ok(SeedPoint::new(row, col))
    }
}

impl fmt::Display for SeedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}
