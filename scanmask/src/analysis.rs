//! Intensity histograms over rectangular regions of a slice.
//!
//! Used to pick clipping bounds: histogram a patch of casing or background and
//! read off where its samples sit in the sensor range.

use std::fmt;

use ndarray::{s, ArrayView2};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_empty, ensure_range, MaskError};

/// Half-open pixel rectangle `[x_min, x_max) x [y_min, y_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Left column
    pub x_min: usize,
    /// Top row
    pub y_min: usize,
    /// Column one past the right edge
    pub x_max: usize,
    /// Row one past the bottom edge
    pub y_max: usize,
}

impl Region {
    pub fn new(x_min: usize, y_min: usize, x_max: usize, y_max: usize) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> usize {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> usize {
        self.y_max.saturating_sub(self.y_min)
    }

    /// Intersection with a (rows, cols) grid
    pub fn clipped(&self, dim: (usize, usize)) -> Region {
        let (rows, cols) = dim;
        let x_max = self.x_max.min(cols);
        let y_max = self.y_max.min(rows);
        Region {
            x_min: self.x_min.min(x_max),
            y_min: self.y_min.min(y_max),
            x_max,
            y_max,
        }
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    /// Parse `"x_min,y_min,x_max,y_max"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid region bound: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [x_min, y_min, x_max, y_max] => Ok(Region::new(*x_min, *y_min, *x_max, *y_max)),
            _ => Err("Region must be 'x_min,y_min,x_max,y_max'".to_string()),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` bin edges, ascending
    pub edges: Vec<f64>,
    /// Sample count per bin
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Lower edge, upper edge and count of each bin
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, u64)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edge, &count)| (edge[0], edge[1], count))
    }
}

/// Histogram the samples of `image` inside `region`.
///
/// Bins split `[min, max]` evenly. The last bin includes `max`; samples outside
/// the range are not counted.
///
/// # Errors
/// * `MaskError::EmptyGrid` when the clipped region has no pixels
/// * `MaskError::InvalidParameter` when `bins` is zero
/// * `MaskError::InvalidRange` when `max <= min`
pub fn region_histogram<T>(
    image: ArrayView2<T>,
    region: &Region,
    bins: usize,
    range: (f64, f64),
) -> Result<Histogram, MaskError>
where
    T: ToPrimitive + Copy,
{
    let (min, max) = range;
    ensure_range(min, max)?;
    if bins == 0 {
        return Err(MaskError::InvalidParameter(
            "histogram needs at least one bin".to_string(),
        ));
    }

    let region = region.clipped(image.dim());
    ensure_non_empty((region.height(), region.width()))?;
    let patch = image.slice(s![region.y_min..region.y_max, region.x_min..region.x_max]);

    let width = (max - min) / bins as f64;
    let edges = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0u64; bins];

    for value in patch.iter().filter_map(|v| v.to_f64()) {
        if !(min..=max).contains(&value) {
            continue;
        }
        let bin = (((value - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    Ok(Histogram { edges, counts })
}
