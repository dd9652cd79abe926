//! Intensity clustering with k-means.
//!
//! Every pixel of a normalized image is a one-dimensional data point. Because
//! the domain has only 256 levels, the clustering runs over the image
//! histogram with per-level weights, which yields exactly the partition a
//! per-pixel implementation would find at a fraction of the cost.

use log::{debug, warn};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ClusterConfig;
use crate::error::{ensure_non_empty, MaskError};

/// Result of the best k-means run over an 8-bit image.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster centers in level units, indexed by cluster
    pub centers: Vec<f64>,
    /// Cluster index assigned to each of the 256 levels
    pub labels: [usize; 256],
    /// Sum of squared distances from each pixel to its center
    pub compactness: f64,
    /// Whether the run stopped on the epsilon criterion
    pub converged: bool,
}

impl Clustering {
    /// Center of the cluster a level belongs to, rounded to the 8-bit domain.
    pub fn level_of(&self, value: u8) -> u8 {
        self.centers[self.labels[value as usize]]
            .round()
            .clamp(0.0, 255.0) as u8
    }
}

/// Cluster the levels of `image` into `config.clusters` groups.
///
/// Runs `config.attempts` restarts from centers drawn uniformly between the
/// darkest and brightest level present and keeps the most compact one. When
/// that run hit `max_iterations` before settling, a warning is logged and the
/// result is still returned.
pub fn kmeans(image: ArrayView2<u8>, config: &ClusterConfig) -> Result<Clustering, MaskError> {
    config.validate()?;
    ensure_non_empty(image.dim())?;

    let mut weights = [0u64; 256];
    for &value in image.iter() {
        weights[value as usize] += 1;
    }

    let present = (0..256usize).filter(|&level| weights[level] > 0);
    let lowest = present.clone().min().unwrap_or(0) as f64;
    let highest = present.max().unwrap_or(0) as f64;

    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut best: Option<Clustering> = None;
    for attempt in 0..config.attempts {
        let centers: Vec<f64> = (0..config.clusters)
            .map(|_| {
                if highest > lowest {
                    rng.random_range(lowest..=highest)
                } else {
                    lowest
                }
            })
            .collect();
        let run = lloyd(&weights, centers, config);
        debug!(
            "k-means attempt {}: compactness {:.1}, converged {}",
            attempt, run.compactness, run.converged
        );

        if best
            .as_ref()
            .map_or(true, |current| run.compactness < current.compactness)
        {
            best = Some(run);
        }
    }

    let best = best.ok_or_else(|| {
        MaskError::InvalidParameter("k-means needs at least one attempt".to_string())
    })?;
    if !best.converged {
        warn!(
            "k-means did not converge within {} iterations; using best centers {:?}",
            config.max_iterations, best.centers
        );
    }
    Ok(best)
}

/// Replace every pixel with the center of its cluster.
///
/// The output holds at most `config.clusters` distinct levels.
pub fn segment(image: ArrayView2<u8>, config: &ClusterConfig) -> Result<Array2<u8>, MaskError> {
    let clustering = kmeans(image, config)?;

    let mut lookup = [0u8; 256];
    for (level, slot) in lookup.iter_mut().enumerate() {
        *slot = clustering.level_of(level as u8);
    }
    Ok(image.mapv(|v| lookup[v as usize]))
}

/// One Lloyd iteration loop over the weighted level histogram.
fn lloyd(weights: &[u64; 256], mut centers: Vec<f64>, config: &ClusterConfig) -> Clustering {
    let mut labels = [0usize; 256];
    let mut converged = false;

    for _ in 0..config.max_iterations {
        assign(&centers, &mut labels);

        let mut sums = vec![0.0f64; centers.len()];
        let mut counts = vec![0u64; centers.len()];
        for level in 0..256 {
            let w = weights[level];
            if w > 0 {
                sums[labels[level]] += w as f64 * level as f64;
                counts[labels[level]] += w;
            }
        }

        let mut shift = 0.0f64;
        for (k, center) in centers.iter_mut().enumerate() {
            // Empty clusters keep their previous center
            if counts[k] > 0 {
                let updated = sums[k] / counts[k] as f64;
                shift = shift.max((updated - *center).abs());
                *center = updated;
            }
        }

        if shift < config.epsilon {
            converged = true;
            break;
        }
    }

    assign(&centers, &mut labels);
    let compactness = (0..256)
        .map(|level| {
            let d = level as f64 - centers[labels[level]];
            weights[level] as f64 * d * d
        })
        .sum();

    Clustering {
        centers,
        labels,
        compactness,
        converged,
    }
}

/// Nearest center for each level; ties go to the lower cluster index.
fn assign(centers: &[f64], labels: &mut [usize; 256]) {
    for (level, label) in labels.iter_mut().enumerate() {
        let x = level as f64;
        let mut nearest = 0;
        let mut nearest_dist = f64::INFINITY;
        for (k, &c) in centers.iter().enumerate() {
            let d = (x - c).abs();
            if d < nearest_dist {
                nearest = k;
                nearest_dist = d;
            }
        }
        *label = nearest;
    }
}
