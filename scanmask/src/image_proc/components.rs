//! Connected-component analysis for binary edge grids.
//!
//! Edge detection leaves the casing outline plus scattered fragments from
//! noise and internal structure. Pruning keeps only what can be part of the
//! casing: anything that reaches the image border, and optionally anything
//! large enough to be a closed outline on its own.

use std::collections::VecDeque;

use log::debug;
use ndarray::{Array2, ArrayView2};

pub use crate::config::DEFAULT_MIN_COMPONENT_SIZE;
use crate::error::{ensure_non_empty, MaskError};

/// 4-connected neighbor offsets
const NEIGHBORS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// A maximal 4-connected set of active pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// (row, col) coordinates in breadth-first discovery order
    pub pixels: Vec<(usize, usize)>,
}

impl Component {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Whether any pixel lies on the outermost row or column of a (rows, cols) grid
    pub fn touches_border(&self, dim: (usize, usize)) -> bool {
        let (rows, cols) = dim;
        self.pixels
            .iter()
            .any(|&(r, c)| r == 0 || c == 0 || r + 1 == rows || c + 1 == cols)
    }
}

/// Counts from one pruning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    /// Components kept because they reach the border
    pub border: usize,
    /// Interior components kept for their size
    pub large: usize,
    /// Components removed
    pub erased: usize,
    /// Pixels cleared by removal
    pub erased_pixels: usize,
}

/// Find every 4-connected component of active (non-zero) pixels.
///
/// Components are returned in row-major order of their first pixel.
pub fn find_components(grid: ArrayView2<u8>) -> Result<Vec<Component>, MaskError> {
    let (rows, cols) = grid.dim();
    ensure_non_empty((rows, cols))?;
    let mut visited = Array2::from_elem((rows, cols), false);
    let mut queue = VecDeque::new();
    let mut components = Vec::new();

    for i in 0..rows {
        for j in 0..cols {
            if grid[[i, j]] == 0 || visited[[i, j]] {
                continue;
            }

            let mut pixels = Vec::new();
            visited[[i, j]] = true;
            queue.push_back((i, j));

            while let Some((y, x)) = queue.pop_front() {
                pixels.push((y, x));

                for &(dy, dx) in &NEIGHBORS {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;

                    if ny >= 0 && ny < rows as isize && nx >= 0 && nx < cols as isize {
                        let ny = ny as usize;
                        let nx = nx as usize;

                        if grid[[ny, nx]] != 0 && !visited[[ny, nx]] {
                            visited[[ny, nx]] = true;
                            queue.push_back((ny, nx));
                        }
                    }
                }
            }

            components.push(Component { pixels });
        }
    }

    Ok(components)
}

/// Erase interior components from an edge grid in place.
///
/// Border-touching components always survive. Interior components survive
/// only when `min_size_check` is set and they hold more than
/// `min_component_size` pixels.
pub fn prune(
    edges: &mut Array2<u8>,
    min_size_check: bool,
    min_component_size: usize,
) -> Result<PruneSummary, MaskError> {
    let dim = edges.dim();
    let mut summary = PruneSummary::default();

    for component in find_components(edges.view())? {
        if component.touches_border(dim) {
            summary.border += 1;
        } else if min_size_check && component.len() > min_component_size {
            summary.large += 1;
        } else {
            summary.erased += 1;
            summary.erased_pixels += component.len();
            for &(r, c) in &component.pixels {
                edges[[r, c]] = 0;
            }
        }
    }

    debug!(
        "pruned edges: kept {} border and {} large components, erased {} ({} px)",
        summary.border, summary.large, summary.erased, summary.erased_pixels
    );
    Ok(summary)
}
