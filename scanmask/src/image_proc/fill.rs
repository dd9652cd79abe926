//! Seeded region filling inside the pruned casing outline.
//!
//! The pruned edge grid is turned into a barrier map (edges and frame margins
//! become [`WALL`]), then a flood fill from a seed inside the specimen marks
//! every reachable pixel as [`FILLED`]. The result is binarized to a {0, 1}
//! mask.

use std::collections::VecDeque;

use ndarray::{Array2, ArrayView2};

use crate::config::{Frame, SeedPoint};
use crate::error::{ensure_non_empty, MaskError};

/// Pixel not yet reached by the fill
pub const OPEN: u8 = 0;
/// Pixel the fill may not cross
pub const WALL: u8 = 255;
/// Pixel reached by the fill
pub const FILLED: u8 = 128;

const NEIGHBORS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// Force the outer margins of `grid` to `value`.
///
/// Margins larger than the grid simply cover all of it.
pub fn apply_frame(grid: &mut Array2<u8>, frame: &Frame, value: u8) {
    let (rows, cols) = grid.dim();
    let top = frame.top.min(rows);
    let bottom = frame.bottom.min(rows);
    let left = frame.left.min(cols);
    let right = frame.right.min(cols);

    for ((r, c), pixel) in grid.indexed_iter_mut() {
        if r < top || r >= rows - bottom || c < left || c >= cols - right {
            *pixel = value;
        }
    }
}

/// 4-connected flood fill replacing the seed's value with `value`.
///
/// Returns the number of pixels changed. Filling with the value already under
/// the seed is a no-op.
pub fn flood_fill(grid: &mut Array2<u8>, seed: SeedPoint, value: u8) -> usize {
    let (rows, cols) = grid.dim();
    if !seed.is_within((rows, cols)) {
        return 0;
    }
    let target = grid[[seed.row, seed.col]];
    if target == value {
        return 0;
    }

    let mut queue = VecDeque::new();
    grid[[seed.row, seed.col]] = value;
    queue.push_back((seed.row, seed.col));
    let mut filled = 0;

    while let Some((y, x)) = queue.pop_front() {
        filled += 1;

        for &(dy, dx) in &NEIGHBORS {
            let ny = y as isize + dy;
            let nx = x as isize + dx;

            if ny >= 0 && ny < rows as isize && nx >= 0 && nx < cols as isize {
                let ny = ny as usize;
                let nx = nx as usize;

                if grid[[ny, nx]] == target {
                    grid[[ny, nx]] = value;
                    queue.push_back((ny, nx));
                }
            }
        }
    }

    filled
}

/// Map pixels equal to `level` to 1 and everything else to 0.
pub fn binarize(grid: ArrayView2<u8>, level: u8) -> Array2<u8> {
    grid.mapv(|v| u8::from(v == level))
}

/// Fill the region around `seed` bounded by edges and the frame.
///
/// # Arguments
/// * `pruned` - Binary edge grid; any non-zero pixel is a wall
/// * `frame` - Margins treated as walls, in `pruned` pixel units
/// * `seed` - Start of the fill, in `pruned` pixel units
///
/// # Returns
/// * A {0, 1} mask of the pixels reachable from the seed
///
/// # Errors
/// * `MaskError::SeedOutOfBounds` when the seed is outside the grid
/// * `MaskError::SeedOnBarrier` when the seed sits on an edge or in the frame
pub fn fill(
    pruned: ArrayView2<u8>,
    frame: &Frame,
    seed: SeedPoint,
) -> Result<Array2<u8>, MaskError> {
    let (rows, cols) = pruned.dim();
    ensure_non_empty((rows, cols))?;
    if !seed.is_within((rows, cols)) {
        return Err(MaskError::SeedOutOfBounds {
            row: seed.row,
            col: seed.col,
            rows,
            cols,
        });
    }

    let mut grid = pruned.mapv(|v| if v > 0 { WALL } else { OPEN });
    apply_frame(&mut grid, frame, WALL);

    if grid[[seed.row, seed.col]] != OPEN {
        return Err(MaskError::SeedOnBarrier {
            row: seed.row,
            col: seed.col,
        });
    }

    flood_fill(&mut grid, seed, FILLED);
    Ok(binarize(grid.view(), FILLED))
}

/// Grow `mask` into the specimen-side half of the edge bands.
///
/// Sobel responses straddle every boundary, so the fill stops one pixel short
/// of the true outline. An edge pixel is added when it is outside the casing
/// selection and 8-adjacent to a pixel that was selected before this call.
/// Returns the number of pixels added.
///
/// # Errors
/// * `MaskError::EmptyGrid` for an empty mask
/// * `MaskError::InvalidParameter` when `edges` or `casing` differ in size from `mask`
pub fn reclaim_boundary(
    mask: &mut Array2<u8>,
    edges: ArrayView2<u8>,
    casing: ArrayView2<u8>,
) -> Result<usize, MaskError> {
    let (rows, cols) = mask.dim();
    ensure_non_empty((rows, cols))?;
    for (name, dim) in [("edge", edges.dim()), ("casing", casing.dim())] {
        if dim != (rows, cols) {
            return Err(MaskError::InvalidParameter(format!(
                "{name} grid is {}x{} but the mask is {rows}x{cols}",
                dim.0, dim.1
            )));
        }
    }

    let snapshot = mask.clone();
    let mut added = 0;

    for ((r, c), pixel) in mask.indexed_iter_mut() {
        if *pixel != 0 || edges[[r, c]] == 0 || casing[[r, c]] != 0 {
            continue;
        }
        let r_lo = r.saturating_sub(1);
        let c_lo = c.saturating_sub(1);
        let r_hi = (r + 1).min(rows - 1);
        let c_hi = (c + 1).min(cols - 1);

        let touches = (r_lo..=r_hi).any(|nr| (c_lo..=c_hi).any(|nc| snapshot[[nr, nc]] != 0));
        if touches {
            *pixel = 1;
            added += 1;
        }
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled_rectangle() -> Array2<u8> {
        let mut grid = Array2::<u8>::zeros((12, 14));
        for r in 2..=9 {
            for c in 3..=10 {
                if r == 2 || r == 9 || c == 3 || c == 10 {
                    grid[[r, c]] = 255;
                }
            }
        }
        grid
    }

    #[test]
    fn test_rectangle_wall_selects_interior() {
        let grid = walled_rectangle();
        let mask = fill(grid.view(), &Frame::default(), SeedPoint::new(5, 5)).unwrap();

        for ((r, c), &v) in mask.indexed_iter() {
            let inside = (3..=8).contains(&r) && (4..=9).contains(&c);
            assert_eq!(v, u8::from(inside), "pixel ({r}, {c})");
        }
    }

    #[test]
    fn test_fill_without_walls_reaches_frame() {
        let grid = Array2::<u8>::zeros((10, 10));
        let mask = fill(grid.view(), &Frame::new(1, 2, 3, 4), SeedPoint::new(5, 5)).unwrap();

        assert_eq!(mask.iter().filter(|&&v| v == 1).count(), 7 * 3);
        assert_eq!(mask[[1, 3]], 1);
        assert_eq!(mask[[7, 5]], 1);
        assert_eq!(mask[[0, 5]], 0);
        assert_eq!(mask[[8, 5]], 0);
        assert_eq!(mask[[5, 2]], 0);
        assert_eq!(mask[[5, 6]], 0);
    }

    #[test]
    fn test_seed_on_wall() {
        let grid = walled_rectangle();
        assert_eq!(
            fill(grid.view(), &Frame::default(), SeedPoint::new(2, 5)),
            Err(MaskError::SeedOnBarrier { row: 2, col: 5 })
        );
        assert_eq!(
            fill(grid.view(), &Frame::uniform(6), SeedPoint::new(5, 5)),
            Err(MaskError::SeedOnBarrier { row: 5, col: 5 })
        );
    }

    #[test]
    fn test_seed_out_of_bounds() {
        let grid = walled_rectangle();
        assert_eq!(
            fill(grid.view(), &Frame::default(), SeedPoint::new(12, 0)),
            Err(MaskError::SeedOutOfBounds {
                row: 12,
                col: 0,
                rows: 12,
                cols: 14
            })
        );
    }

    #[test]
    fn test_apply_frame_oversized() {
        let mut grid = Array2::<u8>::zeros((4, 4));
        apply_frame(&mut grid, &Frame::new(10, 0, 0, 0), 7);
        assert!(grid.iter().all(|&v| v == 7));
    }

    #[test]
    fn test_flood_fill_same_value_is_noop() {
        let mut grid = Array2::<u8>::zeros((3, 3));
        assert_eq!(flood_fill(&mut grid, SeedPoint::new(1, 1), 0), 0);
        assert_eq!(flood_fill(&mut grid, SeedPoint::new(1, 1), 9), 9);
        assert!(grid.iter().all(|&v| v == 9));
    }

    #[test]
    fn test_reclaim_boundary() {
        // Edge band at columns 2-3, casing occupies columns 0-2
        let mut mask = Array2::<u8>::zeros((5, 8));
        let mut edges = Array2::<u8>::zeros((5, 8));
        let mut casing = Array2::<u8>::zeros((5, 8));
        for r in 0..5 {
            edges[[r, 2]] = 255;
            edges[[r, 3]] = 255;
            for c in 0..3 {
                casing[[r, c]] = 255;
            }
            for c in 4..8 {
                mask[[r, c]] = 1;
            }
        }

        let added = reclaim_boundary(&mut mask, edges.view(), casing.view()).unwrap();

        assert_eq!(added, 5);
        assert!((0..5).all(|r| mask[[r, 3]] == 1));
        assert!((0..5).all(|r| mask[[r, 2]] == 0));
    }

    #[test]
    fn test_reclaim_boundary_rejects_mismatched_grids() {
        let mut mask = Array2::<u8>::zeros((5, 8));
        let edges = Array2::<u8>::zeros((5, 8));
        let casing = Array2::<u8>::zeros((4, 8));

        assert!(matches!(
            reclaim_boundary(&mut mask, edges.view(), casing.view()),
            Err(MaskError::InvalidParameter(_))
        ));
        assert!(matches!(
            reclaim_boundary(&mut mask, casing.view(), edges.view()),
            Err(MaskError::InvalidParameter(_))
        ));
    }
}
