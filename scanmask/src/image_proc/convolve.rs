//! Fixed-kernel filters on 8-bit grids: uniform box blur and Sobel gradients.
//!
//! Both filters pad the image with reflect-101 borders (`gfedcb|abcdefgh|gfedcba`),
//! so kernels larger than the image still read valid samples. Even-sized box
//! kernels are anchored at `size / 2`, i.e. the window covers offsets
//! `-size/2 ..= size - 1 - size/2`.

use ndarray::{Array2, ArrayView2};

/// Map an out-of-range index back into `0..len` by reflecting about the edge pixels.
#[inline]
pub fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let n = len as isize;
    let period = 2 * n - 2;
    let wrapped = index.rem_euclid(period);
    if wrapped >= n {
        (period - wrapped) as usize
    } else {
        wrapped as usize
    }
}

/// Sums of every `size`-wide window along a line, with reflect-101 padding.
///
/// `prefix` is scratch space reused across lines.
fn window_sums(line: &[u64], size: usize, prefix: &mut Vec<u64>, out: &mut [u64]) {
    let len = line.len();
    let anchor = (size / 2) as isize;

    prefix.clear();
    prefix.push(0);
    for p in 0..len + size - 1 {
        let src = reflect_101(p as isize - anchor, len);
        let running = prefix[p] + line[src];
        prefix.push(running);
    }

    for (i, o) in out.iter_mut().enumerate().take(len) {
        *o = prefix[i + size] - prefix[i];
    }
}

/// Mean-filter an 8-bit image with a square `size`x`size` uniform kernel.
///
/// The kernel weights sum to one, and results are rounded back to 8 bits.
/// Running sums make the cost independent of the kernel size, which matters
/// for the 80-pixel background kernel on full-resolution slices.
///
/// # Arguments
/// * `image` - Normalized input image
/// * `size` - Kernel edge length in pixels, must be non-zero
pub fn box_blur(image: ArrayView2<u8>, size: usize) -> Array2<u8> {
    debug_assert!(size > 0, "box kernel size must be non-zero");
    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 || size == 0 {
        return image.to_owned();
    }

    let longest = rows.max(cols);
    let mut line = Vec::with_capacity(longest);
    let mut sums = vec![0u64; longest];
    let mut prefix = Vec::with_capacity(longest + size);

    // Horizontal pass
    let mut horizontal = Array2::<u64>::zeros((rows, cols));
    for (src, mut dst) in image.rows().into_iter().zip(horizontal.rows_mut()) {
        line.clear();
        line.extend(src.iter().map(|&v| v as u64));
        window_sums(&line, size, &mut prefix, &mut sums[..cols]);
        for (d, &s) in dst.iter_mut().zip(&sums[..cols]) {
            *d = s;
        }
    }

    // Vertical pass, dividing by the kernel area
    let area = (size * size) as f64;
    let mut blurred = Array2::<u8>::zeros((rows, cols));
    for (src, mut dst) in horizontal.columns().into_iter().zip(blurred.columns_mut()) {
        line.clear();
        line.extend(src.iter().copied());
        window_sums(&line, size, &mut prefix, &mut sums[..rows]);
        for (d, &s) in dst.iter_mut().zip(&sums[..rows]) {
            *d = (s as f64 / area).round().min(255.0) as u8;
        }
    }

    blurred
}

/// Sobel gradient magnitude `sqrt(gx² + gy²)` using 3x3 first-derivative kernels.
pub fn sobel_magnitude(image: ArrayView2<u8>) -> Array2<f32> {
    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 {
        return Array2::zeros((rows, cols));
    }

    let at = |r: isize, c: isize| -> f32 {
        image[[reflect_101(r, rows), reflect_101(c, cols)]] as f32
    };

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (r, c) = (r as isize, c as isize);
        let gx = (at(r - 1, c + 1) + 2.0 * at(r, c + 1) + at(r + 1, c + 1))
            - (at(r - 1, c - 1) + 2.0 * at(r, c - 1) + at(r + 1, c - 1));
        let gy = (at(r + 1, c - 1) + 2.0 * at(r + 1, c) + at(r + 1, c + 1))
            - (at(r - 1, c - 1) + 2.0 * at(r - 1, c) + at(r - 1, c + 1));
        gx.hypot(gy)
    })
}
