use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2};

/// Converts an ndarray view of u8 samples to an image::GrayImage
///
/// Array indices [row, col] map to pixel coordinates (x = col, y = row).
/// Note that array dimensions are (height, width) while image dimensions are (width, height).
///
/// # Arguments
/// * `arr` - View of an Array2<u8> containing grayscale pixel values
///
/// # Returns
/// * A new GrayImage containing the same data as the array
pub fn array2_to_gray_image(arr: ArrayView2<u8>) -> GrayImage {
    let (height, width) = arr.dim();
    let mut img = GrayImage::new(width as u32, height as u32);

    for y in 0..height {
        for x in 0..width {
            img.put_pixel(x as u32, y as u32, Luma([arr[[y, x]]]));
        }
    }

    img
}

/// Converts an image::GrayImage back into a (height, width) Array2<u8>
pub fn gray_image_to_array2(img: &GrayImage) -> Array2<u8> {
    let (width, height) = img.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        img.get_pixel(x as u32, y as u32)[0]
    })
}

/// Resample an 8-bit grid to `(rows, cols)` with the given filter.
///
/// Same-size requests return a copy without resampling.
pub fn resize(arr: ArrayView2<u8>, dim: (usize, usize), filter: FilterType) -> Array2<u8> {
    if arr.dim() == dim {
        return arr.to_owned();
    }
    let (rows, cols) = dim;
    let resized = imageops::resize(
        &array2_to_gray_image(arr),
        cols as u32,
        rows as u32,
        filter,
    );
    gray_image_to_array2(&resized)
}

/// Dimensions after shrinking each axis by `factor`, never below one pixel.
pub fn reduced_dim(dim: (usize, usize), factor: usize) -> (usize, usize) {
    let factor = factor.max(1);
    ((dim.0 / factor).max(1), (dim.1 / factor).max(1))
}

/// Shrink an 8-bit grid by `factor` per axis with bilinear filtering.
pub fn downsample(arr: ArrayView2<u8>, factor: usize) -> Array2<u8> {
    resize(arr, reduced_dim(arr.dim(), factor), FilterType::Triangle)
}

/// Resize a label grid with nearest-neighbor sampling, preserving its levels.
pub fn resize_nearest(arr: ArrayView2<u8>, dim: (usize, usize)) -> Array2<u8> {
    resize(arr, dim, FilterType::Nearest)
}
