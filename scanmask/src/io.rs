//! Loading and saving scan slices as image files.
//!
//! Slices are read into `Array2<u16>` regardless of the file's bit depth, so
//! the mask pipeline always sees the sensor range. The output format follows
//! the file extension.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, Luma};
use ndarray::{Array2, ArrayView2};
use thiserror::Error;

use crate::image_proc::image::array2_to_gray_image;

/// Errors raised while reading or writing slice images.
#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("Image file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load a slice as 16-bit samples indexed `[row, col]`.
///
/// Color images are reduced to the mean of their red, green and blue
/// channels. 8-bit images are widened to 16 bits by the decoder, so a level of
/// 255 becomes 65535.
pub fn load_image(path: &Path) -> Result<Array2<u16>, ImageIoError> {
    if !path.exists() {
        return Err(ImageIoError::NotFound(path.to_path_buf()));
    }
    let img = image::open(path)?;
    Ok(dynamic_to_array2(&img))
}

fn dynamic_to_array2(img: &DynamicImage) -> Array2<u16> {
    let (width, height) = (img.width() as usize, img.height() as usize);

    if img.color().has_color() {
        let rgb = img.to_rgb16();
        Array2::from_shape_fn((height, width), |(y, x)| {
            let px = rgb.get_pixel(x as u32, y as u32);
            ((px[0] as u32 + px[1] as u32 + px[2] as u32) / 3) as u16
        })
    } else {
        let luma = img.to_luma16();
        Array2::from_shape_fn((height, width), |(y, x)| luma.get_pixel(x as u32, y as u32)[0])
    }
}

/// Write an 8-bit grid as a grayscale image.
pub fn save_gray_u8(arr: ArrayView2<u8>, path: &Path) -> Result<(), ImageIoError> {
    array2_to_gray_image(arr).save(path)?;
    Ok(())
}

/// Write a 16-bit grid as a grayscale image.
///
/// The target format must support 16-bit luma (PNG and TIFF do).
pub fn save_gray_u16(arr: ArrayView2<u16>, path: &Path) -> Result<(), ImageIoError> {
    let (height, width) = arr.dim();
    let img: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            Luma([arr[[y as usize, x as usize]]])
        });
    img.save(path)?;
    Ok(())
}
