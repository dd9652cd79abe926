//! Region-of-interest masking for CT scan slices
//!
//! Separates a scanned specimen from the casing and background around it.
//! [`create_mask`] turns a raw high-bit-depth slice into a binary mask and
//! [`apply_mask`] zeroes everything the mask rejects:
//!
//! ```rust
//! use ndarray::Array2;
//! use scanmask::{apply_mask, create_mask, Frame, MaskParams, SeedPoint};
//!
//! // Bright casing ring around a darker specimen
//! let image = Array2::from_shape_fn((100, 100), |(r, c)| {
//!     let inside = |lo: usize, hi: usize| (lo..hi).contains(&r) && (lo..hi).contains(&c);
//!     if inside(30, 70) {
//!         20000u16
//!     } else if inside(10, 90) {
//!         50000
//!     } else {
//!         0
//!     }
//! });
//!
//! let mut params = MaskParams::default();
//! params.intensity.low = 0.0;
//! params.downsample_factor = 1;
//! params.density.cycles = 1;
//! params.density.diff_multiplier = 0.0;
//! params.clusters.clusters = 2;
//! params.clusters.seed = Some(1);
//! params.min_component_size = 100;
//!
//! let mask = create_mask(image.view(), &Frame::default(), SeedPoint::new(50, 50), true, &params)?;
//! let masked = apply_mask(image.view(), mask.view())?;
//! assert_eq!(masked[[50, 50]], 20000);
//! assert_eq!(masked[[20, 20]], 0);
//! # Ok::<(), scanmask::MaskError>(())
//! ```

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod image_proc;
pub mod io;
pub mod mask;

pub use config::{Frame, MaskParams, SeedPoint};
pub use error::MaskError;
pub use mask::{apply_mask, create_mask};
