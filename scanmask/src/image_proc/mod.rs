//! Image processing stages for region-of-interest masking
//!
//! Each stage works in a fixed intensity domain: raw samples go in through
//! [`normalize`], everything downstream sees 0-255 levels, edge grids hold
//! {0, 255} and finished masks hold {0, 1}.

pub mod cluster;
pub mod coarse;
pub mod components;
pub mod convolve;
pub mod density;
pub mod edges;
pub mod fill;
pub mod image;
pub mod normalize;

// Re-export key functionality for easier access
pub use cluster::{kmeans, segment, Clustering};
pub use coarse::{apply_scanline, coarse_boundary};
pub use components::{find_components, prune, Component, PruneSummary};
pub use convolve::{box_blur, sobel_magnitude};
pub use density::enhance;
pub use edges::{edges, gradient_magnitude, select_brightest};
pub use fill::{apply_frame, fill, flood_fill, reclaim_boundary};
pub use normalize::{clamp_in_place, normalize, renormalize, value_range};
