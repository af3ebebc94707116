//! CPU-side image utilities for AR camera frames.
//!
//! The camera image arrives as a single-channel luminance plane (or RGBA for
//! image tracking); these routines run on it without any GPU involvement.
//! Raw depth images from the depth API are unprojected into point clouds.

pub mod depth;
mod grayscale;
pub mod sobel;

pub use depth::{
    depth_to_points, points_to_world, subsampling_step, yuv_to_rgb, CameraIntrinsics, DepthError,
    DepthImageView, DepthPoint,
};
pub use grayscale::{rgba_to_gray, RgbaImageView, LUMA_WEIGHTS};
pub use sobel::{sobel_edges, EdgeDetectError, EdgeDetector, SobelParams, SOBEL_EDGE_THRESHOLD};
