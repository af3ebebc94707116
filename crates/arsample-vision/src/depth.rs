//! Raw depth images to point clouds.
//!
//! Depth pixels are millimeters stored as `u16`, tightly packed; 0 marks a
//! missing estimate. Each kept pixel becomes a camera-space point (`+Y` up,
//! `-Z` forward) paired with the confidence byte normalized to `[0, 1]`.

use arsample_core::{check_layout, GrayImageView, ImageLayoutError, Pose};
use log::debug;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DepthError {
    #[error(transparent)]
    Layout(#[from] ImageLayoutError),

    #[error("confidence image is {got_width}x{got_height}, depth image is {width}x{height}")]
    ConfidenceSizeMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },

    #[error("invalid camera intrinsics: {reason}")]
    InvalidIntrinsics { reason: &'static str },

    #[error("point limit must be positive")]
    ZeroPointLimit,
}

/// Pinhole intrinsics of the camera texture, in pixels of `image_size`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub focal_length: [f32; 2],
    pub principal_point: [f32; 2],
    pub image_size: [usize; 2],
}

impl CameraIntrinsics {
    /// The same camera expressed in pixels of a `width x height` image.
    pub fn rescaled(&self, width: usize, height: usize) -> Result<Self, DepthError> {
        let [iw, ih] = self.image_size;
        if iw == 0 || ih == 0 {
            return Err(DepthError::InvalidIntrinsics {
                reason: "zero image size",
            });
        }
        if !(self.focal_length[0] > 0.0 && self.focal_length[1] > 0.0) {
            return Err(DepthError::InvalidIntrinsics {
                reason: "focal length must be positive",
            });
        }
        let sx = width as f32 / iw as f32;
        let sy = height as f32 / ih as f32;
        Ok(Self {
            focal_length: [self.focal_length[0] * sx, self.focal_length[1] * sy],
            principal_point: [self.principal_point[0] * sx, self.principal_point[1] * sy],
            image_size: [width, height],
        })
    }
}

/// Borrowed depth image, millimeters per pixel, no row padding.
#[derive(Clone, Copy, Debug)]
pub struct DepthImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u16],
}

impl<'a> DepthImageView<'a> {
    pub fn new(width: usize, height: usize, data: &'a [u16]) -> Result<Self, ImageLayoutError> {
        check_layout(width, height, width, 1, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.data[y * self.width + x]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthPoint {
    pub position: Point3<f32>,
    /// Depth confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Row/column increment that samples a `width x height` image about `limit` times.
pub fn subsampling_step(width: usize, height: usize, limit: usize) -> usize {
    if limit == 0 {
        return 1;
    }
    let step = ((width as f32 * height as f32) / limit as f32).sqrt().ceil() as usize;
    step.max(1)
}

/// Unproject a depth image into camera-space points with confidences.
///
/// `intrinsics` describe the camera texture and are rescaled to the depth
/// image size. At most about `point_limit` pixels are visited, on a uniform
/// grid; pixels without a depth estimate are skipped.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(width = depth.width, height = depth.height))
)]
pub fn depth_to_points(
    depth: &DepthImageView<'_>,
    confidence: &GrayImageView<'_>,
    intrinsics: &CameraIntrinsics,
    point_limit: usize,
) -> Result<Vec<DepthPoint>, DepthError> {
    check_layout(depth.width, depth.height, depth.width, 1, depth.data.len())?;
    confidence.validate()?;
    if (confidence.width, confidence.height) != (depth.width, depth.height) {
        return Err(DepthError::ConfidenceSizeMismatch {
            width: depth.width,
            height: depth.height,
            got_width: confidence.width,
            got_height: confidence.height,
        });
    }
    if point_limit == 0 {
        return Err(DepthError::ZeroPointLimit);
    }

    let k = intrinsics.rescaled(depth.width, depth.height)?;
    let [fx, fy] = k.focal_length;
    let [cx, cy] = k.principal_point;
    let step = subsampling_step(depth.width, depth.height, point_limit);

    let mut points =
        Vec::with_capacity(depth.width.div_ceil(step) * depth.height.div_ceil(step));
    for y in (0..depth.height).step_by(step) {
        for x in (0..depth.width).step_by(step) {
            let mm = depth.get(x, y);
            if mm == 0 {
                continue;
            }
            let d = mm as f32 / 1000.0;
            points.push(DepthPoint {
                position: Point3::new(
                    d * (x as f32 - cx) / fx,
                    d * (cy - y as f32) / fy,
                    -d,
                ),
                confidence: confidence.get(x, y) as f32 / 255.0,
            });
        }
    }
    debug!(
        "depth {}x{} step {step}: {} points",
        depth.width,
        depth.height,
        points.len()
    );
    Ok(points)
}

/// Move camera-space points into world space.
pub fn points_to_world(points: &mut [DepthPoint], camera_pose: &Pose) {
    for p in points {
        p.position = camera_pose.transform_point(&p.position);
    }
}

/// YUV (each channel in `0..=255`) to RGB in `[0, 1]`.
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [f32; 3] {
    let y = y as f32 / 255.0;
    let u = u as f32 * 0.872 / 255.0 - 0.436;
    let v = v as f32 * 1.230 / 255.0 - 0.615;
    [
        (y + 1.139_83 * v).clamp(0.0, 1.0),
        (y - 0.394_65 * u - 0.580_60 * v).clamp(0.0, 1.0),
        (y + 2.032_11 * u).clamp(0.0, 1.0),
    ]
}
