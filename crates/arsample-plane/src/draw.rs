use arsample_core::{Pose, TrackingState};
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Density of the grid texture on the plane, in dots per meter.
pub const DOTS_PER_METER: f32 = 10.0;

/// Grid rotation added per plane index, in radians.
pub const PLANE_ANGLE_STEP_RAD: f32 = 0.144;

/// Aspect correction for the triangular grid texture (`1 / sqrt(3)`).
pub const EQUILATERAL_TRIANGLE_SCALE: f32 = 0.577_350_26;

/// Runtime-assigned identity of a plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaneId(pub u64);

/// Per-frame snapshot of a detected plane, as reported by the AR runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneSnapshot {
    pub id: PlaneId,
    pub tracking_state: TrackingState,
    /// Set when this plane has been merged into another one.
    #[serde(default)]
    pub subsumed_by: Option<PlaneId>,
    /// Center pose; its local +Y axis is the plane normal.
    pub center_pose: Pose,
    pub extent_x: f32,
    pub extent_z: f32,
    /// Boundary polygon as flat `[x0, z0, x1, z1, ...]` in the center pose frame.
    pub polygon: Vec<f32>,
}

impl PlaneSnapshot {
    /// Whether the plane should be drawn at all this frame.
    pub fn is_drawable(&self) -> bool {
        self.tracking_state.is_tracking() && self.subsumed_by.is_none()
    }
}

/// Signed distance from the plane to the camera along the plane normal.
///
/// `plane_pose` must have its +Y axis along the plane normal (a plane's
/// center pose or a hit pose on it). Negative values mean the camera is
/// behind the plane.
pub fn distance_to_plane(plane_pose: &Pose, camera_pose: &Pose) -> f32 {
    let normal = plane_pose.y_axis();
    normal.dot(&(camera_pose.position() - plane_pose.position()))
}

#[derive(Clone, Copy, Debug)]
pub struct SortedPlane<'a> {
    pub distance: f32,
    pub plane: &'a PlaneSnapshot,
}

/// Select the planes to draw and order them by descending camera distance.
///
/// Planes that are not tracking, were subsumed, or face away from the
/// camera are dropped.
pub fn sort_planes_for_drawing<'a>(
    planes: &'a [PlaneSnapshot],
    camera_pose: &Pose,
) -> Vec<SortedPlane<'a>> {
    let mut sorted: Vec<SortedPlane<'a>> = planes
        .iter()
        .filter(|p| p.is_drawable())
        .filter_map(|plane| {
            let distance = distance_to_plane(&plane.center_pose, camera_pose);
            // Back-facing.
            (distance >= 0.0).then_some(SortedPlane { distance, plane })
        })
        .collect();
    sorted.sort_by(|a, b| b.distance.total_cmp(&a.distance));
    sorted
}

/// Stable small integers for planes, assigned in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct PlaneIndexMap {
    indices: HashMap<PlaneId, usize>,
}

impl PlaneIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_of(&mut self, id: PlaneId) -> usize {
        let next = self.indices.len();
        *self.indices.entry(id).or_insert(next)
    }

    pub fn get(&self, id: PlaneId) -> Option<usize> {
        self.indices.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }
}

/// 2x2 matrix rotating and scaling plane-local coordinates into grid UVs.
///
/// Each plane index gets its own rotation so neighbouring planes are easy to
/// tell apart. `as_slice()` yields the column-major `mat2` uniform layout.
pub fn plane_uv_matrix(plane_index: usize) -> Matrix2<f32> {
    let angle = plane_index as f32 * PLANE_ANGLE_STEP_RAD;
    let (sin, cos) = angle.sin_cos();
    let u_scale = DOTS_PER_METER;
    let v_scale = DOTS_PER_METER * EQUILATERAL_TRIANGLE_SCALE;
    Matrix2::new(cos * u_scale, sin * u_scale, -sin * v_scale, cos * v_scale)
}
