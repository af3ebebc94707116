use nalgebra::{Isometry3, Matrix4, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Rigid transform from a local frame into world space.
///
/// Matches the pose convention of the AR runtime: rotation first, then
/// translation. Raw poses arrive as `[qx, qy, qz, qw, tx, ty, tz]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub rotation: UnitQuaternion<f32>,
    pub translation: Vector3<f32>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub fn new(rotation: UnitQuaternion<f32>, translation: Vector3<f32>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::new(x, y, z))
    }

    /// Build a pose from the runtime's raw `[qx, qy, qz, qw, tx, ty, tz]` layout.
    ///
    /// The quaternion is renormalized; a zero quaternion yields identity rotation.
    pub fn from_raw(raw: [f32; 7]) -> Self {
        let q = Quaternion::new(raw[3], raw[0], raw[1], raw[2]);
        let rotation =
            UnitQuaternion::try_new(q, f32::EPSILON).unwrap_or_else(UnitQuaternion::identity);
        Self::new(rotation, Vector3::new(raw[4], raw[5], raw[6]))
    }

    /// Origin of the local frame in world coordinates.
    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.translation)
    }

    /// Local axis `axis` (0 = X, 1 = Y, 2 = Z) scaled by `scale`, rotated into world space.
    ///
    /// Returns `None` for an axis index above 2.
    pub fn transformed_axis(&self, axis: usize, scale: f32) -> Option<Vector3<f32>> {
        let mut local = Vector3::zeros();
        *local.get_mut(axis)? = scale;
        Some(self.rotation * local)
    }

    /// Local +Y axis in world space. Plane poses use it as the surface normal.
    pub fn y_axis(&self) -> Vector3<f32> {
        self.rotation * Vector3::y()
    }

    pub fn transform_point(&self, p: &Point3<f32>) -> Point3<f32> {
        self.isometry().transform_point(p)
    }

    pub fn inverse(&self) -> Self {
        let inv = self.isometry().inverse();
        Self::new(inv.rotation, inv.translation.vector)
    }

    pub fn compose(&self, rhs: &Pose) -> Self {
        let iso = self.isometry() * rhs.isometry();
        Self::new(iso.rotation, iso.translation.vector)
    }

    /// Column-major 4x4 model matrix.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        self.isometry().to_homogeneous()
    }

    fn isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }
}
