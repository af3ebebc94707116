//! Backend-agnostic plane draw preparation.
//!
//! [`PlaneRenderer`] performs everything the plane pass needs on the CPU:
//! culling, draw ordering, fade mesh generation and uniform computation. The
//! actual GPU upload and draw happen in the caller's closure.

use crate::boundary::boundary_from_flat;
use crate::draw::{
    plane_uv_matrix, sort_planes_for_drawing, PlaneId, PlaneIndexMap, PlaneSnapshot,
};
use crate::fade_mesh::{FadeMeshBuilder, FadeMeshParams};
use arsample_core::Pose;
use log::{trace, warn};
use nalgebra::{Matrix2, Matrix4, Vector3};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Grid shader control: dot threshold, line threshold, line fade shrink,
/// occlusion shrink.
pub const GRID_CONTROL: [f32; 4] = [0.2, 0.4, 2.0, 1.5];

/// Primitive topology of every plane mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveMode {
    TriangleStrip,
}

/// Shader inputs for one plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneUniforms {
    pub model: Matrix4<f32>,
    pub model_view_projection: Matrix4<f32>,
    pub uv_matrix: Matrix2<f32>,
    pub normal: Vector3<f32>,
    pub grid_control: [f32; 4],
}

/// Everything needed to issue one plane draw call.
///
/// Vertex and index slices borrow the renderer's scratch buffers and are
/// only valid inside the draw callback.
#[derive(Debug)]
pub struct PlaneDrawCall<'a> {
    pub plane: PlaneId,
    pub plane_index: usize,
    pub distance: f32,
    pub primitive: PrimitiveMode,
    pub uniforms: PlaneUniforms,
    pub vertices: &'a [f32],
    pub indices: &'a [u32],
}

#[derive(Clone, Debug, Default)]
pub struct PlaneRenderer {
    mesh: FadeMeshBuilder,
    plane_indices: PlaneIndexMap,
}

impl PlaneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: FadeMeshParams) -> Self {
        Self {
            mesh: FadeMeshBuilder::with_params(params),
            plane_indices: PlaneIndexMap::new(),
        }
    }

    pub fn plane_indices(&self) -> &PlaneIndexMap {
        &self.plane_indices
    }

    /// Prepare the visible planes far to near and hand each one to `draw`.
    ///
    /// Planes with an unusable polygon (odd-length buffer, fewer than three
    /// points) are skipped. Returns the number of draw calls issued.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(planes = planes.len()))
    )]
    pub fn draw_planes<F>(
        &mut self,
        planes: &[PlaneSnapshot],
        camera_pose: &Pose,
        projection: &Matrix4<f32>,
        mut draw: F,
    ) -> usize
    where
        F: FnMut(&PlaneDrawCall<'_>),
    {
        let view = camera_pose.inverse();

        let mut issued = 0;
        for sorted in sort_planes_for_drawing(planes, camera_pose) {
            let plane = sorted.plane;
            let boundary = match boundary_from_flat(&plane.polygon) {
                Ok(boundary) => boundary,
                Err(err) => {
                    warn!("plane {}: {err}", plane.id.0);
                    continue;
                }
            };
            if self
                .mesh
                .update(Some(&boundary), plane.extent_x, plane.extent_z)
                == 0
            {
                trace!("plane {} has no drawable boundary", plane.id.0);
                continue;
            }

            let plane_index = self.plane_indices.index_of(plane.id);
            let model = plane.center_pose.to_matrix();
            let model_view = view.compose(&plane.center_pose).to_matrix();
            let call = PlaneDrawCall {
                plane: plane.id,
                plane_index,
                distance: sorted.distance,
                primitive: PrimitiveMode::TriangleStrip,
                uniforms: PlaneUniforms {
                    model,
                    model_view_projection: projection * model_view,
                    uv_matrix: plane_uv_matrix(plane_index),
                    normal: plane.center_pose.y_axis(),
                    grid_control: GRID_CONTROL,
                },
                vertices: self.mesh.vertices(),
                indices: self.mesh.indices(),
            };
            draw(&call);
            issued += 1;
        }
        issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fade_mesh::COORDS_PER_VERTEX;
    use approx::assert_relative_eq;
    use arsample_core::TrackingState;
    use nalgebra::Point3;

    fn plane(id: u64, y: f32, polygon: Vec<f32>) -> PlaneSnapshot {
        PlaneSnapshot {
            id: PlaneId(id),
            tracking_state: TrackingState::Tracking,
            subsumed_by: None,
            center_pose: Pose::from_translation(0.0, y, 0.0),
            extent_x: 2.0,
            extent_z: 2.0,
            polygon,
        }
    }

    fn square() -> Vec<f32> {
        vec![-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0]
    }

    #[derive(Debug)]
    struct Recorded {
        id: u64,
        index: usize,
        vertices: usize,
        indices: Vec<u32>,
        uniforms: PlaneUniforms,
    }

    fn record(
        renderer: &mut PlaneRenderer,
        planes: &[PlaneSnapshot],
        camera: &Pose,
    ) -> Vec<Recorded> {
        let mut out = Vec::new();
        renderer.draw_planes(planes, camera, &Matrix4::identity(), |call| {
            assert_eq!(call.primitive, PrimitiveMode::TriangleStrip);
            out.push(Recorded {
                id: call.plane.0,
                index: call.plane_index,
                vertices: call.vertices.len() / COORDS_PER_VERTEX,
                indices: call.indices.to_vec(),
                uniforms: call.uniforms,
            });
        });
        out
    }

    #[test]
    fn draws_visible_planes_far_to_near_with_fade_meshes() {
        let camera = Pose::from_translation(0.0, 1.6, 0.0);
        let planes = vec![plane(10, 0.0, square()), plane(11, -0.5, square())];
        let mut renderer = PlaneRenderer::new();

        let calls = record(&mut renderer, &planes, &camera);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, 11);
        assert_eq!(calls[1].id, 10);
        for call in &calls {
            assert_eq!(call.vertices, 8);
            assert_eq!(call.indices.len(), 12);
        }
        assert_eq!(calls[0].index, 0);
        assert_eq!(calls[1].index, 1);
    }

    #[test]
    fn skips_planes_without_usable_polygon() {
        let camera = Pose::from_translation(0.0, 1.0, 0.0);
        let planes = vec![
            plane(1, 0.0, vec![0.0, 0.0, 1.0]),
            plane(2, 0.0, vec![0.0, 0.0, 1.0, 0.0]),
            plane(3, 0.0, Vec::new()),
            plane(4, 0.0, square()),
        ];
        let mut renderer = PlaneRenderer::new();
        let calls = record(&mut renderer, &planes, &camera);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, 4);
    }

    #[test]
    fn plane_index_survives_across_frames() {
        let camera = Pose::from_translation(0.0, 1.0, 0.0);
        let mut renderer = PlaneRenderer::new();
        record(&mut renderer, &[plane(7, 0.0, square())], &camera);
        let calls = record(
            &mut renderer,
            &[plane(8, -1.0, square()), plane(7, 0.0, square())],
            &camera,
        );
        let seven = calls.iter().find(|c| c.id == 7).expect("plane 7");
        let eight = calls.iter().find(|c| c.id == 8).expect("plane 8");
        assert_eq!(seven.index, 0);
        assert_eq!(eight.index, 1);
        assert_eq!(seven.uniforms.uv_matrix, plane_uv_matrix(0));
    }

    #[test]
    fn model_view_projection_maps_plane_center_into_camera_frame() {
        let camera = Pose::from_translation(0.0, 2.0, 0.0);
        let mut renderer = PlaneRenderer::new();
        let calls = record(&mut renderer, &[plane(1, 0.5, square())], &camera);
        let u = calls[0].uniforms;

        let center = u.model_view_projection * Point3::<f32>::origin().to_homogeneous();
        assert_relative_eq!(center.y, -1.5, epsilon = 1e-6);
        assert_relative_eq!(u.normal, Vector3::y(), epsilon = 1e-6);
        assert_eq!(u.grid_control, GRID_CONTROL);
    }
}
