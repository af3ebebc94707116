//! Fading-edge triangle strips for plane boundary polygons.
//!
//! Each boundary vertex contributes an outer vertex (alpha 0) and an inner
//! vertex pulled towards the plane center (alpha 1). The strip first walks
//! the ring between the two outlines, then zig-zags across the inner
//! outline to fill the interior:
//!
//! ```text
//! perimeter: 2(n-1), 0, 1, 2, 3, ..., 2(n-1), 2(n-1)+1, 1
//! interior:  2(n-2)+1, 3, 2(n-3)+1, 5, ...  (+ 2(n/2)+1 when n is odd)
//! ```
//!
//! The result has `2n` vertices and `3n` indices, i.e. `3n - 2` strip
//! triangles: `2n` for the fade band and `n - 2` for the fill.

use crate::buffer::DoublingBuffer;
use crate::boundary::PlaneMeshError;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Default width of the fade band, in meters.
pub const FADE_RADIUS_M: f32 = 0.25;

/// Floats per vertex: plane-local x, plane-local z, alpha.
pub const COORDS_PER_VERTEX: usize = 3;

const VERTS_PER_BOUNDARY_VERT: usize = 2;
const INDICES_PER_BOUNDARY_VERT: usize = 3;
const INITIAL_BUFFER_BOUNDARY_VERTS: usize = 64;

/// Initial vertex scratch capacity, in floats.
pub const INITIAL_VERTEX_CAPACITY: usize =
    COORDS_PER_VERTEX * VERTS_PER_BOUNDARY_VERT * INITIAL_BUFFER_BOUNDARY_VERTS;

/// Initial index scratch capacity, in indices.
pub const INITIAL_INDEX_CAPACITY: usize =
    INDICES_PER_BOUNDARY_VERT * INDICES_PER_BOUNDARY_VERT * INITIAL_BUFFER_BOUNDARY_VERTS;

/// Smallest boundary that encloses an area.
pub const MIN_BOUNDARY_VERTICES: usize = 3;

/// Parameters for fade mesh generation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeMeshParams {
    /// Physical width of the fade band along each axis.
    pub fade_radius: f32,
}

impl Default for FadeMeshParams {
    fn default() -> Self {
        Self {
            fade_radius: FADE_RADIUS_M,
        }
    }
}

impl FadeMeshParams {
    /// Per-axis shrink factor for the inner outline.
    ///
    /// Planes narrower than two fade radii collapse the inner outline onto
    /// the center; the resulting zero-area triangles rasterize to nothing.
    pub fn inset_scale(&self, extent: f32) -> f32 {
        let scale = (extent - 2.0 * self.fade_radius) / extent;
        if scale.is_nan() {
            0.0
        } else {
            scale.max(0.0)
        }
    }
}

/// Index width a graphics backend should use for a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    pub fn for_vertex_count(vertices: usize) -> Self {
        if vertices <= u16::MAX as usize + 1 {
            IndexFormat::U16
        } else {
            IndexFormat::U32
        }
    }
}

/// Owned fade mesh, detached from any builder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FadeMesh {
    /// Interleaved `(x, z, alpha)` triples.
    pub vertices: Vec<f32>,
    /// Triangle-strip indices into `vertices`.
    pub indices: Vec<u32>,
}

impl FadeMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / COORDS_PER_VERTEX
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of triangles the strip rasterizes (degenerate ones included).
    pub fn triangle_count(&self) -> usize {
        self.indices.len().saturating_sub(2)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn index_format(&self) -> IndexFormat {
        IndexFormat::for_vertex_count(self.vertex_count())
    }

    pub fn indices_u16(&self) -> Result<Vec<u16>, PlaneMeshError> {
        narrow_indices(&self.indices, self.vertex_count())
    }

    /// Vertex `i` as `[x, z, alpha]`.
    pub fn vertex(&self, i: usize) -> Option<[f32; 3]> {
        let start = i.checked_mul(COORDS_PER_VERTEX)?;
        let v = self.vertices.get(start..start + COORDS_PER_VERTEX)?;
        Some([v[0], v[1], v[2]])
    }
}

/// Generates fade meshes into scratch buffers reused across frames.
///
/// The buffers start at 64 boundary vertices worth of storage and double
/// whenever a larger polygon arrives; they never shrink.
#[derive(Clone, Debug)]
pub struct FadeMeshBuilder {
    params: FadeMeshParams,
    vertices: DoublingBuffer<f32>,
    indices: DoublingBuffer<u32>,
}

impl Default for FadeMeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FadeMeshBuilder {
    pub fn new() -> Self {
        Self::with_params(FadeMeshParams::default())
    }

    pub fn with_params(params: FadeMeshParams) -> Self {
        Self {
            params,
            vertices: DoublingBuffer::with_capacity(INITIAL_VERTEX_CAPACITY),
            indices: DoublingBuffer::with_capacity(INITIAL_INDEX_CAPACITY),
        }
    }

    pub fn params(&self) -> &FadeMeshParams {
        &self.params
    }

    /// Regenerate the mesh for `boundary` with the plane's extents.
    ///
    /// A missing boundary, or one with fewer than three points, leaves the
    /// mesh empty. Returns the number of boundary vertices meshed.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, boundary), fields(n = boundary.map_or(0, |b| b.len())))
    )]
    pub fn update(
        &mut self,
        boundary: Option<&[Point2<f32>]>,
        extent_x: f32,
        extent_z: f32,
    ) -> usize {
        let Some(boundary) = boundary else {
            self.clear();
            return 0;
        };
        let n = boundary.len();
        if n < MIN_BOUNDARY_VERTICES {
            if n > 0 {
                debug!("skipping plane boundary with {n} vertices (need {MIN_BOUNDARY_VERTICES})");
            }
            self.clear();
            return 0;
        }

        let num_vertices = n * VERTS_PER_BOUNDARY_VERT;
        let num_indices = n * INDICES_PER_BOUNDARY_VERT;
        if self.vertices.reset_for(num_vertices * COORDS_PER_VERTEX) {
            debug!(
                "grew plane vertex buffer to {} floats",
                self.vertices.capacity()
            );
        }
        if self.indices.reset_for(num_indices) {
            debug!(
                "grew plane index buffer to {} indices",
                self.indices.capacity()
            );
        }

        let x_scale = self.params.inset_scale(extent_x);
        let z_scale = self.params.inset_scale(extent_z);

        for p in boundary {
            self.vertices.push(p.x);
            self.vertices.push(p.y);
            self.vertices.push(0.0);
            self.vertices.push(p.x * x_scale);
            self.vertices.push(p.y * z_scale);
            self.vertices.push(1.0);
        }

        let n = n as u32;

        // Perimeter: start on the last outer vertex so the strip's first
        // triangle closes the band between boundary vertices n-1 and 0.
        self.indices.push((n - 1) * 2);
        for i in 0..n {
            self.indices.push(i * 2);
            self.indices.push(i * 2 + 1);
        }
        self.indices.push(1);
        // The strip now sits on the inner edge between inset vertices n-1 and 0.

        // Interior: zig-zag between opposite inner vertices.
        for i in 1..n / 2 {
            self.indices.push((n - 1 - i) * 2 + 1);
            self.indices.push(i * 2 + 1);
        }
        if n % 2 != 0 {
            self.indices.push((n / 2) * 2 + 1);
        }

        debug_assert_eq!(self.vertices.len(), num_vertices * COORDS_PER_VERTEX);
        debug_assert_eq!(self.indices.len(), num_indices);
        n as usize
    }

    /// Drop the current mesh, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn vertices(&self) -> &[f32] {
        self.vertices.as_slice()
    }

    pub fn indices(&self) -> &[u32] {
        self.indices.as_slice()
    }

    pub fn indices_u16(&self) -> Result<Vec<u16>, PlaneMeshError> {
        narrow_indices(self.indices(), self.vertex_count())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / COORDS_PER_VERTEX
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Vertex scratch capacity, in floats.
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.capacity()
    }

    /// Index scratch capacity, in indices.
    pub fn index_capacity(&self) -> usize {
        self.indices.capacity()
    }

    /// Copy the current mesh out of the scratch buffers.
    pub fn to_mesh(&self) -> FadeMesh {
        FadeMesh {
            vertices: self.vertices().to_vec(),
            indices: self.indices().to_vec(),
        }
    }
}

/// One-shot fade mesh generation with fresh buffers.
pub fn build_fade_mesh(
    boundary: &[Point2<f32>],
    extent_x: f32,
    extent_z: f32,
    params: FadeMeshParams,
) -> FadeMesh {
    let mut builder = FadeMeshBuilder::with_params(params);
    builder.update(Some(boundary), extent_x, extent_z);
    builder.to_mesh()
}

fn narrow_indices(indices: &[u32], vertex_count: usize) -> Result<Vec<u16>, PlaneMeshError> {
    if IndexFormat::for_vertex_count(vertex_count) != IndexFormat::U16 {
        return Err(PlaneMeshError::TooManyVerticesForU16 {
            vertices: vertex_count,
        });
    }
    Ok(indices.iter().map(|&i| i as u16).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point2<f32>> {
        vec![
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ]
    }

    fn regular_polygon(n: usize, radius: f32) -> Vec<Point2<f32>> {
        (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * std::f32::consts::TAU;
                Point2::new(radius * a.cos(), radius * a.sin())
            })
            .collect()
    }

    #[test]
    fn square_inner_ring_is_inset_by_fade_radius() {
        let mesh = build_fade_mesh(&square(), 2.0, 2.0, FadeMeshParams::default());
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.index_count(), 12);

        let expected_inner = [(-0.75, -0.75), (0.75, -0.75), (0.75, 0.75), (-0.75, 0.75)];
        for (i, (x, z)) in expected_inner.iter().enumerate() {
            let outer = mesh.vertex(2 * i).expect("outer");
            let inner = mesh.vertex(2 * i + 1).expect("inner");
            assert_eq!(outer[2], 0.0);
            assert_eq!(inner[2], 1.0);
            assert_relative_eq!(inner[0], *x, epsilon = 1e-6);
            assert_relative_eq!(inner[1], *z, epsilon = 1e-6);
        }
    }

    #[test]
    fn square_index_sequence_matches_strip_layout() {
        let mesh = build_fade_mesh(&square(), 2.0, 2.0, FadeMeshParams::default());
        assert_eq!(mesh.indices, vec![6, 0, 1, 2, 3, 4, 5, 6, 7, 1, 5, 3]);
    }

    #[test]
    fn triangle_has_single_trailing_interior_index() {
        let tri = regular_polygon(3, 1.0);
        let mesh = build_fade_mesh(&tri, 2.0, 2.0, FadeMeshParams::default());
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.index_count(), 9);
        assert_eq!(mesh.indices, vec![4, 0, 1, 2, 3, 4, 5, 1, 3]);
        assert_eq!(mesh.triangle_count(), 7);
    }

    #[test]
    fn counts_and_bounds_hold_for_many_sizes() {
        let mut builder = FadeMeshBuilder::new();
        for n in 3..200 {
            let boundary = regular_polygon(n, 1.5);
            builder.update(Some(&boundary), 3.0, 3.0);
            assert_eq!(builder.vertex_count(), 2 * n, "n={n}");
            assert_eq!(builder.index_count(), 3 * n, "n={n}");
            let max = builder.indices().iter().copied().max().expect("indices");
            assert!(max as usize <= 2 * n - 1, "n={n} max={max}");
        }
    }

    #[test]
    fn narrow_extent_collapses_inner_ring() {
        let mesh = build_fade_mesh(&square(), 0.5, 4.0, FadeMeshParams::default());
        for i in 0..4 {
            let inner = mesh.vertex(2 * i + 1).expect("inner");
            assert_eq!(inner[0], 0.0);
            assert_ne!(inner[1], 0.0);
        }
        let tiny = build_fade_mesh(&square(), 0.1, 0.1, FadeMeshParams::default());
        for i in 0..4 {
            let inner = tiny.vertex(2 * i + 1).expect("inner");
            assert_eq!(inner[0], 0.0);
            assert_eq!(inner[1], 0.0);
        }
    }

    #[test]
    fn wide_extent_scales_inner_ring_proportionally() {
        let boundary = regular_polygon(7, 2.0);
        let (ex, ez) = (5.0_f32, 3.0_f32);
        let mesh = build_fade_mesh(&boundary, ex, ez, FadeMeshParams::default());
        let sx = (ex - 0.5) / ex;
        let sz = (ez - 0.5) / ez;
        for (i, p) in boundary.iter().enumerate() {
            let inner = mesh.vertex(2 * i + 1).expect("inner");
            assert_relative_eq!(inner[0], p.x * sx, epsilon = 1e-6);
            assert_relative_eq!(inner[1], p.y * sz, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_extent_and_radius_does_not_produce_nan() {
        let params = FadeMeshParams { fade_radius: 0.0 };
        assert_eq!(params.inset_scale(0.0), 0.0);
        let mesh = build_fade_mesh(&square(), 0.0, 0.0, params);
        assert!(mesh.vertices.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn missing_or_degenerate_boundary_yields_empty_mesh() {
        let mut builder = FadeMeshBuilder::new();
        builder.update(Some(&square()), 2.0, 2.0);
        assert_eq!(builder.update(None, 2.0, 2.0), 0);
        assert!(builder.vertices().is_empty());
        assert!(builder.indices().is_empty());

        for n in 0..3 {
            let boundary = regular_polygon(n, 1.0);
            assert_eq!(builder.update(Some(&boundary), 2.0, 2.0), 0);
            assert_eq!(builder.vertex_count(), 0);
            assert_eq!(builder.index_count(), 0);
        }
    }

    #[test]
    fn repeated_updates_are_bitwise_identical() {
        let boundary = regular_polygon(11, 0.8);
        let mut builder = FadeMeshBuilder::new();
        builder.update(Some(&boundary), 1.6, 1.2);
        let first = builder.to_mesh();
        builder.update(Some(&regular_polygon(40, 3.0)), 6.0, 6.0);
        builder.update(Some(&boundary), 1.6, 1.2);
        let second = builder.to_mesh();

        let bits = |m: &FadeMesh| m.vertices.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
        assert_eq!(first.indices, second.indices);
    }

    #[test]
    fn scratch_capacity_doubles_and_persists() {
        let mut builder = FadeMeshBuilder::new();
        assert_eq!(builder.vertex_capacity(), INITIAL_VERTEX_CAPACITY);
        assert_eq!(builder.index_capacity(), INITIAL_INDEX_CAPACITY);

        // 100 boundary vertices need 600 floats: 384 -> 768.
        builder.update(Some(&regular_polygon(100, 1.0)), 2.0, 2.0);
        assert_eq!(builder.vertex_capacity(), 768);
        assert_eq!(builder.index_capacity(), INITIAL_INDEX_CAPACITY);

        // 200 boundary vertices need 600 indices: 576 -> 1152.
        builder.update(Some(&regular_polygon(200, 1.0)), 2.0, 2.0);
        assert_eq!(builder.vertex_capacity(), 1536);
        assert_eq!(builder.index_capacity(), 1152);

        builder.update(Some(&square()), 2.0, 2.0);
        assert_eq!(builder.vertex_capacity(), 1536);
        assert_eq!(builder.index_capacity(), 1152);
    }

    #[test]
    fn u16_indices_match_u32_indices() {
        let mesh = build_fade_mesh(&regular_polygon(9, 1.0), 2.0, 2.0, FadeMeshParams::default());
        assert_eq!(mesh.index_format(), IndexFormat::U16);
        let narrow = mesh.indices_u16().expect("fits");
        let widened: Vec<u32> = narrow.iter().map(|&i| i as u32).collect();
        assert_eq!(widened, mesh.indices);
    }

    #[test]
    fn index_format_switches_above_u16_range() {
        assert_eq!(IndexFormat::for_vertex_count(65_536), IndexFormat::U16);
        assert_eq!(IndexFormat::for_vertex_count(65_537), IndexFormat::U32);
    }
}
