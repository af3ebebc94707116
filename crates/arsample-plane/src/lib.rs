//! Plane rendering support for AR scenes.
//!
//! - [`fade_mesh`]: turns a boundary polygon into a triangle strip whose
//!   outer edge fades to transparent.
//! - [`draw`]: camera distance, culling and ordering of detected planes,
//!   plus per-plane grid UV rotation.
//! - [`renderer`]: ties both together into per-frame draw calls.

mod boundary;
mod buffer;
pub mod draw;
pub mod fade_mesh;
pub mod renderer;

pub use boundary::{boundary_from_flat, PlaneMeshError};
pub use buffer::DoublingBuffer;
pub use draw::{
    distance_to_plane, plane_uv_matrix, sort_planes_for_drawing, PlaneId, PlaneIndexMap,
    PlaneSnapshot, SortedPlane,
};
pub use fade_mesh::{
    build_fade_mesh, FadeMesh, FadeMeshBuilder, FadeMeshParams, IndexFormat, FADE_RADIUS_M,
};
pub use renderer::{PlaneDrawCall, PlaneRenderer, PlaneUniforms, PrimitiveMode, GRID_CONTROL};
