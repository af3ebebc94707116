//! Facade crate for the `arsample-*` workspace.
//!
//! This crate provides:
//! - re-exports of the member crates
//! - JSON request/report helpers for offline fade mesh generation ([`io`])
//! - (feature `image`) helpers that run the camera image routines on
//!   `image` crate buffers ([`detect`])
//!
//! ## Quickstart
//!
//! ```no_run
//! use arsample::plane::{boundary_from_flat, build_fade_mesh, FadeMeshParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let boundary = boundary_from_flat(&[-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0])?;
//! let mesh = build_fade_mesh(&boundary, 2.0, 2.0, FadeMeshParams::default());
//! println!("{} vertices, {} strip indices", mesh.vertex_count(), mesh.index_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `arsample::core`: gray images with stride, poses, tracking state, logger.
//! - `arsample::plane`: fade meshes, plane culling/sorting, draw calls.
//! - `arsample::vision`: Sobel edge strength, RGBA to gray.
//! - `arsample::assets`: OBJ loading, DFG lookup tables.
//! - `arsample::detect` (feature `image`): the vision routines on `image::GrayImage`/`RgbaImage`.

pub use arsample_assets as assets;
pub use arsample_core as core;
pub use arsample_plane as plane;
pub use arsample_vision as vision;

pub use arsample_plane::{FadeMesh, FadeMeshBuilder, FadeMeshParams, PlaneRenderer};
pub use arsample_vision::{EdgeDetector, SobelParams};

#[cfg(feature = "image")]
pub mod detect;
pub mod io;
