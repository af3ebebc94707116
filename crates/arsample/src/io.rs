//! JSON request and report helpers for offline fade mesh generation.

use crate::plane::{
    boundary_from_flat, FadeMeshBuilder, FadeMeshParams, IndexFormat, PlaneMeshError,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Boundary and extents of one plane, as dumped from a tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneMeshRequest {
    /// Boundary polygon in plane-local `(x, z)` meters.
    #[serde(default)]
    pub boundary: Vec<[f32; 2]>,
    /// Alternative to `boundary`: the runtime's flat `[x0, z0, x1, z1, ...]` buffer.
    #[serde(default)]
    pub polygon: Option<Vec<f32>>,
    pub extent_x: f32,
    pub extent_z: f32,
    #[serde(default)]
    pub fade_radius: Option<f32>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl PlaneMeshRequest {
    /// Load a JSON request from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this request to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("plane_mesh_report.json"))
    }

    /// Mesh parameters, applying the fade radius override.
    pub fn params(&self) -> FadeMeshParams {
        let mut params = FadeMeshParams::default();
        if let Some(fade_radius) = self.fade_radius {
            params.fade_radius = fade_radius;
        }
        params
    }

    /// Boundary points, preferring the flat `polygon` buffer when present.
    pub fn boundary_points(&self) -> Result<Vec<Point2<f32>>, PlaneMeshError> {
        match &self.polygon {
            Some(flat) => boundary_from_flat(flat),
            None => Ok(self
                .boundary
                .iter()
                .map(|&[x, z]| Point2::new(x, z))
                .collect()),
        }
    }

    /// Run the fade mesh generator on this request.
    pub fn build_report(&self) -> Result<PlaneMeshReport, PlaneMeshError> {
        let boundary = self.boundary_points()?;
        let mut builder = FadeMeshBuilder::with_params(self.params());
        builder.update(Some(boundary.as_slice()), self.extent_x, self.extent_z);
        let mesh = builder.to_mesh();
        Ok(PlaneMeshReport {
            boundary_vertices: boundary.len(),
            extent_x: self.extent_x,
            extent_z: self.extent_z,
            fade_radius: builder.params().fade_radius,
            vertex_count: mesh.vertex_count(),
            index_count: mesh.index_count(),
            index_format: mesh.index_format(),
            vertices: mesh
                .vertices
                .chunks_exact(3)
                .map(|v| [v[0], v[1], v[2]])
                .collect(),
            indices: mesh.indices,
        })
    }
}

/// Generated fade mesh, serialized for inspection or upload by other tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneMeshReport {
    pub boundary_vertices: usize,
    pub extent_x: f32,
    pub extent_z: f32,
    pub fade_radius: f32,
    pub vertex_count: usize,
    pub index_count: usize,
    pub index_format: IndexFormat,
    /// `[x, z, alpha]` per vertex.
    pub vertices: Vec<[f32; 3]>,
    /// Triangle-strip indices.
    pub indices: Vec<u32>,
}

impl PlaneMeshReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
