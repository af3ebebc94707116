use nalgebra::Point2;

/// Errors produced while preparing plane meshes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaneMeshError {
    #[error("plane polygon buffer has odd length {len} (expected x,z pairs)")]
    OddPolygonBuffer { len: usize },

    #[error("mesh has {vertices} vertices, too many for 16-bit indices")]
    TooManyVerticesForU16 { vertices: usize },
}

/// Convert the runtime's flat `[x0, z0, x1, z1, ...]` polygon into points.
///
/// Points use `(x, y)` of `Point2` for the plane-local `(x, z)` pair.
pub fn boundary_from_flat(flat: &[f32]) -> Result<Vec<Point2<f32>>, PlaneMeshError> {
    if flat.len() % 2 != 0 {
        return Err(PlaneMeshError::OddPolygonBuffer { len: flat.len() });
    }
    Ok(flat
        .chunks_exact(2)
        .map(|xz| Point2::new(xz[0], xz[1]))
        .collect())
}
