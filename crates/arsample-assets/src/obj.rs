//! Wavefront OBJ loading for model renderers.
//!
//! Only geometry records are read: `v`, `vt`, `vn` and `f`. Faces are fan
//! triangulated and the mesh is de-indexed, so every face corner becomes its
//! own vertex and the index buffer is simply `0..n`. Grouping, smoothing and
//! material records are ignored.

use log::debug;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum ObjError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("line {line}: malformed `{record}` record: {text}")]
    Malformed {
        line: usize,
        record: &'static str,
        text: String,
    },

    #[error("line {line}: unsupported face vertex `{token}` (expected v, v/vt, v//vn or v/vt/vn)")]
    FaceLayout { line: usize, token: String },

    #[error("line {line}: face references {kind} {index}, but only {available} are defined")]
    IndexOutOfRange {
        line: usize,
        kind: &'static str,
        index: i64,
        available: usize,
    },

    #[error("some faces have {attribute} and others do not")]
    InconsistentAttributes { attribute: &'static str },

    #[error("mesh needs {count} vertices, more than 16-bit indices can address")]
    TooManyVertices { count: usize },
}

/// De-indexed triangle mesh.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjMesh {
    /// `x, y, z` per vertex.
    pub positions: Vec<f32>,
    /// `x, y, z` per vertex, or empty when the file has no normals.
    pub normals: Vec<f32>,
    /// `u, v` per vertex, or empty when the file has no texture coordinates.
    pub uvs: Vec<f32>,
    /// Triangle list indices.
    pub indices: Vec<u16>,
}

impl ObjMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Axis-aligned bounding box of the positions.
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut points = self
            .positions
            .chunks_exact(3)
            .map(|p| Point3::new(p[0], p[1], p[2]));
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p))))
    }
}

/// Load and parse an OBJ file from disk.
pub fn load_obj(path: impl AsRef<Path>) -> Result<ObjMesh, ObjError> {
    let text = fs::read_to_string(path)?;
    parse_obj(&text)
}

#[derive(Clone, Copy, Debug)]
struct Corner {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

/// Parse OBJ text into a de-indexed mesh.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(bytes = text.len())))]
pub fn parse_obj(text: &str) -> Result<ObjMesh, ObjError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut triangles: Vec<[Corner; 3]> = Vec::new();

    for (line_idx, raw) in text.lines().enumerate() {
        let line = line_idx + 1;
        let mut tokens = raw.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(tokens, line, "v", raw)?;
                positions.push([x, y, z]);
            }
            "vn" => {
                let n = parse_floats::<3>(tokens, line, "vn", raw)?;
                normals.push(n);
            }
            "vt" => {
                let t = parse_floats::<2>(tokens, line, "vt", raw)?;
                uvs.push(t);
            }
            "f" => {
                let corners = tokens
                    .map(|token| {
                        parse_corner(token, line, positions.len(), uvs.len(), normals.len())
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(ObjError::Malformed {
                        line,
                        record: "f",
                        text: raw.to_string(),
                    });
                }
                for i in 2..corners.len() {
                    triangles.push([corners[0], corners[i - 1], corners[i]]);
                }
            }
            _ => {}
        }
    }

    let with_normals = triangles.iter().flatten().filter(|c| c.normal.is_some()).count();
    let with_uvs = triangles.iter().flatten().filter(|c| c.uv.is_some()).count();
    let corner_count = triangles.len() * 3;
    if with_normals != 0 && with_normals != corner_count {
        return Err(ObjError::InconsistentAttributes {
            attribute: "normals",
        });
    }
    if with_uvs != 0 && with_uvs != corner_count {
        return Err(ObjError::InconsistentAttributes {
            attribute: "texture coordinates",
        });
    }
    if corner_count > u16::MAX as usize + 1 {
        return Err(ObjError::TooManyVertices {
            count: corner_count,
        });
    }

    let mut mesh = ObjMesh {
        positions: Vec::with_capacity(corner_count * 3),
        normals: Vec::with_capacity(if with_normals > 0 { corner_count * 3 } else { 0 }),
        uvs: Vec::with_capacity(if with_uvs > 0 { corner_count * 2 } else { 0 }),
        indices: Vec::with_capacity(corner_count),
    };
    for (i, corner) in triangles.iter().flatten().enumerate() {
        mesh.positions.extend_from_slice(&positions[corner.position]);
        if let Some(n) = corner.normal {
            mesh.normals.extend_from_slice(&normals[n]);
        }
        if let Some(t) = corner.uv {
            mesh.uvs.extend_from_slice(&uvs[t]);
        }
        mesh.indices.push(i as u16);
    }

    debug!(
        "parsed OBJ: {} positions, {} triangles, normals={}, uvs={}",
        positions.len(),
        mesh.triangle_count(),
        mesh.has_normals(),
        mesh.has_uvs()
    );
    Ok(mesh)
}

/// Read exactly `N` leading floats; extra components (e.g. `w`) are ignored.
fn parse_floats<'a, const N: usize>(
    mut tokens: impl Iterator<Item = &'a str>,
    line: usize,
    record: &'static str,
    raw: &str,
) -> Result<[f32; N], ObjError> {
    let malformed = || ObjError::Malformed {
        line,
        record,
        text: raw.to_string(),
    };
    let mut out = [0.0f32; N];
    for slot in &mut out {
        *slot = tokens
            .next()
            .and_then(|t| t.parse::<f32>().ok())
            .ok_or_else(malformed)?;
    }
    Ok(out)
}

fn parse_corner(
    token: &str,
    line: usize,
    positions: usize,
    uvs: usize,
    normals: usize,
) -> Result<Corner, ObjError> {
    let layout_err = || ObjError::FaceLayout {
        line,
        token: token.to_string(),
    };
    let parts: Vec<&str> = token.split('/').collect();
    let (v, vt, vn) = match parts.as_slice() {
        [v] => (*v, None, None),
        [v, vt] => (*v, Some(*vt), None),
        [v, "", vn] => (*v, None, Some(*vn)),
        [v, vt, vn] => (*v, Some(*vt), Some(*vn)),
        _ => return Err(layout_err()),
    };

    let index = |s: &str, kind: &'static str, available: usize| -> Result<usize, ObjError> {
        let idx: i64 = s.parse().map_err(|_| layout_err())?;
        resolve_index(idx, available).ok_or(ObjError::IndexOutOfRange {
            line,
            kind,
            index: idx,
            available,
        })
    };

    Ok(Corner {
        position: index(v, "position", positions)?,
        uv: vt.map(|s| index(s, "texture coordinate", uvs)).transpose()?,
        normal: vn.map(|s| index(s, "normal", normals)).transpose()?,
    })
}

/// OBJ indices are 1-based; negative values count back from the latest element.
fn resolve_index(idx: i64, available: usize) -> Option<usize> {
    let resolved = if idx > 0 {
        usize::try_from(idx - 1).ok()?
    } else if idx < 0 {
        available.checked_sub(usize::try_from(idx.unsigned_abs()).ok()?)?
    } else {
        return None;
    };
    (resolved < available).then_some(resolved)
}
