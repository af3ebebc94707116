//! DFG lookup table for image-based lighting, pre-integrated for
//! multiscattering.
//!
//! Each texel `(s, t)` stores the two split-sum terms for
//! `NoV = (s + 0.5) / res` and linear roughness `a = ((t + 0.5) / res)²`:
//! the red channel integrates `Vis * Fc`, the green channel `Vis`, with
//! `Fc = (1 - VoH)^5` and height-correlated Smith GGX visibility.

use half::f16;
use log::{debug, info};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::{
    f32::consts::PI,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

pub const DEFAULT_DFG_RESOLUTION: usize = 64;
pub const DEFAULT_DFG_SAMPLES: u32 = 1024;

#[derive(thiserror::Error, Debug)]
pub enum DfgError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("DFG resolution must be positive")]
    ZeroResolution,

    #[error("DFG sample count must be positive")]
    ZeroSamples,

    #[error("unknown DFG output format `{0}` (expected raw or ppm)")]
    UnknownFormat(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DfgParams {
    /// Width and height of the square table.
    pub resolution: usize,
    /// Importance samples per texel.
    pub samples: u32,
}

impl Default for DfgParams {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_DFG_RESOLUTION,
            samples: DEFAULT_DFG_SAMPLES,
        }
    }
}

/// On-disk encoding of a [`DfgTable`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DfgFormat {
    /// Two little-endian half floats per texel, no header.
    #[default]
    Raw,
    /// Binary PPM preview: red and green channels, blue zero.
    Ppm,
}

impl std::str::FromStr for DfgFormat {
    type Err = DfgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "ppm" => Ok(Self::Ppm),
            _ => Err(DfgError::UnknownFormat(s.to_string())),
        }
    }
}

/// Row-major table, `t` (roughness) selecting the row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DfgTable {
    pub resolution: usize,
    pub texels: Vec<[f32; 2]>,
}

impl DfgTable {
    pub fn get(&self, s: usize, t: usize) -> [f32; 2] {
        self.texels[t * self.resolution + s]
    }

    /// Raw encoding: `f16` little-endian pairs.
    pub fn write_raw<W: Write>(&self, out: &mut W) -> Result<(), DfgError> {
        for texel in &self.texels {
            for c in texel {
                out.write_all(&f16::from_f32(*c).to_le_bytes())?;
            }
        }
        Ok(())
    }

    pub fn write_ppm<W: Write>(&self, out: &mut W) -> Result<(), DfgError> {
        write!(out, "P6\n{} {}\n255\n", self.resolution, self.resolution)?;
        for [r, g] in &self.texels {
            out.write_all(&[to_byte(*r), to_byte(*g), 0])?;
        }
        Ok(())
    }

    pub fn write<W: Write>(&self, out: &mut W, format: DfgFormat) -> Result<(), DfgError> {
        match format {
            DfgFormat::Raw => self.write_raw(out),
            DfgFormat::Ppm => self.write_ppm(out),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>, format: DfgFormat) -> Result<(), DfgError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out, format)?;
        out.flush()?;
        Ok(())
    }
}

fn to_byte(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0) as u8
}

/// Sample `i` of an `n`-point Hammersley set.
pub fn hammersley(i: u32, n: u32) -> (f32, f32) {
    const TO_FLOAT: f64 = 0.5 / 0x8000_0000u32 as f64;
    (
        i as f32 / n as f32,
        (i.reverse_bits() as f64 * TO_FLOAT) as f32,
    )
}

/// GGX-distributed half vector around +Z for linear roughness `a`.
fn importance_sample_ggx(u: (f32, f32), a: f32) -> Vector3<f32> {
    let phi = 2.0 * PI * u.0;
    // (a² - 1) written as (a - 1)(a + 1) for precision.
    let cos_theta2 = (1.0 - u.1) / (1.0 + (a + 1.0) * ((a - 1.0) * u.1));
    let cos_theta = cos_theta2.sqrt();
    let sin_theta = (1.0 - cos_theta2).max(0.0).sqrt();
    Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Height-correlated Smith GGX visibility (Heitz 2014).
fn visibility(nov: f32, nol: f32, a: f32) -> f32 {
    let a2 = a * a;
    let ggx_l = nov * ((nol - nol * a2) * nol + a2).sqrt();
    let ggx_v = nol * ((nov - nov * a2) * nov + a2).sqrt();
    0.5 / (ggx_v + ggx_l)
}

/// Both DFG terms for one `(NoV, a)` pair.
pub fn calculate_dfg(nov: f32, a: f32, samples: u32) -> [f32; 2] {
    let v = Vector3::new((1.0 - nov * nov).max(0.0).sqrt(), 0.0, nov);
    let mut r = [0.0f32; 2];
    for i in 0..samples {
        let h = importance_sample_ggx(hammersley(i, samples), a);
        let v_dot_h = v.dot(&h);
        let l = h * (2.0 * v_dot_h) - v;

        let voh = v_dot_h.clamp(0.0, 1.0);
        let nol = l.z.clamp(0.0, 1.0);
        let noh = h.z.clamp(0.0, 1.0);

        if nol > 0.0 && noh > 0.0 {
            let vis = visibility(nov, nol, a) * nol * (voh / noh);
            let fc = (1.0 - voh).powi(5);
            r[0] += vis * fc;
            r[1] += vis;
        }
    }
    let scale = 4.0 / samples as f32;
    [r[0] * scale, r[1] * scale]
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(resolution = params.resolution, samples = params.samples))
)]
pub fn generate_dfg(params: &DfgParams) -> Result<DfgTable, DfgError> {
    if params.resolution == 0 {
        return Err(DfgError::ZeroResolution);
    }
    if params.samples == 0 {
        return Err(DfgError::ZeroSamples);
    }
    let res = params.resolution;
    info!(
        "generating {res}x{res} DFG table with {} samples per texel",
        params.samples
    );

    let mut texels = Vec::with_capacity(res * res);
    for t in 0..res {
        let perceptual_roughness = (t as f32 + 0.5) / res as f32;
        let a = perceptual_roughness * perceptual_roughness;
        for s in 0..res {
            let nov = (s as f32 + 0.5) / res as f32;
            texels.push(calculate_dfg(nov, a, params.samples));
        }
        debug!("DFG row {t}/{res} done");
    }
    Ok(DfgTable {
        resolution: res,
        texels,
    })
}
