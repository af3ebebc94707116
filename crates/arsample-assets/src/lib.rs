//! Asset loading and generation for AR sample renderers.
//!
//! - [`obj`]: Wavefront OBJ meshes, de-indexed for direct upload.
//! - [`dfg`]: the DFG lookup table used by environmental HDR lighting.

pub mod dfg;
pub mod obj;

pub use dfg::{
    calculate_dfg, generate_dfg, hammersley, DfgError, DfgFormat, DfgParams, DfgTable,
    DEFAULT_DFG_RESOLUTION, DEFAULT_DFG_SAMPLES,
};
pub use obj::{load_obj, parse_obj, ObjError, ObjMesh};
