//! Core types shared by the AR sample utilities.
//!
//! Everything here is plain data: gray image buffers with row stride, rigid
//! poses in the runtime's convention, and trackable state. Nothing depends on
//! a graphics API or on the AR runtime itself.

mod image;
mod logger;
mod pose;
mod tracking;

pub use image::{check_layout, GrayImage, GrayImageView, ImageLayoutError};
pub use pose::Pose;
pub use tracking::TrackingState;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
