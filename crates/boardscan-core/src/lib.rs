//! Core types for circuit-board scanning.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete vision library, camera API or image codec. It
//! provides:
//! - [`VideoFrame`]: an immutable RGBA snapshot plus its grayscale form,
//! - [`DetectedRegion`] and the pixel geometry it is made of,
//! - [`SpaceMapping`]: conversions between native, displayed and capture space,
//! - [`RegionDetector`]: the seam between schedulers and detectors,
//! - a minimal stderr logger (and a `tracing` subscriber behind a feature).

mod coords;
mod geometry;
mod image;
mod logger;
mod region;

pub use coords::{DisplaySize, FrameSize, SpaceMapping};
pub use geometry::{bounding_rect_of, PixelRect};
pub use image::{FrameError, GrayImage, VideoFrame};
pub use region::{DetectedRegion, RegionDetector};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, LOG_ENV_VAR};
