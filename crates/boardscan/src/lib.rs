//! High-level facade crate for the `boardscan-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying crates
//! - end-to-end helpers that run the board detector on an `image` buffer
//! - a [`Scanner`] tying a frame source, the detector and still capture
//!   together, plus an image-file [`ImageFileSource`] for headless use
//! - the `boardscan` command-line tool (feature `cli`)
//!
//! ## Quickstart
//!
//! ```no_run
//! use boardscan::scan;
//! use boardscan::BoardDetectorParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("board.jpg")?;
//! let region = scan::detect_board(&img, BoardDetectorParams::default(), None)?;
//! println!("detected: {}", region.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `boardscan::core`: frames, regions, coordinate mapping, logger.
//! - `boardscan::detect`: the contour-based board detector.
//! - `boardscan::capture`: camera lifecycle, still capture, scheduling.
//! - `boardscan::services`: recognition, component catalog, chat.
//! - `boardscan::scan`: end-to-end helpers from `image` types.

pub use boardscan_capture as capture;
pub use boardscan_core as core;
pub use boardscan_detect as detect;
pub use boardscan_services as services;

pub use boardscan_capture::{CaptureSurface, EncodedStill, FrameSource};
pub use boardscan_core::{DetectedRegion, DisplaySize, PixelRect, SpaceMapping, VideoFrame};
pub use boardscan_detect::{BoardDetector, BoardDetectorParams};
pub use boardscan_services::{ComponentRecognizer, DetectedComponent};

pub mod config;
mod file_source;
pub mod scan;
mod scanner;

pub use config::{ConfigError, ScannerConfig};
pub use file_source::ImageFileSource;
pub use scan::ScanError;
pub use scanner::Scanner;

/// Install logging for a binary: the stderr logger, or with the `tracing`
/// feature a `tracing` subscriber that also receives `log` records.
pub fn init_logging(level: log::LevelFilter, tracing_json: bool) {
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        log::set_max_level(level);
        boardscan_core::init_tracing(tracing_json);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = boardscan_core::init_with_level(level);
        if tracing_json {
            log::warn!("JSON logs need the `tracing` feature, using plain logs");
        }
    }
}
