//! Rectangular board detector built on top of `boardscan-core`.
//!
//! ## Quickstart
//!
//! ```
//! use boardscan_core::{DisplaySize, VideoFrame};
//! use boardscan_detect::{BoardDetector, BoardDetectorParams};
//!
//! let frame = VideoFrame::from_gray(64, 48, &[0u8; 64 * 48]).unwrap();
//! let detector = BoardDetector::new(BoardDetectorParams::default());
//!
//! let region = detector.detect(&frame, DisplaySize::new(64.0, 48.0));
//! println!("detected: {}", region.is_some());
//! ```
//!
//! Algorithm (one frame):
//! 1. Reject empty frames.
//! 2. Convert to grayscale, smooth with a 5×5 Gaussian.
//! 3. Canny edges with hysteresis 50/150, dilated once with a 3×3 square.
//! 4. Extract outermost contours.
//! 5. For each contour check, in order: area within 5%..95% of the frame,
//!    Douglas-Peucker polygon (2% of perimeter) with 4..=8 vertices,
//!    bounding-box aspect ratio within 0.3..3.5, rectangularity above 0.6.
//! 6. Keep the largest surviving contour; confidence is
//!    `min(1.2 * rectangularity, 1)`.
//! 7. Map its bounding box and polygon into display space.
//!
//! All image operations go through a [`VisionProvider`], so the pipeline can
//! run on other vision backends or on canned contours in tests.

mod candidate;
mod detector;
mod imageproc_vision;
mod params;
mod vision;

pub use candidate::{evaluate_contour, select_largest, BoardCandidate, Rejection};
pub use detector::{BoardDetector, DetectError};
pub use imageproc_vision::ImageprocVision;
pub use params::{BoardDetectorParams, ParamsError};
pub use vision::{Contour, VisionError, VisionProvider};
