use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::coords::DisplaySize;
use crate::geometry::PixelRect;
use crate::image::VideoFrame;

/// One board-like region found in a frame.
///
/// `bounding_box` encloses every `polygon` vertex. The polygon is the
/// simplified outline (4..=8 vertices) without a fixed winding order.
/// Regions are never edited in place; a newer pass replaces them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    pub bounding_box: PixelRect,
    pub polygon: Vec<Point2<f32>>,
    /// Rectangularity-derived score in `[0, 1]`.
    pub confidence: f32,
}

impl DetectedRegion {
    /// Scale box and polygon independently per axis.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            bounding_box: self.bounding_box.scaled(sx, sy),
            polygon: self
                .polygon
                .iter()
                .map(|p| Point2::new(p.x * sx, p.y * sy))
                .collect(),
            confidence: self.confidence,
        }
    }

    pub fn encloses_polygon(&self) -> bool {
        self.polygon.iter().all(|&p| self.bounding_box.contains(p))
    }
}

/// Anything that can look for a board region in one frame.
///
/// Implementations return the region in the coordinate space of `display`
/// and report "nothing found" for every internal failure.
pub trait RegionDetector {
    fn detect_region(&mut self, frame: &VideoFrame, display: DisplaySize)
        -> Option<DetectedRegion>;
}

impl<F> RegionDetector for F
where
    F: FnMut(&VideoFrame, DisplaySize) -> Option<DetectedRegion>,
{
    fn detect_region(
        &mut self,
        frame: &VideoFrame,
        display: DisplaySize,
    ) -> Option<DetectedRegion> {
        self(frame, display)
    }
}
