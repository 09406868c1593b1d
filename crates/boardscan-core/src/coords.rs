//! Conversions between the three coordinate spaces of the scanner.
//!
//! - *native*: pixels of the source raster (sensor resolution),
//! - *display*: on-screen pixels of the element showing the feed,
//! - *capture*: pixels of the off-screen buffer a still is rendered into.
//!
//! Capture space is native space cropped to the requested rectangle, so a
//! capture rectangle is a native rectangle. Display scaling is not
//! guaranteed uniform, hence every conversion scales x and y independently.
//!
//! A [`SpaceMapping`] is a plain value built from the two sizes at the
//! moment of use. Callers are expected to rebuild it per call with the
//! current display size instead of holding on to one.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::geometry::PixelRect;
use crate::region::DetectedRegion;

/// Native size of a raster, in whole pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Laid-out size of the display element; fractional because layout is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

impl DisplaySize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

impl From<FrameSize> for DisplaySize {
    fn from(size: FrameSize) -> Self {
        Self::new(size.width as f32, size.height as f32)
    }
}

/// Per-axis scale between native and display space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpaceMapping {
    native: FrameSize,
    display: DisplaySize,
}

impl SpaceMapping {
    /// Returns `None` when either size is empty; no meaningful scale exists then.
    pub fn new(native: FrameSize, display: DisplaySize) -> Option<Self> {
        if native.is_empty() || display.is_empty() {
            return None;
        }
        Some(Self { native, display })
    }

    /// Mapping for a display that shows the feed at native resolution.
    pub fn identity(native: FrameSize) -> Option<Self> {
        Self::new(native, native.into())
    }

    pub fn native(&self) -> FrameSize {
        self.native
    }

    pub fn display(&self) -> DisplaySize {
        self.display
    }

    /// `(sx, sy)` multiplying native coordinates into display coordinates.
    pub fn native_to_display_scale(&self) -> (f32, f32) {
        (
            self.display.width / self.native.width as f32,
            self.display.height / self.native.height as f32,
        )
    }

    /// `(sx, sy)` multiplying display coordinates into native coordinates.
    pub fn display_to_native_scale(&self) -> (f32, f32) {
        (
            self.native.width as f32 / self.display.width,
            self.native.height as f32 / self.display.height,
        )
    }

    pub fn native_to_display_point(&self, p: Point2<f32>) -> Point2<f32> {
        let (sx, sy) = self.native_to_display_scale();
        Point2::new(p.x * sx, p.y * sy)
    }

    pub fn display_to_native_point(&self, p: Point2<f32>) -> Point2<f32> {
        let (sx, sy) = self.display_to_native_scale();
        Point2::new(p.x * sx, p.y * sy)
    }

    pub fn native_to_display_rect(&self, r: &PixelRect) -> PixelRect {
        let (sx, sy) = self.native_to_display_scale();
        r.scaled(sx, sy)
    }

    /// Display rectangle → native (capture) rectangle.
    pub fn display_to_native_rect(&self, r: &PixelRect) -> PixelRect {
        let (sx, sy) = self.display_to_native_scale();
        r.scaled(sx, sy)
    }

    /// Re-express a region detected in native space for overlay rendering.
    pub fn region_to_display(&self, region: &DetectedRegion) -> DetectedRegion {
        let (sx, sy) = self.native_to_display_scale();
        region.scaled(sx, sy)
    }
}
