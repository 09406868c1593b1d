//! The image-processing capabilities the board pipeline needs.

use boardscan_core::{bounding_rect_of, PixelRect, VideoFrame};
use image::GrayImage;
use nalgebra::Point2;

#[derive(thiserror::Error, Debug)]
pub enum VisionError {
    #[error("raster of {width}x{height} does not match its buffer")]
    BadRaster { width: u32, height: u32 },

    #[error("{operation} failed: {reason}")]
    Operation {
        operation: &'static str,
        reason: String,
    },
}

/// One closed outline traced on an edge map, in pixel coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point2<i32>>) -> Self {
        Self { points }
    }

    /// Contour from `(x, y)` pairs, handy for canned test shapes.
    pub fn from_xy(points: &[(i32, i32)]) -> Self {
        Self::new(points.iter().map(|&(x, y)| Point2::new(x, y)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Geometric vision backend.
///
/// The board pipeline is expressed purely in terms of these operations so
/// that any vision library (or a canned-contour fake) can drive it.
/// `contour_area`, `arc_length` and `bounding_rect` have exact default
/// implementations; backends override them only to match their own
/// conventions.
pub trait VisionProvider {
    fn to_gray(&self, frame: &VideoFrame) -> Result<GrayImage, VisionError>;

    /// Gaussian smoothing with a square kernel of side `kernel_size`.
    fn blur(&self, gray: &GrayImage, kernel_size: u32, sigma: f32)
        -> Result<GrayImage, VisionError>;

    /// Binary edge map (0 / 255) using hysteresis thresholds.
    fn edge_detect(&self, gray: &GrayImage, low: f32, high: f32)
        -> Result<GrayImage, VisionError>;

    /// Dilation with a square all-ones element of Chebyshev radius `radius`.
    fn dilate(&self, edges: &GrayImage, radius: u8) -> Result<GrayImage, VisionError>;

    /// Outermost closed contours of the non-zero regions, in traversal order.
    fn find_external_contours(&self, edges: &GrayImage) -> Result<Vec<Contour>, VisionError>;

    /// Closed-curve polygon simplification with tolerance `epsilon` pixels.
    fn approx_polygon(&self, contour: &Contour, epsilon: f64) -> Vec<Point2<i32>>;

    /// Enclosed area (shoelace), independent of winding order.
    fn contour_area(&self, contour: &Contour) -> f64 {
        polygon_area(&contour.points)
    }

    /// Perimeter of the closed contour.
    fn arc_length(&self, contour: &Contour) -> f64 {
        closed_perimeter(&contour.points)
    }

    /// Axis-aligned bounding rectangle, inclusive pixel extents.
    fn bounding_rect(&self, contour: &Contour) -> Option<PixelRect> {
        bounding_rect_of(&contour.points)
    }
}

pub(crate) fn polygon_area(points: &[Point2<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0f64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    (twice * 0.5).abs()
}

pub(crate) fn closed_perimeter(points: &[Point2<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let q = points[(i + 1) % points.len()];
            let dx = (q.x - p.x) as f64;
            let dy = (q.y - p.y) as f64;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}
