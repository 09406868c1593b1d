use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in some pixel space (native or displayed).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle is usable for sampling only if both sides are finite and positive.
    pub fn is_degenerate(&self) -> bool {
        let finite = self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite();
        !finite || self.width <= 0.0 || self.height <= 0.0
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Width over height; `None` for zero-height rectangles.
    pub fn aspect_ratio(&self) -> Option<f32> {
        (self.height > 0.0).then(|| self.width / self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point2<f32>) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Scale both position and size, independently per axis.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }
}

/// Integer bounding rectangle of a pixel point set.
///
/// Width and height count pixels inclusively, so a single point yields a
/// 1×1 rectangle. Returns `None` for an empty set.
pub fn bounding_rect_of(points: &[Point2<i32>]) -> Option<PixelRect> {
    let first = points.first()?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(PixelRect::new(
        min_x as f32,
        min_y as f32,
        (max_x - min_x + 1) as f32,
        (max_y - min_y + 1) as f32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_rect_is_inclusive() {
        let pts = [
            Point2::new(10, 20),
            Point2::new(29, 20),
            Point2::new(29, 59),
            Point2::new(10, 59),
        ];
        let r = bounding_rect_of(&pts).expect("rect");
        assert_eq!(r, PixelRect::new(10.0, 20.0, 20.0, 40.0));
        assert_eq!(r.aspect_ratio(), Some(0.5));
    }

    #[test]
    fn empty_point_set_has_no_rect() {
        assert!(bounding_rect_of(&[]).is_none());
    }

    #[test]
    fn degenerate_rects_are_flagged() {
        assert!(PixelRect::new(0.0, 0.0, 0.0, 10.0).is_degenerate());
        assert!(PixelRect::new(0.0, 0.0, 10.0, -1.0).is_degenerate());
        assert!(PixelRect::new(f32::NAN, 0.0, 10.0, 10.0).is_degenerate());
        assert!(!PixelRect::new(1.0, 2.0, 3.0, 4.0).is_degenerate());
    }
}
