use boardscan_core::{DetectedRegion, PixelRect, SpaceMapping};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::params::BoardDetectorParams;
use crate::vision::{Contour, VisionProvider};

/// A contour that passed every shape filter, in analysis-frame pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardCandidate {
    /// Position of the contour in the provider's traversal order.
    pub contour_index: usize,
    pub area: f64,
    /// Bounding box of the original (unsimplified) contour.
    pub bounding_rect: PixelRect,
    /// Simplified outline.
    pub polygon: Vec<Point2<i32>>,
    pub rectangularity: f64,
}

impl BoardCandidate {
    pub fn confidence(&self, gain: f64) -> f32 {
        (self.rectangularity * gain).min(1.0) as f32
    }

    /// Build the published region, scaled into display space.
    pub fn to_region(&self, mapping: &SpaceMapping, gain: f64) -> DetectedRegion {
        let native = DetectedRegion {
            bounding_box: self.bounding_rect,
            polygon: self
                .polygon
                .iter()
                .map(|p| Point2::new(p.x as f32, p.y as f32))
                .collect(),
            confidence: self.confidence(gain),
        };
        mapping.region_to_display(&native)
    }
}

/// Why a contour was not accepted as a board outline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    AreaTooSmall { area: f64, min: f64 },
    AreaTooLarge { area: f64, max: f64 },
    /// Zero perimeter; nothing to simplify.
    Degenerate,
    VertexCount { vertices: usize },
    AspectRatio { ratio: f32 },
    Rectangularity { value: f64 },
}

/// Run the shape filters on one contour, cheapest first.
pub fn evaluate_contour<V: VisionProvider + ?Sized>(
    vision: &V,
    contour_index: usize,
    contour: &Contour,
    frame_area: f64,
    params: &BoardDetectorParams,
) -> Result<BoardCandidate, Rejection> {
    let area = vision.contour_area(contour);
    let min = frame_area * params.min_area_frac;
    let max = frame_area * params.max_area_frac;
    if area < min {
        return Err(Rejection::AreaTooSmall { area, min });
    }
    if area > max {
        return Err(Rejection::AreaTooLarge { area, max });
    }

    let perimeter = vision.arc_length(contour);
    if !(perimeter > 0.0) {
        return Err(Rejection::Degenerate);
    }
    let polygon = vision.approx_polygon(contour, params.approx_epsilon_frac * perimeter);
    if polygon.len() < params.min_vertices || polygon.len() > params.max_vertices {
        return Err(Rejection::VertexCount {
            vertices: polygon.len(),
        });
    }

    let bounding_rect = vision.bounding_rect(contour).ok_or(Rejection::Degenerate)?;
    let ratio = bounding_rect.aspect_ratio().ok_or(Rejection::Degenerate)?;
    if ratio < params.min_aspect_ratio || ratio > params.max_aspect_ratio {
        return Err(Rejection::AspectRatio { ratio });
    }

    let rect_area = bounding_rect.area() as f64;
    if !(rect_area > 0.0) {
        return Err(Rejection::Degenerate);
    }
    let rectangularity = area / rect_area;
    if rectangularity <= params.min_rectangularity {
        return Err(Rejection::Rectangularity {
            value: rectangularity,
        });
    }

    Ok(BoardCandidate {
        contour_index,
        area,
        bounding_rect,
        polygon,
        rectangularity,
    })
}

/// Largest-area candidate; on equal areas the first one seen wins.
pub fn select_largest<I>(candidates: I) -> Option<BoardCandidate>
where
    I: IntoIterator<Item = BoardCandidate>,
{
    let mut best: Option<BoardCandidate> = None;
    for c in candidates {
        let better = best.as_ref().map_or(true, |b| c.area > b.area);
        if better {
            best = Some(c);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageprocVision;
    use approx::assert_relative_eq;
    use boardscan_core::{DisplaySize, FrameSize};

    const FRAME_AREA: f64 = 1000.0 * 1000.0;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Contour {
        Contour::from_xy(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)])
    }

    fn eval(c: &Contour) -> Result<BoardCandidate, Rejection> {
        evaluate_contour(
            &ImageprocVision,
            0,
            c,
            FRAME_AREA,
            &BoardDetectorParams::default(),
        )
    }

    #[test]
    fn clean_rectangle_is_accepted() {
        let cand = eval(&rect(100, 100, 500, 400)).expect("accepted");
        assert_eq!(cand.polygon.len(), 4);
        assert!(cand.rectangularity > 0.99);
        assert_relative_eq!(cand.confidence(1.2), 1.0);
    }

    #[test]
    fn small_contour_is_rejected_regardless_of_shape() {
        // perfect rectangle, 4% of the frame
        let err = eval(&rect(0, 0, 200, 200)).unwrap_err();
        assert!(matches!(err, Rejection::AreaTooSmall { .. }), "{err:?}");
    }

    #[test]
    fn whole_frame_contour_is_rejected() {
        let err = eval(&rect(0, 0, 999, 999)).unwrap_err();
        assert!(matches!(err, Rejection::AreaTooLarge { .. }), "{err:?}");
    }

    #[test]
    fn l_shape_fails_rectangularity() {
        // 600x600 box with a 400x400 bite taken out: area 200k of 360k
        let l = Contour::from_xy(&[
            (100, 100),
            (300, 100),
            (300, 500),
            (700, 500),
            (700, 700),
            (100, 700),
        ]);
        let err = eval(&l).unwrap_err();
        match err {
            Rejection::Rectangularity { value } => assert!(value <= 0.6, "{value}"),
            other => panic!("expected rectangularity rejection, got {other:?}"),
        }
    }

    #[test]
    fn star_fails_vertex_count_or_rectangularity() {
        let mut pts = Vec::new();
        for k in 0..10 {
            let a = std::f64::consts::PI * 2.0 * k as f64 / 10.0;
            let r = if k % 2 == 0 { 400.0 } else { 150.0 };
            pts.push((
                (500.0 + r * a.cos()).round() as i32,
                (500.0 + r * a.sin()).round() as i32,
            ));
        }
        let err = eval(&Contour::from_xy(&pts)).unwrap_err();
        assert!(
            matches!(
                err,
                Rejection::VertexCount { .. } | Rejection::Rectangularity { .. }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn sliver_fails_aspect_ratio() {
        let err = eval(&rect(0, 400, 990, 120)).unwrap_err();
        assert!(matches!(err, Rejection::AspectRatio { .. }), "{err:?}");
    }

    #[test]
    fn ties_keep_first_seen() {
        let a = eval(&rect(100, 100, 400, 300)).expect("a");
        let mut b = eval(&rect(500, 600, 400, 300)).expect("b");
        b.contour_index = 1;
        let best = select_largest([a.clone(), b]).expect("best");
        assert_eq!(best.contour_index, 0);
    }

    #[test]
    fn larger_candidate_wins() {
        let small = eval(&rect(0, 0, 300, 300)).expect("small");
        let mut big = eval(&rect(0, 0, 500, 400)).expect("big");
        big.contour_index = 7;
        assert_eq!(select_largest([small, big]).map(|c| c.contour_index), Some(7));
        assert!(select_largest(Vec::new()).is_none());
    }

    #[test]
    fn region_is_scaled_into_display_space() {
        let cand = eval(&rect(100, 100, 500, 400)).expect("accepted");
        let mapping = SpaceMapping::new(FrameSize::new(1000, 1000), DisplaySize::new(500.0, 250.0))
            .expect("mapping");
        let region = cand.to_region(&mapping, 1.2);
        assert_relative_eq!(region.bounding_box.x, 50.0);
        assert_relative_eq!(region.bounding_box.y, 25.0);
        assert_relative_eq!(region.bounding_box.width, 250.5);
        assert_relative_eq!(region.bounding_box.height, 100.25);
        assert!(region.encloses_polygon());
    }
}
