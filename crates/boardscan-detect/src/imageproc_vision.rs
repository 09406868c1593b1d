//! [`VisionProvider`] backed by `imageproc`.

use boardscan_core::VideoFrame;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use nalgebra::Point2;

use crate::vision::{Contour, VisionError, VisionProvider};

/// Default vision backend. Stateless; cheap to copy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageprocVision;

impl VisionProvider for ImageprocVision {
    fn to_gray(&self, frame: &VideoFrame) -> Result<GrayImage, VisionError> {
        let gray = frame.to_gray();
        GrayImage::from_raw(frame.width(), frame.height(), gray.data).ok_or(
            VisionError::BadRaster {
                width: frame.width(),
                height: frame.height(),
            },
        )
    }

    fn blur(
        &self,
        gray: &GrayImage,
        kernel_size: u32,
        sigma: f32,
    ) -> Result<GrayImage, VisionError> {
        // gaussian_blur_f32 asserts a positive sigma
        if kernel_size <= 1 || !(sigma > 0.0) {
            return Ok(gray.clone());
        }
        Ok(imageproc::filter::gaussian_blur_f32(gray, sigma))
    }

    fn edge_detect(&self, gray: &GrayImage, low: f32, high: f32) -> Result<GrayImage, VisionError> {
        if gray.width() < 3 || gray.height() < 3 {
            return Ok(GrayImage::new(gray.width(), gray.height()));
        }
        Ok(imageproc::edges::canny(gray, low, high))
    }

    fn dilate(&self, edges: &GrayImage, radius: u8) -> Result<GrayImage, VisionError> {
        if radius == 0 {
            return Ok(edges.clone());
        }
        Ok(imageproc::morphology::dilate(edges, Norm::LInf, radius))
    }

    fn find_external_contours(&self, edges: &GrayImage) -> Result<Vec<Contour>, VisionError> {
        let contours = find_contours::<i32>(edges)
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .map(|c| {
                Contour::new(
                    c.points
                        .into_iter()
                        .map(|p| Point2::new(p.x, p.y))
                        .collect(),
                )
            })
            .collect();
        Ok(contours)
    }

    fn approx_polygon(&self, contour: &Contour, epsilon: f64) -> Vec<Point2<i32>> {
        if contour.len() < 3 || !(epsilon > 0.0) {
            return contour.points.clone();
        }
        let curve: Vec<Point<i32>> = contour
            .points
            .iter()
            .map(|p| Point::new(p.x, p.y))
            .collect();
        simplify_closed(&curve, epsilon)
            .into_iter()
            .map(|p| Point2::new(p.x, p.y))
            .collect()
    }
}

/// Douglas-Peucker on a closed curve given without a repeated endpoint.
///
/// The curve is split at the point farthest from its start and both open
/// chains are simplified separately; `approximate_polygon_dp` degenerates
/// when a chain starts and ends on the same point.
fn simplify_closed(curve: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let start = curve[0];
    let dist2 = |p: &Point<i32>| {
        let (dx, dy) = ((p.x - start.x) as i64, (p.y - start.y) as i64);
        dx * dx + dy * dy
    };
    let Some((far, _)) = curve
        .iter()
        .enumerate()
        .map(|(i, p)| (i, dist2(p)))
        .filter(|&(_, d)| d > 0)
        .max_by_key(|&(i, d)| (d, std::cmp::Reverse(i)))
    else {
        return vec![start];
    };

    let mut out = approximate_polygon_dp(&curve[..=far], epsilon, false);
    let mut back = curve[far..].to_vec();
    back.push(start);
    out.pop();
    out.extend(approximate_polygon_dp(&back, epsilon, false));
    out.pop();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled_rect(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if x >= x0 && x < x1 && y >= y0 && y < y1 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn outer_contour_of_blob_is_found_once() {
        let img = filled_rect(40, 30, 10, 5, 30, 25);
        let contours = ImageprocVision.find_external_contours(&img).expect("contours");
        assert_eq!(contours.len(), 1);
        let rect = ImageprocVision.bounding_rect(&contours[0]).expect("rect");
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (10.0, 5.0, 20.0, 20.0));
    }

    #[test]
    fn nested_outlines_are_not_external() {
        // ring with a separate blob inside its hole
        let mut img = filled_rect(60, 60, 5, 5, 55, 55);
        for y in 10..50 {
            for x in 10..50 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        for y in 25..35 {
            for x in 25..35 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = ImageprocVision.find_external_contours(&img).expect("contours");
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn rectangle_outline_simplifies_to_few_vertices() {
        let img = filled_rect(80, 60, 10, 10, 70, 50);
        let contours = ImageprocVision.find_external_contours(&img).expect("contours");
        let c = &contours[0];
        let eps = 0.02 * ImageprocVision.arc_length(c);
        let poly = ImageprocVision.approx_polygon(c, eps);
        assert!(
            (4..=5).contains(&poly.len()),
            "unexpected vertex count {}",
            poly.len()
        );
        assert_ne!(poly.first(), poly.last());
    }

    #[test]
    fn sparse_quad_keeps_all_four_corners() {
        let quad = Contour::from_xy(&[(100, 100), (600, 100), (600, 500), (100, 500)]);
        let eps = 0.02 * ImageprocVision.arc_length(&quad);
        let poly = ImageprocVision.approx_polygon(&quad, eps);
        assert_eq!(poly, quad.points);
    }

    #[test]
    fn sparse_polygon_ending_on_a_corner_keeps_it() {
        // collinear midpoints go, every corner stays
        let pentagon = Contour::from_xy(&[
            (0, 0),
            (50, 0),
            (100, 0),
            (100, 80),
            (50, 120),
            (0, 80),
        ]);
        let eps = 0.02 * ImageprocVision.arc_length(&pentagon);
        let poly = ImageprocVision.approx_polygon(&pentagon, eps);
        let expected = Contour::from_xy(&[(0, 0), (100, 0), (100, 80), (50, 120), (0, 80)]);
        assert_eq!(poly, expected.points);
    }

    #[test]
    fn coincident_points_collapse_to_one() {
        let dot = Contour::from_xy(&[(5, 5), (5, 5), (5, 5)]);
        assert_eq!(ImageprocVision.approx_polygon(&dot, 1.0).len(), 1);
    }

    #[test]
    fn dilation_grows_single_pixel_to_square() {
        let mut img = GrayImage::new(7, 7);
        img.put_pixel(3, 3, Luma([255]));
        let d = ImageprocVision.dilate(&img, 1).expect("dilate");
        let lit = d.pixels().filter(|p| p[0] > 0).count();
        assert_eq!(lit, 9);
    }

    #[test]
    fn flat_image_has_no_edges() {
        let img = GrayImage::from_pixel(32, 32, Luma([128]));
        let edges = ImageprocVision.edge_detect(&img, 50.0, 150.0).expect("edges");
        assert!(edges.pixels().all(|p| p[0] == 0));
    }
}
