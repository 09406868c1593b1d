use serde::{Deserialize, Serialize};

/// Thresholds of the board detection pipeline.
///
/// The defaults are the tuned production values; most callers never touch
/// them. Fractions are relative to the full frame area or the contour
/// perimeter as noted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardDetectorParams {
    /// Side of the square Gaussian smoothing kernel (odd).
    pub blur_kernel_size: u32,
    /// Canny hysteresis thresholds on the 0..255 intensity scale.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Side of the square all-ones dilation element (odd).
    pub dilate_kernel_size: u32,
    /// Contours enclosing less than this fraction of the frame are noise.
    pub min_area_frac: f64,
    /// Contours enclosing more than this fraction are the frame itself.
    pub max_area_frac: f64,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
    /// Accepted bounding-box width/height range.
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    /// Rectangularity must be strictly above this value.
    pub min_rectangularity: f64,
    /// Multiplier turning rectangularity into confidence (result capped at 1).
    pub confidence_gain: f64,
}

impl Default for BoardDetectorParams {
    fn default() -> Self {
        Self {
            blur_kernel_size: 5,
            canny_low: 50.0,
            canny_high: 150.0,
            dilate_kernel_size: 3,
            min_area_frac: 0.05,
            max_area_frac: 0.95,
            approx_epsilon_frac: 0.02,
            min_vertices: 4,
            max_vertices: 8,
            min_aspect_ratio: 0.3,
            max_aspect_ratio: 3.5,
            min_rectangularity: 0.6,
            confidence_gain: 1.2,
        }
    }
}

impl BoardDetectorParams {
    /// Gaussian sigma matching a kernel of `blur_kernel_size` taps with
    /// automatic sigma selection (`0.3 * ((k - 1) / 2 - 1) + 0.8`).
    pub fn blur_sigma(&self) -> f32 {
        let k = self.blur_kernel_size.max(1) as f32;
        0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
    }

    /// Chebyshev radius of the dilation element.
    pub fn dilate_radius(&self) -> u8 {
        (self.dilate_kernel_size.saturating_sub(1) / 2).min(u8::MAX as u32) as u8
    }

    /// Report the first inconsistency, if any.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(ParamsError::BlurKernel(self.blur_kernel_size));
        }
        if self.dilate_kernel_size == 0 || self.dilate_kernel_size % 2 == 0 {
            return Err(ParamsError::DilateKernel(self.dilate_kernel_size));
        }
        if !(self.canny_low >= 0.0 && self.canny_low <= self.canny_high) {
            return Err(ParamsError::CannyThresholds {
                low: self.canny_low,
                high: self.canny_high,
            });
        }
        if !(0.0..=1.0).contains(&self.min_area_frac)
            || !(0.0..=1.0).contains(&self.max_area_frac)
            || self.min_area_frac > self.max_area_frac
        {
            return Err(ParamsError::AreaRange {
                min: self.min_area_frac,
                max: self.max_area_frac,
            });
        }
        if !(self.approx_epsilon_frac > 0.0) {
            return Err(ParamsError::ApproxEpsilon(self.approx_epsilon_frac));
        }
        if self.min_vertices < 3 || self.min_vertices > self.max_vertices {
            return Err(ParamsError::VertexRange {
                min: self.min_vertices,
                max: self.max_vertices,
            });
        }
        if !(self.min_aspect_ratio > 0.0 && self.min_aspect_ratio <= self.max_aspect_ratio) {
            return Err(ParamsError::AspectRange {
                min: self.min_aspect_ratio,
                max: self.max_aspect_ratio,
            });
        }
        Ok(())
    }
}

/// Inconsistent [`BoardDetectorParams`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("blur_kernel_size must be odd and positive, got {0}")]
    BlurKernel(u32),
    #[error("dilate_kernel_size must be odd and positive, got {0}")]
    DilateKernel(u32),
    #[error("canny thresholds must satisfy 0 <= low <= high, got {low}/{high}")]
    CannyThresholds { low: f32, high: f32 },
    #[error("area fractions must satisfy 0 <= min <= max <= 1, got {min}..{max}")]
    AreaRange { min: f64, max: f64 },
    #[error("approx_epsilon_frac must be positive, got {0}")]
    ApproxEpsilon(f64),
    #[error("vertex range must satisfy 3 <= min <= max, got {min}..{max}")]
    VertexRange { min: usize, max: usize },
    #[error("aspect ratio range must satisfy 0 < min <= max, got {min}..{max}")]
    AspectRange { min: f32, max: f32 },
}
