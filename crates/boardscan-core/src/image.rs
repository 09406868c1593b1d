//! Raster types: the RGBA [`VideoFrame`] snapshot and its grayscale form.

/// Errors raised when constructing frames from raw buffers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid RGBA buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },
}

/// Immutable RGBA snapshot of the feed at one instant.
///
/// Row-major, 4 bytes per pixel. A frame is created on demand, analyzed or
/// encoded once, then dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl VideoFrame {
    /// Wrap a raw RGBA buffer, checking that it matches the dimensions.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(FrameError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(FrameError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Expand a single-channel buffer into an opaque RGBA frame.
    pub fn from_gray(width: u32, height: u32, gray: &[u8]) -> Result<Self, FrameError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or(FrameError::InvalidDimensions { width, height })?;
        if gray.len() != expected {
            return Err(FrameError::InvalidBuffer {
                expected,
                got: gray.len(),
            });
        }
        let data = gray.iter().flat_map(|&v| [v, v, v, 255]).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total pixel count as `f64`, the unit area thresholds are expressed in.
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.data
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.data
    }

    /// Luma conversion with BT.601 weights; alpha is ignored.
    pub fn to_gray(&self) -> GrayImage {
        let data = self
            .data
            .chunks_exact(4)
            .map(|px| {
                let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                y.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        GrayImage {
            width: self.width as usize,
            height: self.height as usize,
            data,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}
