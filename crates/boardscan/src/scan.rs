//! End-to-end helpers from `image` buffers.
//!
//! These convert decoded images or raw pixel buffers into [`VideoFrame`]s and
//! run the board detector on them in one call.

use boardscan_core::{DisplaySize, FrameError, VideoFrame};
use boardscan_detect::{BoardDetector, BoardDetectorParams, DetectError, ParamsError};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error(transparent)]
    Encode(#[from] boardscan_capture::EncodeError),

    #[error(transparent)]
    Analysis(#[from] boardscan_services::AnalysisError),

    #[error("invalid detector parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("no frame available")]
    NoFrame,
}

/// Snapshot a decoded image as an RGBA frame.
pub fn frame_from_image(img: &::image::DynamicImage) -> Result<VideoFrame, ScanError> {
    frame_from_rgba_image(img.to_rgba8())
}

pub fn frame_from_rgba_image(img: ::image::RgbaImage) -> Result<VideoFrame, ScanError> {
    let (width, height) = img.dimensions();
    Ok(VideoFrame::from_rgba(width, height, img.into_raw())?)
}

/// Build a frame from a raw grayscale buffer.
pub fn frame_from_gray_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<VideoFrame, ScanError> {
    Ok(VideoFrame::from_gray(width, height, pixels)?)
}

/// Build a frame from a raw RGBA buffer.
pub fn frame_from_rgba_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<VideoFrame, ScanError> {
    Ok(VideoFrame::from_rgba(width, height, pixels.to_vec())?)
}

/// Decode an image file into a frame.
pub fn load_frame(path: impl AsRef<Path>) -> Result<VideoFrame, ScanError> {
    let img = ::image::open(path.as_ref())?;
    frame_from_image(&img)
}

/// Turn a frame back into an `image` buffer.
pub fn frame_to_rgba_image(frame: &VideoFrame) -> Result<::image::RgbaImage, ScanError> {
    let (width, height) = (frame.width(), frame.height());
    ::image::RgbaImage::from_raw(width, height, frame.as_rgba().to_vec())
        .ok_or(ScanError::Frame(FrameError::InvalidDimensions { width, height }))
}

/// Run the board detector on a decoded image.
///
/// `display` defaults to the native image size, so the region comes back in
/// image pixels.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(img, params),
        fields(width = img.width(), height = img.height())
    )
)]
pub fn detect_board(
    img: &::image::DynamicImage,
    params: BoardDetectorParams,
    display: Option<DisplaySize>,
) -> Result<Option<boardscan_core::DetectedRegion>, ScanError> {
    params.validate()?;
    let frame = frame_from_image(img)?;
    let display = display.unwrap_or(DisplaySize::new(img.width() as f32, img.height() as f32));
    let detector = BoardDetector::new(params);
    Ok(detector.try_detect(&frame, display)?)
}

/// Convenience overload using default parameters and native display size.
pub fn detect_board_default(
    img: &::image::DynamicImage,
) -> Result<Option<boardscan_core::DetectedRegion>, ScanError> {
    detect_board(img, BoardDetectorParams::default(), None)
}

pub fn detect_board_from_gray_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    params: BoardDetectorParams,
) -> Result<Option<boardscan_core::DetectedRegion>, ScanError> {
    params.validate()?;
    let frame = frame_from_gray_slice(width, height, pixels)?;
    let detector = BoardDetector::new(params);
    Ok(detector.try_detect(&frame, DisplaySize::new(width as f32, height as f32))?)
}

/// Edge map of a decoded image as a grayscale picture, for tuning.
pub fn edge_map(
    img: &::image::DynamicImage,
    params: BoardDetectorParams,
) -> Result<Option<::image::GrayImage>, ScanError> {
    let frame = frame_from_image(img)?;
    let detector = BoardDetector::new(params);
    let Some(edges) = detector.edge_visualization(&frame) else {
        return Ok(None);
    };
    let rgba = frame_to_rgba_image(&edges)?;
    Ok(Some(::image::DynamicImage::ImageRgba8(rgba).into_luma8()))
}
