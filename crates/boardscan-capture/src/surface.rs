//! Still capture from the live feed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use boardscan_core::{DisplaySize, FrameSize, PixelRect, SpaceMapping, VideoFrame};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("raster of {width}x{height} does not match its buffer")]
    BadRaster { width: u32, height: u32 },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Where frames come from: a camera feed, a file, a test pattern.
pub trait FrameSource {
    /// Whether the feed is currently delivering frames.
    fn is_live(&self) -> bool {
        true
    }

    /// Laid-out size of the element showing the feed, read at call time.
    fn display_size(&self) -> DisplaySize;

    /// Snapshot of the current frame at native resolution, if one is
    /// available.
    fn current_frame(&mut self) -> Option<VideoFrame>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { jpeg_quality: 90 }
    }
}

/// A compressed still ready for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedStill {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedStill {
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.to_base64())
    }
}

pub trait StillEncoder {
    fn encode(&self, image: RgbaImage) -> Result<EncodedStill, EncodeError>;
}

/// Baseline JPEG via the `image` codec. Transparent pixels come out black.
#[derive(Clone, Copy, Debug)]
pub struct JpegStillEncoder {
    quality: u8,
}

impl JpegStillEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.jpeg_quality)
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegStillEncoder {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}

impl StillEncoder for JpegStillEncoder {
    fn encode(&self, image: RgbaImage) -> Result<EncodedStill, EncodeError> {
        let (width, height) = image.dimensions();
        let rgb = DynamicImage::ImageRgba8(image).into_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode_image(&rgb)?;
        Ok(EncodedStill {
            bytes,
            mime: "image/jpeg",
            width,
            height,
        })
    }
}

/// Produces stills from a [`FrameSource`].
pub struct CaptureSurface<S, E = JpegStillEncoder> {
    source: S,
    encoder: E,
}

impl<S: FrameSource> CaptureSurface<S, JpegStillEncoder> {
    pub fn new(source: S) -> Self {
        Self::with_encoder(source, JpegStillEncoder::default())
    }
}

impl<S: FrameSource, E: StillEncoder> CaptureSurface<S, E> {
    pub fn with_encoder(source: S, encoder: E) -> Self {
        Self { source, encoder }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Whole current frame at native resolution. `Ok(None)` when no frame
    /// is available.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn capture_full_frame(&mut self) -> Result<Option<EncodedStill>, EncodeError> {
        let Some(frame) = self.source.current_frame() else {
            log::debug!("no frame to capture");
            return Ok(None);
        };
        let image = frame_to_rgba(frame)?;
        self.encoder.encode(image).map(Some)
    }

    /// Native-resolution crop of a rectangle given in display space.
    ///
    /// The output is exactly the rounded native size of the rectangle; parts
    /// of it that fall outside the frame stay transparent. `Ok(None)` for a
    /// degenerate rectangle, an unusable display size, or no frame.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn capture_region(&mut self, rect: PixelRect) -> Result<Option<EncodedStill>, EncodeError> {
        if rect.is_degenerate() {
            log::warn!("refusing to capture degenerate region {rect:?}");
            return Ok(None);
        }
        let Some(frame) = self.source.current_frame() else {
            log::debug!("no frame to capture");
            return Ok(None);
        };
        // re-read on every call; the element may have been resized
        let display = self.source.display_size();
        let native = FrameSize::new(frame.width(), frame.height());
        let Some(mapping) = SpaceMapping::new(native, display) else {
            log::warn!("cannot map {display:?} onto a {}x{} frame", native.width, native.height);
            return Ok(None);
        };

        let src = mapping.display_to_native_rect(&rect);
        let out_w = src.width.round() as u32;
        let out_h = src.height.round() as u32;
        if out_w == 0 || out_h == 0 {
            return Ok(None);
        }

        let image = frame_to_rgba(frame)?;
        let mut canvas = RgbaImage::new(out_w, out_h);
        imageops::replace(
            &mut canvas,
            &image,
            -(src.x.round() as i64),
            -(src.y.round() as i64),
        );
        log::debug!(
            "captured {out_w}x{out_h} region at ({:.1}, {:.1}) native",
            src.x,
            src.y
        );
        self.encoder.encode(canvas).map(Some)
    }
}

fn frame_to_rgba(frame: VideoFrame) -> Result<RgbaImage, EncodeError> {
    let (width, height) = (frame.width(), frame.height());
    RgbaImage::from_raw(width, height, frame.into_rgba())
        .ok_or(EncodeError::BadRaster { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame whose red channel encodes x and green channel encodes y.
    struct Gradient {
        width: u32,
        height: u32,
        display: DisplaySize,
        live: bool,
    }

    impl FrameSource for Gradient {
        fn is_live(&self) -> bool {
            self.live
        }

        fn display_size(&self) -> DisplaySize {
            self.display
        }

        fn current_frame(&mut self) -> Option<VideoFrame> {
            if !self.live {
                return None;
            }
            let mut data = Vec::with_capacity((self.width * self.height * 4) as usize);
            for y in 0..self.height {
                for x in 0..self.width {
                    data.extend_from_slice(&[x as u8, y as u8, 0, 255]);
                }
            }
            VideoFrame::from_rgba(self.width, self.height, data).ok()
        }
    }

    /// Keeps the raw canvas instead of compressing it.
    struct Raw(std::cell::RefCell<Option<RgbaImage>>);

    impl StillEncoder for Raw {
        fn encode(&self, image: RgbaImage) -> Result<EncodedStill, EncodeError> {
            let (width, height) = image.dimensions();
            *self.0.borrow_mut() = Some(image);
            Ok(EncodedStill {
                bytes: Vec::new(),
                mime: "image/x-raw",
                width,
                height,
            })
        }
    }

    fn gradient(display: DisplaySize) -> Gradient {
        Gradient {
            width: 200,
            height: 100,
            display,
            live: true,
        }
    }

    #[test]
    fn full_frame_is_a_jpeg_at_native_size() {
        let mut surface = CaptureSurface::new(gradient(DisplaySize::new(100.0, 50.0)));
        let still = surface.capture_full_frame().expect("encode").expect("frame");
        assert_eq!((still.width, still.height), (200, 100));
        assert_eq!(&still.bytes[..2], &[0xFF, 0xD8]);
        assert!(still.to_data_url().starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn region_is_scaled_per_axis() {
        // display squeezes x by 2 and y by 4
        let encoder = Raw(Default::default());
        let mut surface =
            CaptureSurface::with_encoder(gradient(DisplaySize::new(100.0, 25.0)), encoder);
        let still = surface
            .capture_region(PixelRect::new(10.0, 5.0, 30.0, 10.0))
            .expect("encode")
            .expect("still");
        assert_eq!((still.width, still.height), (60, 40));

        let canvas = surface.encoder.0.borrow_mut().take().expect("canvas");
        assert_eq!(canvas.get_pixel(0, 0).0, [20, 20, 0, 255]);
        assert_eq!(canvas.get_pixel(59, 39).0, [79, 59, 0, 255]);
    }

    #[test]
    fn outside_parts_stay_transparent() {
        let encoder = Raw(Default::default());
        let mut surface =
            CaptureSurface::with_encoder(gradient(DisplaySize::new(200.0, 100.0)), encoder);
        let still = surface
            .capture_region(PixelRect::new(180.0, -10.0, 40.0, 30.0))
            .expect("encode")
            .expect("still");
        assert_eq!((still.width, still.height), (40, 30));

        let canvas = surface.encoder.0.borrow_mut().take().expect("canvas");
        assert_eq!(canvas.get_pixel(0, 0).0[3], 0);
        assert_eq!(canvas.get_pixel(0, 10).0, [180, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(25, 15).0[3], 0);
    }

    #[test]
    fn degenerate_regions_produce_nothing() {
        let mut surface = CaptureSurface::new(gradient(DisplaySize::new(200.0, 100.0)));
        for rect in [
            PixelRect::new(0.0, 0.0, 0.0, 10.0),
            PixelRect::new(0.0, 0.0, 10.0, -5.0),
            PixelRect::new(0.0, 0.0, f32::NAN, 10.0),
            PixelRect::new(f32::INFINITY, 0.0, 10.0, 10.0),
        ] {
            assert!(surface.capture_region(rect).expect("ok").is_none(), "{rect:?}");
        }
    }

    #[test]
    fn no_frame_produces_nothing() {
        let mut src = gradient(DisplaySize::new(200.0, 100.0));
        src.live = false;
        let mut surface = CaptureSurface::new(src);
        assert!(surface.capture_full_frame().expect("ok").is_none());
        assert!(surface
            .capture_region(PixelRect::new(0.0, 0.0, 10.0, 10.0))
            .expect("ok")
            .is_none());
    }

    #[test]
    fn collapsed_display_produces_nothing() {
        let mut surface = CaptureSurface::new(gradient(DisplaySize::new(0.0, 0.0)));
        assert!(surface
            .capture_region(PixelRect::new(0.0, 0.0, 10.0, 10.0))
            .expect("ok")
            .is_none());
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(JpegStillEncoder::new(0).quality(), 1);
        assert_eq!(JpegStillEncoder::new(200).quality(), 100);
        assert_eq!(JpegStillEncoder::default().quality(), 90);
    }
}
