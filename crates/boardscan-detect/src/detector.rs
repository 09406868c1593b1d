use std::panic::{catch_unwind, AssertUnwindSafe};

use boardscan_core::{
    DetectedRegion, DisplaySize, FrameSize, RegionDetector, SpaceMapping, VideoFrame,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::candidate::{evaluate_contour, select_largest, BoardCandidate};
use crate::imageproc_vision::ImageprocVision;
use crate::params::BoardDetectorParams;
use crate::vision::{VisionError, VisionProvider};

/// Errors surfaced by [`BoardDetector::try_detect`].
///
/// [`BoardDetector::detect`] never returns them; it logs and reports "no
/// region" instead.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("vision provider panicked: {0}")]
    ProviderPanicked(String),
}

/// Finds the most plausible rectangular board outline in a frame.
pub struct BoardDetector<V = ImageprocVision> {
    params: BoardDetectorParams,
    vision: V,
}

impl BoardDetector<ImageprocVision> {
    pub fn new(params: BoardDetectorParams) -> Self {
        Self::with_vision(params, ImageprocVision)
    }
}

impl Default for BoardDetector<ImageprocVision> {
    fn default() -> Self {
        Self::new(BoardDetectorParams::default())
    }
}

impl<V: VisionProvider> BoardDetector<V> {
    pub fn with_vision(params: BoardDetectorParams, vision: V) -> Self {
        Self { params, vision }
    }

    pub fn params(&self) -> &BoardDetectorParams {
        &self.params
    }

    pub fn vision(&self) -> &V {
        &self.vision
    }

    /// Best candidate in analysis-frame pixels, before display mapping.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip(self, frame),
            fields(width = frame.width(), height = frame.height())
        )
    )]
    pub fn find_candidate(
        &self,
        frame: &VideoFrame,
    ) -> Result<Option<BoardCandidate>, DetectError> {
        if frame.is_empty() {
            log::debug!("skipping empty {}x{} frame", frame.width(), frame.height());
            return Ok(None);
        }

        let p = &self.params;
        let gray = self.vision.to_gray(frame)?;
        let blurred = self.vision.blur(&gray, p.blur_kernel_size, p.blur_sigma())?;
        let edges = self.vision.edge_detect(&blurred, p.canny_low, p.canny_high)?;
        let edges = self.vision.dilate(&edges, p.dilate_radius())?;
        let contours = self.vision.find_external_contours(&edges)?;

        let frame_area = frame.area();
        let accepted = contours.iter().enumerate().filter_map(|(i, contour)| {
            match evaluate_contour(&self.vision, i, contour, frame_area, p) {
                Ok(candidate) => Some(candidate),
                Err(rejection) => {
                    log::trace!("contour {i} ({} px) rejected: {rejection:?}", contour.len());
                    None
                }
            }
        });
        let best = select_largest(accepted);

        log::debug!(
            "{} external contours, best: {:?}",
            contours.len(),
            best.as_ref()
                .map(|c| (c.contour_index, c.area, c.rectangularity))
        );
        Ok(best)
    }

    /// Run the full pipeline and map the result into `display` space.
    ///
    /// An empty display size leaves coordinates in frame pixels.
    pub fn try_detect(
        &self,
        frame: &VideoFrame,
        display: DisplaySize,
    ) -> Result<Option<DetectedRegion>, DetectError> {
        let Some(candidate) = self.find_candidate(frame)? else {
            return Ok(None);
        };
        let native = FrameSize::new(frame.width(), frame.height());
        let mapping = match SpaceMapping::new(native, display) {
            Some(m) => m,
            None => {
                log::debug!("display size {display:?} unusable, keeping frame coordinates");
                match SpaceMapping::identity(native) {
                    Some(m) => m,
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(candidate.to_region(&mapping, self.params.confidence_gain)))
    }

    /// Infallible detection: every failure (including a panicking vision
    /// backend) is logged and reported as "no region".
    pub fn detect(&self, frame: &VideoFrame, display: DisplaySize) -> Option<DetectedRegion> {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_detect(frame, display)))
            .unwrap_or_else(|payload| Err(DetectError::ProviderPanicked(panic_message(&payload))));
        match outcome {
            Ok(region) => region,
            Err(err) => {
                log::error!("board detection failed: {err}");
                None
            }
        }
    }

    /// Raw edge map (no smoothing, no dilation) as an opaque RGBA frame,
    /// for overlay debugging.
    pub fn edge_visualization(&self, frame: &VideoFrame) -> Option<VideoFrame> {
        if frame.is_empty() {
            return None;
        }
        let result = self.vision.to_gray(frame).and_then(|gray| {
            self.vision
                .edge_detect(&gray, self.params.canny_low, self.params.canny_high)
        });
        match result {
            Ok(edges) => VideoFrame::from_gray(edges.width(), edges.height(), edges.as_raw())
                .map_err(|err| log::error!("edge visualization failed: {err}"))
                .ok(),
            Err(err) => {
                log::error!("edge visualization failed: {err}");
                None
            }
        }
    }
}

impl<V: VisionProvider> RegionDetector for BoardDetector<V> {
    fn detect_region(
        &mut self,
        frame: &VideoFrame,
        display: DisplaySize,
    ) -> Option<DetectedRegion> {
        self.detect(frame, display)
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
