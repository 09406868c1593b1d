//! The scanner: one feed, one detector, the latest region, and capture.

use std::sync::Arc;

use boardscan_capture::{
    CaptureSurface, ContinuousDetection, EncodedStill, FrameClock, FrameRequest, FrameSource,
    JpegStillEncoder, ManualDetection, PassOutcome, RegionSlot, SchedulerError, StillEncoder,
};
use boardscan_core::{DetectedRegion, RegionDetector};
use boardscan_detect::BoardDetector;
use boardscan_services::{ComponentRecognizer, DetectedComponent, RecognitionService};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::config::ScannerConfig;
use crate::scan::ScanError;

/// Ties detection scheduling and still capture to a single frame source.
///
/// The latest published region decides what [`Scanner::capture`] crops:
/// with a region the still covers just the board, without one it is the
/// whole frame.
pub struct Scanner<S, D = BoardDetector, E = JpegStillEncoder> {
    surface: CaptureSurface<S, E>,
    detector: D,
    continuous: ContinuousDetection,
    manual: ManualDetection,
    slot: RegionSlot,
}

impl<S: FrameSource> Scanner<S> {
    pub fn new(source: S, config: &ScannerConfig) -> Self {
        Self::with_parts(
            source,
            BoardDetector::new(config.detector.clone()),
            JpegStillEncoder::from_config(&config.capture),
        )
    }
}

impl<S, D, E> Scanner<S, D, E>
where
    S: FrameSource,
    D: RegionDetector,
    E: StillEncoder,
{
    pub fn with_parts(source: S, detector: D, encoder: E) -> Self {
        Self {
            surface: CaptureSurface::with_encoder(source, encoder),
            detector,
            continuous: ContinuousDetection::new(),
            manual: ManualDetection::new(),
            slot: RegionSlot::new(),
        }
    }

    pub fn source(&self) -> &S {
        self.surface.source()
    }

    pub fn source_mut(&mut self) -> &mut S {
        self.surface.source_mut()
    }

    pub fn latest_region(&self) -> Option<Arc<DetectedRegion>> {
        self.slot.latest()
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous.is_running()
    }

    pub fn is_detecting(&self) -> bool {
        self.manual.in_progress()
    }

    /// Forget the current region.
    pub fn clear_region(&mut self) {
        self.slot.clear();
    }

    /// One detection pass on the current frame. Replaces the region, or
    /// clears it when nothing is found.
    pub fn detect_once(&mut self) -> Option<Arc<DetectedRegion>> {
        self.manual
            .run(&mut self.detector, self.surface.source_mut(), &mut self.slot)
    }

    pub fn start_continuous<C: FrameClock>(&mut self, clock: &mut C) -> Result<(), SchedulerError> {
        let live = self.surface.source().is_live();
        self.continuous.start(clock, live, true)
    }

    pub fn stop_continuous<C: FrameClock>(&mut self, clock: &mut C) {
        self.continuous.stop(clock);
    }

    /// Handle a fired tick of the continuous loop.
    pub fn on_frame<C: FrameClock>(
        &mut self,
        clock: &mut C,
        fired: FrameRequest,
    ) -> Option<PassOutcome> {
        self.continuous.on_frame(
            clock,
            fired,
            &mut self.detector,
            self.surface.source_mut(),
            &mut self.slot,
        )
    }

    /// Still of the current board region, or of the full frame when no
    /// region is known. `Ok(None)` when the feed has no frame.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn capture(&mut self) -> Result<Option<EncodedStill>, ScanError> {
        let still = match self.slot.latest() {
            Some(region) => {
                log::debug!("capturing detected region {:?}", region.bounding_box);
                self.surface.capture_region(region.bounding_box)?
            }
            None => self.surface.capture_full_frame()?,
        };
        Ok(still)
    }

    /// Capture and send the still for component recognition.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn scan<R: RecognitionService>(
        &mut self,
        recognizer: &mut ComponentRecognizer<R>,
    ) -> Result<Vec<DetectedComponent>, ScanError> {
        let still = self.capture()?.ok_or(ScanError::NoFrame)?;
        log::info!(
            "analyzing {}x{} still ({} bytes)",
            still.width,
            still.height,
            still.bytes.len()
        );
        Ok(recognizer.analyze(&still.to_base64())?)
    }
}
