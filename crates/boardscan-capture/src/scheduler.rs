//! Continuous and single-shot detection against a live feed.
//!
//! Continuous mode is a small state machine (`Idle -> Running -> Idle`)
//! driven by a [`FrameClock`]. Every start opens a new run epoch; a pass
//! that began in an older epoch can still finish, but its result is dropped
//! and it does not reschedule.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use boardscan_core::{DetectedRegion, RegionDetector};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::surface::FrameSource;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("the video feed is not active")]
    FeedInactive,

    #[error("the detector is not ready")]
    DetectorNotReady,

    #[error("frame rate must be finite and positive, got {0}")]
    InvalidRate(f64),
}

/// Handle of one requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

/// Frame-presentation cadence: one-shot "call me on the next frame"
/// requests that can be cancelled.
pub trait FrameClock {
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Clock driven by the host (or a test): requests fire when told to, in
/// request order.
#[derive(Debug, Default)]
pub struct ManualClock {
    next_id: u64,
    pending: VecDeque<FrameRequest>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the oldest outstanding request.
    pub fn fire(&mut self) -> Option<FrameRequest> {
        self.pending.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let req = FrameRequest(self.next_id);
        self.pending.push_back(req);
        req
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.pending.retain(|r| *r != request);
    }
}

/// Wall-clock pacing at a fixed presentation rate, for headless hosts.
#[derive(Debug)]
pub struct PacedClock {
    interval: Duration,
    next_id: u64,
    pending: Option<FrameRequest>,
    last_fire: Option<Instant>,
}

impl PacedClock {
    pub fn new(fps: f64) -> Result<Self, SchedulerError> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(SchedulerError::InvalidRate(fps));
        }
        Ok(Self {
            interval: Duration::from_secs_f64(1.0 / fps),
            next_id: 0,
            pending: None,
            last_fire: None,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the next frame slot and fire the outstanding request.
    /// Returns `None` immediately when nothing is outstanding.
    pub fn wait_next(&mut self) -> Option<FrameRequest> {
        let req = self.pending.take()?;
        if let Some(last) = self.last_fire {
            let due = last + self.interval;
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
        self.last_fire = Some(Instant::now());
        Some(req)
    }
}

impl FrameClock for PacedClock {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let req = FrameRequest(self.next_id);
        self.pending = Some(req);
        req
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }
}

/// Holder of the latest published region.
///
/// Regions are shared immutably and replaced wholesale.
#[derive(Debug, Default)]
pub struct RegionSlot {
    latest: Option<Arc<DetectedRegion>>,
}

impl RegionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, region: DetectedRegion) -> Arc<DetectedRegion> {
        let region = Arc::new(region);
        self.latest = Some(Arc::clone(&region));
        region
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }

    pub fn latest(&self) -> Option<Arc<DetectedRegion>> {
        self.latest.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Proof that a pass was admitted, tagged with the run it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassTicket {
    epoch: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// A region was found and replaced the previous one.
    Published,
    /// Nothing qualified; the previous region is kept.
    NothingFound,
    /// The run was stopped while the pass was in flight.
    Discarded,
}

#[derive(Debug)]
pub struct ContinuousDetection {
    state: SchedulerState,
    epoch: u64,
    pending: Option<FrameRequest>,
}

impl Default for ContinuousDetection {
    fn default() -> Self {
        Self::new()
    }
}

impl ContinuousDetection {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            epoch: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Enter `Running` and schedule the first pass. Starting an already
    /// running scheduler changes nothing.
    pub fn start<C: FrameClock>(
        &mut self,
        clock: &mut C,
        feed_active: bool,
        detector_ready: bool,
    ) -> Result<(), SchedulerError> {
        if self.is_running() {
            return Ok(());
        }
        if !feed_active {
            return Err(SchedulerError::FeedInactive);
        }
        if !detector_ready {
            return Err(SchedulerError::DetectorNotReady);
        }
        self.epoch += 1;
        self.state = SchedulerState::Running;
        self.pending = Some(clock.request_frame());
        log::debug!("continuous detection started (run {})", self.epoch);
        Ok(())
    }

    /// Cancel the pending tick and return to `Idle`. Idempotent.
    pub fn stop<C: FrameClock>(&mut self, clock: &mut C) {
        if let Some(req) = self.pending.take() {
            clock.cancel_frame(req);
        }
        if self.is_running() {
            self.state = SchedulerState::Idle;
            self.epoch += 1;
            log::debug!("continuous detection stopped");
        }
    }

    /// Admit the pass for a fired tick.
    ///
    /// Returns `None` (no work, nothing rescheduled) for stale ticks, when
    /// not running, or when the feed went away; the latter also ends the run.
    pub fn begin_pass(&mut self, fired: FrameRequest, feed_active: bool) -> Option<PassTicket> {
        if self.pending != Some(fired) {
            log::trace!("ignoring stale frame callback {fired:?}");
            return None;
        }
        self.pending = None;
        if !self.is_running() {
            return None;
        }
        if !feed_active {
            log::debug!("feed inactive, continuous detection halts");
            self.state = SchedulerState::Idle;
            self.epoch += 1;
            return None;
        }
        Some(PassTicket { epoch: self.epoch })
    }

    /// Publish the pass result and reschedule, unless the run it belongs to
    /// has ended.
    pub fn finish_pass<C: FrameClock>(
        &mut self,
        clock: &mut C,
        ticket: PassTicket,
        result: Option<DetectedRegion>,
        slot: &mut RegionSlot,
    ) -> PassOutcome {
        if !self.is_running() || ticket.epoch != self.epoch {
            log::debug!("discarding pass from finished run {}", ticket.epoch);
            return PassOutcome::Discarded;
        }
        let outcome = match result {
            Some(region) => {
                slot.publish(region);
                PassOutcome::Published
            }
            None => PassOutcome::NothingFound,
        };
        self.pending = Some(clock.request_frame());
        log::debug!("pass finished: {outcome:?}");
        outcome
    }

    /// Run one complete pass for a fired tick: admit, detect, publish.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn on_frame<C, D, S>(
        &mut self,
        clock: &mut C,
        fired: FrameRequest,
        detector: &mut D,
        source: &mut S,
        slot: &mut RegionSlot,
    ) -> Option<PassOutcome>
    where
        C: FrameClock,
        D: RegionDetector + ?Sized,
        S: FrameSource + ?Sized,
    {
        let ticket = self.begin_pass(fired, source.is_live())?;
        let result = source
            .current_frame()
            .and_then(|frame| detector.detect_region(&frame, source.display_size()));
        Some(self.finish_pass(clock, ticket, result, slot))
    }
}

/// Single-shot detection on user request.
#[derive(Debug, Default)]
pub struct ManualDetection {
    in_progress: bool,
}

impl ManualDetection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Detect once; publish the region, or clear the slot when nothing is
    /// found.
    pub fn run<D, S>(
        &mut self,
        detector: &mut D,
        source: &mut S,
        slot: &mut RegionSlot,
    ) -> Option<Arc<DetectedRegion>>
    where
        D: RegionDetector + ?Sized,
        S: FrameSource + ?Sized,
    {
        self.in_progress = true;
        let result = source
            .current_frame()
            .and_then(|frame| detector.detect_region(&frame, source.display_size()));
        self.in_progress = false;
        match result {
            Some(region) => Some(slot.publish(region)),
            None => {
                log::info!("no board detected");
                slot.clear();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardscan_core::{DisplaySize, PixelRect, VideoFrame};
    use nalgebra::Point2;

    struct Feed {
        live: bool,
        frames: usize,
    }

    impl FrameSource for Feed {
        fn is_live(&self) -> bool {
            self.live
        }
        fn display_size(&self) -> DisplaySize {
            DisplaySize::new(4.0, 4.0)
        }
        fn current_frame(&mut self) -> Option<VideoFrame> {
            self.frames += 1;
            VideoFrame::from_gray(4, 4, &[0; 16]).ok()
        }
    }

    fn feed() -> Feed {
        Feed {
            live: true,
            frames: 0,
        }
    }

    fn region(confidence: f32) -> DetectedRegion {
        DetectedRegion {
            bounding_box: PixelRect::new(0.0, 0.0, 2.0, 2.0),
            polygon: vec![
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(2.0, 2.0),
                Point2::new(0.0, 2.0),
            ],
            confidence,
        }
    }

    fn always(confidence: f32) -> impl FnMut(&VideoFrame, DisplaySize) -> Option<DetectedRegion> {
        move |_: &VideoFrame, _: DisplaySize| Some(region(confidence))
    }

    fn never(_: &VideoFrame, _: DisplaySize) -> Option<DetectedRegion> {
        None
    }

    #[test]
    fn running_loop_keeps_exactly_one_pending_tick() {
        let mut clock = ManualClock::new();
        let mut sched = ContinuousDetection::new();
        let mut slot = RegionSlot::new();
        let mut det = always(0.9);
        let mut src = feed();

        sched.start(&mut clock, true, true).expect("start");
        sched.start(&mut clock, true, true).expect("restart is a no-op");
        assert_eq!(clock.pending(), 1);

        for _ in 0..3 {
            let fired = clock.fire().expect("tick");
            let outcome = sched.on_frame(&mut clock, fired, &mut det, &mut src, &mut slot);
            assert_eq!(outcome, Some(PassOutcome::Published));
            assert_eq!(clock.pending(), 1);
        }
        assert_eq!(src.frames, 3);
        assert_eq!(slot.latest().map(|r| r.confidence), Some(0.9));
    }

    #[test]
    fn nothing_found_keeps_previous_region() {
        let mut clock = ManualClock::new();
        let mut sched = ContinuousDetection::new();
        let mut slot = RegionSlot::new();
        slot.publish(region(0.7));
        let mut src = feed();

        sched.start(&mut clock, true, true).expect("start");
        let fired = clock.fire().expect("tick");
        let mut det = never;
        let outcome = sched.on_frame(&mut clock, fired, &mut det, &mut src, &mut slot);
        assert_eq!(outcome, Some(PassOutcome::NothingFound));
        assert_eq!(slot.latest().map(|r| r.confidence), Some(0.7));
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn double_stop_is_harmless() {
        let mut clock = ManualClock::new();
        let mut sched = ContinuousDetection::new();
        sched.stop(&mut clock);
        sched.start(&mut clock, true, true).expect("start");
        sched.stop(&mut clock);
        sched.stop(&mut clock);
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert_eq!(clock.pending(), 0);
        assert_eq!(sched.pending(), None);
    }

    #[test]
    fn in_flight_pass_at_stop_does_not_publish() {
        let mut clock = ManualClock::new();
        let mut sched = ContinuousDetection::new();
        let mut slot = RegionSlot::new();

        sched.start(&mut clock, true, true).expect("start");
        let fired = clock.fire().expect("tick");
        let ticket = sched.begin_pass(fired, true).expect("admitted");
        sched.stop(&mut clock);

        let outcome = sched.finish_pass(&mut clock, ticket, Some(region(1.0)), &mut slot);
        assert_eq!(outcome, PassOutcome::Discarded);
        assert!(slot.is_empty());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn pass_from_previous_run_is_discarded_after_restart() {
        let mut clock = ManualClock::new();
        let mut sched = ContinuousDetection::new();
        let mut slot = RegionSlot::new();

        sched.start(&mut clock, true, true).expect("start");
        let fired = clock.fire().expect("tick");
        let stale = sched.begin_pass(fired, true).expect("admitted");
        sched.stop(&mut clock);
        sched.start(&mut clock, true, true).expect("restart");

        assert_eq!(
            sched.finish_pass(&mut clock, stale, Some(region(1.0)), &mut slot),
            PassOutcome::Discarded
        );
        assert!(slot.is_empty());
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn cancelled_tick_that_fires_anyway_is_ignored() {
        let mut clock = ManualClock::new();
        let mut sched = ContinuousDetection::new();
        sched.start(&mut clock, true, true).expect("start");
        let req = sched.pending().expect("pending");
        sched.stop(&mut clock);
        assert!(sched.begin_pass(req, true).is_none());
    }

    #[test]
    fn inactive_feed_halts_the_loop() {
        let mut clock = ManualClock::new();
        let mut sched = ContinuousDetection::new();
        let mut slot = RegionSlot::new();
        let mut det = always(0.9);
        let mut src = feed();

        sched.start(&mut clock, true, true).expect("start");
        src.live = false;
        let fired = clock.fire().expect("tick");
        assert_eq!(sched.on_frame(&mut clock, fired, &mut det, &mut src, &mut slot), None);
        assert_eq!(src.frames, 0);
        assert_eq!(clock.pending(), 0);
        assert!(!sched.is_running());
    }

    #[test]
    fn start_requires_feed_and_detector() {
        let mut clock = ManualClock::new();
        let mut sched = ContinuousDetection::new();
        assert_eq!(
            sched.start(&mut clock, false, true),
            Err(SchedulerError::FeedInactive)
        );
        assert_eq!(
            sched.start(&mut clock, true, false),
            Err(SchedulerError::DetectorNotReady)
        );
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn manual_detection_publishes_or_clears() {
        let mut manual = ManualDetection::new();
        let mut slot = RegionSlot::new();
        let mut src = feed();

        let found = manual.run(&mut always(0.8), &mut src, &mut slot);
        assert_eq!(found.map(|r| r.confidence), Some(0.8));
        assert!(!manual.in_progress());
        assert!(!slot.is_empty());

        let mut det = never;
        assert!(manual.run(&mut det, &mut src, &mut slot).is_none());
        assert!(slot.is_empty());
    }

    #[test]
    fn paced_clock_spaces_out_frames() {
        assert!(PacedClock::new(0.0).is_err());
        assert!(PacedClock::new(f64::NAN).is_err());

        let mut clock = PacedClock::new(50.0).expect("clock");
        assert!(clock.wait_next().is_none());
        let a = clock.request_frame();
        assert_eq!(clock.wait_next(), Some(a));
        let started = Instant::now();
        let b = clock.request_frame();
        assert_eq!(clock.wait_next(), Some(b));
        assert!(started.elapsed() >= Duration::from_millis(10));

        let c = clock.request_frame();
        clock.cancel_frame(c);
        assert!(clock.wait_next().is_none());
    }
}
