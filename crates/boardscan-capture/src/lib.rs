//! Live-feed plumbing for boardscan: camera stream lifecycle, still capture
//! and detection scheduling.
//!
//! Everything platform-specific sits behind small traits
//! ([`MediaBackend`], [`MediaStream`], [`VideoSink`], [`FrameSource`],
//! [`StillEncoder`], [`FrameClock`]) so the same state machines run in a
//! browser host, a native camera host or a file-driven test harness.

mod constraints;
mod device;
mod error;
mod platform;
mod scheduler;
mod session;
mod surface;

pub use constraints::{CameraConfig, FacingMode, StreamConstraints};
pub use device::{video_inputs, CameraDevice, DeviceKind, MediaDeviceInfo};
pub use error::{CameraError, CameraErrorKind, ErrorDetails, PlatformError};
pub use platform::{MediaBackend, MediaStream, NullSink, VideoSink};
pub use scheduler::{
    ContinuousDetection, FrameClock, FrameRequest, ManualClock, ManualDetection, PacedClock,
    PassOutcome, PassTicket, RegionSlot, SchedulerError, SchedulerState,
};
pub use session::CaptureSession;
pub use surface::{
    CaptureConfig, CaptureSurface, EncodeError, EncodedStill, FrameSource, JpegStillEncoder,
    StillEncoder,
};
