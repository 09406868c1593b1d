//! Capabilities the host platform provides to a capture session.

use crate::constraints::StreamConstraints;
use crate::device::MediaDeviceInfo;
use crate::error::PlatformError;

/// Source of camera streams.
pub trait MediaBackend {
    type Stream: MediaStream;

    /// `false` when the platform exposes no media-device API at all, as
    /// browsers do outside a secure context.
    fn has_media_devices(&self) -> bool {
        true
    }

    fn enumerate_devices(&mut self) -> Result<Vec<MediaDeviceInfo>, PlatformError>;

    fn open_stream(&mut self, constraints: &StreamConstraints)
        -> Result<Self::Stream, PlatformError>;
}

/// A live stream handle.
pub trait MediaStream {
    /// Device id reported by the first video track's settings, if any.
    fn device_id(&self) -> Option<String>;

    /// Stop every track. Must be idempotent.
    fn stop_all_tracks(&mut self);
}

/// The element a stream is shown in.
pub trait VideoSink<S> {
    /// Bind the stream and start playback.
    fn attach(&mut self, stream: &S) -> Result<(), PlatformError>;

    /// Unbind whatever is shown. Must be idempotent.
    fn detach(&mut self);
}

/// Sink for headless hosts that never render the feed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl<S> VideoSink<S> for NullSink {
    fn attach(&mut self, _stream: &S) -> Result<(), PlatformError> {
        Ok(())
    }

    fn detach(&mut self) {}
}
