//! Camera stream lifecycle: acquire, release, switch, enumerate.

use crate::constraints::{CameraConfig, StreamConstraints};
use crate::device::{video_inputs, CameraDevice};
use crate::error::{CameraError, CameraErrorKind, ErrorDetails, PlatformError};
use crate::platform::{MediaBackend, MediaStream, VideoSink};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Owns at most one live stream and the state shown around it.
///
/// A stream is held exactly while the session is active. Starting while
/// active releases the old stream before a new acquisition is attempted, and
/// dropping the session releases whatever is still held.
pub struct CaptureSession<B: MediaBackend, V: VideoSink<B::Stream>> {
    backend: B,
    sink: V,
    config: CameraConfig,
    stream: Option<B::Stream>,
    loading: bool,
    error: Option<CameraErrorKind>,
    devices: Vec<CameraDevice>,
    selected_device: Option<String>,
}

impl<B, V> CaptureSession<B, V>
where
    B: MediaBackend,
    V: VideoSink<B::Stream>,
{
    pub fn new(backend: B, sink: V, config: CameraConfig) -> Self {
        Self {
            backend,
            sink,
            config,
            stream: None,
            loading: false,
            error: None,
            devices: Vec::new(),
            selected_device: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<CameraErrorKind> {
        self.error
    }

    /// User-facing text for the last failure.
    pub fn error_details(&self) -> Option<&'static ErrorDetails> {
        self.error.map(CameraErrorKind::details)
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn selected_device(&self) -> Option<&str> {
        self.selected_device.as_deref()
    }

    pub fn stream(&self) -> Option<&B::Stream> {
        self.stream.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sink(&self) -> &V {
        &self.sink
    }

    /// Acquire a stream, optionally pinned to `device_id`.
    ///
    /// The preferred constraints are tried first and the minimal set second;
    /// the error of the last attempt is the one classified.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn start(&mut self, device_id: Option<&str>) -> Result<(), CameraError> {
        if self.stream.is_some() {
            log::debug!("releasing active stream before starting a new one");
            self.stop();
        }
        self.loading = true;
        self.error = None;

        if !self.backend.has_media_devices() {
            log::error!("media devices unavailable; camera needs a secure context");
            return Err(self.fail(CameraError::insecure_context()));
        }

        let preferred = StreamConstraints::preferred(&self.config, device_id);
        let mut stream = match self.backend.open_stream(&preferred) {
            Ok(stream) => stream,
            Err(first) => {
                log::info!("preferred constraints failed ({first}), falling back to minimal");
                match self.backend.open_stream(&StreamConstraints::minimal(device_id)) {
                    Ok(stream) => stream,
                    Err(err) => return Err(self.fail_platform(err)),
                }
            }
        };

        // labels only become readable once permission has been granted
        self.enumerate();

        if let Err(err) = self.sink.attach(&stream) {
            stream.stop_all_tracks();
            return Err(self.fail_platform(err));
        }

        self.selected_device = stream.device_id().or_else(|| device_id.map(str::to_owned));
        log::info!(
            "camera started (device {})",
            self.selected_device.as_deref().unwrap_or("<default>")
        );
        self.stream = Some(stream);
        self.loading = false;
        Ok(())
    }

    /// Stop every track and detach from the display. Safe to call when idle.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_all_tracks();
            log::info!("camera stopped");
        }
        self.sink.detach();
    }

    pub fn switch_camera(&mut self, device_id: &str) -> Result<(), CameraError> {
        self.stop();
        self.start(Some(device_id))
    }

    /// Start over with default preferences after a failure.
    pub fn retry(&mut self) -> Result<(), CameraError> {
        self.stop();
        self.start(None)
    }

    /// Refresh the camera list. Failures are logged and yield an empty
    /// list without touching the stored one.
    pub fn enumerate(&mut self) -> Vec<CameraDevice> {
        match self.backend.enumerate_devices() {
            Ok(raw) => {
                self.devices = video_inputs(&raw);
                log::debug!("{} video input(s) found", self.devices.len());
                self.devices.clone()
            }
            Err(err) => {
                log::warn!("failed to enumerate devices: {err}");
                Vec::new()
            }
        }
    }

    fn fail_platform(&mut self, err: PlatformError) -> CameraError {
        self.fail(CameraError::from_platform(err))
    }

    fn fail(&mut self, err: CameraError) -> CameraError {
        log::error!("camera error: {err}");
        self.loading = false;
        self.error = Some(err.kind);
        err
    }
}

impl<B: MediaBackend, V: VideoSink<B::Stream>> Drop for CaptureSession<B, V> {
    fn drop(&mut self) {
        self.stop();
    }
}
