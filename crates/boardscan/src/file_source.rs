//! A [`FrameSource`] backed by still images, for headless hosts and tests.

use boardscan_capture::FrameSource;
use boardscan_core::{DisplaySize, VideoFrame};
use std::path::Path;

use crate::scan::{load_frame, ScanError};

/// Loops over a fixed list of frames, one per [`FrameSource::current_frame`]
/// call.
///
/// The display size is fixed at construction unless set explicitly; it
/// defaults to the native size of the first frame.
#[derive(Clone, Debug)]
pub struct ImageFileSource {
    frames: Vec<VideoFrame>,
    next: usize,
    display: DisplaySize,
    live: bool,
}

impl ImageFileSource {
    pub fn from_frames(frames: Vec<VideoFrame>) -> Self {
        let display = frames
            .first()
            .map(|f| DisplaySize::new(f.width() as f32, f.height() as f32))
            .unwrap_or(DisplaySize::new(0.0, 0.0));
        Self {
            frames,
            next: 0,
            display,
            live: true,
        }
    }

    /// Decode every file up front. Fails on the first unreadable file.
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ScanError> {
        let frames = paths
            .iter()
            .map(|p| {
                log::debug!("loading frame {}", p.as_ref().display());
                load_frame(p)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_frames(frames))
    }

    pub fn with_display(mut self, display: DisplaySize) -> Self {
        self.display = display;
        self
    }

    pub fn set_display(&mut self, display: DisplaySize) {
        self.display = display;
    }

    /// Simulate the feed going away (or coming back).
    pub fn set_live(&mut self, live: bool) {
        self.live = live;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageFileSource {
    fn is_live(&self) -> bool {
        self.live && !self.frames.is_empty()
    }

    fn display_size(&self) -> DisplaySize {
        self.display
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        if !self.is_live() {
            return None;
        }
        let frame = self.frames.get(self.next % self.frames.len()).cloned();
        self.next = (self.next + 1) % self.frames.len();
        frame
    }
}
