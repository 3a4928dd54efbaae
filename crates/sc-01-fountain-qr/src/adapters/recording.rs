//! In-memory presentation surface.
//!
//! Keeps every rendered frame and notice, and publishes the latest frame
//! through a watch channel so a simulated device can "look at the screen".

use crate::ports::{PresentationSurface, SigningNotice};
use parking_lot::Mutex;
use tokio::sync::watch;

/// Surface that records what it was asked to show.
pub struct RecordingSurface {
    frames: Mutex<Vec<String>>,
    notices: Mutex<Vec<SigningNotice>>,
    current: watch::Sender<Option<String>>,
}

impl RecordingSurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            frames: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
            current,
        }
    }

    /// Every frame rendered so far, oldest first.
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().clone()
    }

    /// Number of frames rendered so far.
    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    /// The frame currently on screen.
    pub fn current_frame(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    /// Watch the frame on screen.
    pub fn watch_frames(&self) -> watch::Receiver<Option<String>> {
        self.current.subscribe()
    }

    /// Every notice shown so far.
    pub fn notices(&self) -> Vec<SigningNotice> {
        self.notices.lock().clone()
    }

    /// Forget everything shown so far.
    pub fn clear(&self) {
        self.frames.lock().clear();
        self.notices.lock().clear();
        self.current.send_replace(None);
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationSurface for RecordingSurface {
    fn render_qr(&self, value: &str) {
        self.frames.lock().push(value.to_string());
        self.current.send_replace(Some(value.to_string()));
    }

    fn notify(&self, notice: SigningNotice) {
        tracing::debug!(?notice, "Surface notice");
        self.notices.lock().push(notice);
    }
}
