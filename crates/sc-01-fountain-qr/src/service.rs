//! # QR Animation Service
//!
//! Drives a [`FrameSource`] onto a [`PresentationSurface`] at a fixed
//! interval. A static source is rendered once; a rotating source keeps
//! advancing until the animation is stopped or its request is cancelled.

use crate::domain::FrameSource;
use crate::ports::{PresentationSurface, QrPresenter};
use shared_types::CancelToken;
use signing_telemetry::QR_FRAMES_RENDERED;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Renders frame sources to a presentation surface.
#[derive(Clone)]
pub struct QrAnimator {
    surface: Arc<dyn PresentationSurface>,
}

impl QrAnimator {
    /// Animator targeting `surface`.
    pub fn new(surface: Arc<dyn PresentationSurface>) -> Self {
        Self { surface }
    }

    /// The surface frames are rendered to.
    pub fn surface(&self) -> &Arc<dyn PresentationSurface> {
        &self.surface
    }

    /// Render `source` until `cancel` fires. Returns the number of frames rendered.
    ///
    /// Missed ticks are skipped rather than bursted, so a slow surface never
    /// sees frames queued up behind each other.
    pub async fn animate(
        &self,
        source: Box<dyn FrameSource>,
        interval: Duration,
        cancel: &CancelToken,
    ) -> usize {
        run_animation(Arc::clone(&self.surface), source, interval, cancel, None).await
    }
}

async fn run_animation(
    surface: Arc<dyn PresentationSurface>,
    mut source: Box<dyn FrameSource>,
    interval: Duration,
    cancel: &CancelToken,
    stop: Option<&CancelToken>,
) -> usize {
    let stopped = || cancel.is_cancelled() || stop.is_some_and(CancelToken::is_cancelled);
    if stopped() {
        return 0;
    }

    let label = source.scheme().as_str();
    if source.is_static() {
        surface.render_qr(&source.next_frame());
        QR_FRAMES_RENDERED.with_label_values(&[label]).inc();
        debug!(scheme = label, "Rendered static QR frame");
        return 1;
    }

    if interval.is_zero() {
        warn!(scheme = label, "Zero frame interval, rendering first frame only");
        surface.render_qr(&source.next_frame());
        QR_FRAMES_RENDERED.with_label_values(&[label]).inc();
        return 1;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let stop_signal = async {
        match stop {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(stop_signal);

    let mut rendered = 0usize;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = &mut stop_signal => break,
            _ = ticker.tick() => {
                surface.render_qr(&source.next_frame());
                QR_FRAMES_RENDERED.with_label_values(&[label]).inc();
                rendered += 1;
            }
        }
    }

    debug!(scheme = label, frames = rendered, "QR animation stopped");
    rendered
}

impl QrPresenter for QrAnimator {
    fn present(
        &self,
        source: Box<dyn FrameSource>,
        interval: Duration,
        cancel: &CancelToken,
    ) -> AnimationHandle {
        let stop = CancelToken::new();
        let surface = Arc::clone(&self.surface);
        let cancel = cancel.clone();
        let task_stop = stop.clone();

        let task = tokio::spawn(async move {
            run_animation(surface, source, interval, &cancel, Some(&task_stop)).await
        });

        AnimationHandle {
            stop,
            task: Some(task),
        }
    }
}

/// A running animation. Dropping the handle stops it.
pub struct AnimationHandle {
    stop: CancelToken,
    task: Option<JoinHandle<usize>>,
}

impl AnimationHandle {
    /// Stop the animation and wait for the frame loop to exit.
    ///
    /// Returns the number of frames rendered.
    pub async fn stop(mut self) -> usize {
        self.stop.cancel();
        match self.task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => 0,
        }
    }

    /// Returns true once the frame loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
