//! Driving Ports (API - Inbound)

use crate::domain::FrameSource;
use crate::service::AnimationHandle;
use shared_types::CancelToken;
use std::time::Duration;

/// Puts an encoded payload on screen until stopped.
pub trait QrPresenter: Send + Sync {
    /// Start animating `source`, one frame per `interval`.
    ///
    /// The animation stops when the returned handle is stopped or dropped, or
    /// when `cancel` fires.
    fn present(
        &self,
        source: Box<dyn FrameSource>,
        interval: Duration,
        cancel: &CancelToken,
    ) -> AnimationHandle;
}
