//! # Fountain QR Codec
//!
//! Turns arbitrary payloads into size-bounded rotating QR frames and back.
//!
//! ## Schemes
//!
//! | Scheme | Encoder | Decoder | Ordering |
//! |--------|---------|---------|----------|
//! | Fixed-interval | [`FixedIntervalEncoder`] | [`FixedIntervalDecoder`] | chunks cycled in order |
//! | Fountain (UR) | [`FountainEncoder`] | [`FountainDecoder`] | any order, duplicates ok |
//!
//! A payload that fits in one fragment degenerates to a single static frame in
//! both schemes.
//!
//! ## Animation
//!
//! ```text
//! FrameSource ──next_frame()──→ QrAnimator ──render_qr()──→ PresentationSurface
//!                                   ↑
//!                           CancelToken / AnimationHandle
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::RecordingSurface;
pub use config::CodecConfig;
pub use domain::{
    CodecError, DecodeStatus, Decoder, DEFAULT_MAX_MESSAGE_LEN, FixedIntervalDecoder, FixedIntervalEncoder,
    FountainDecoder, FountainEncoder, FountainPart, FrameSource, QrScheme,
};
pub use ports::{PresentationSurface, QrPresenter, SigningNotice};
pub use service::{AnimationHandle, QrAnimator};
