//! Ports for the QR codec.
//!
//! - `inbound`: the animation API the signing protocols drive
//! - `outbound`: the presentation surface frames are rendered to

pub mod inbound;
pub mod outbound;

pub use inbound::QrPresenter;
pub use outbound::{PresentationSurface, SigningNotice};
