//! Domain layer for the QR codec.

pub mod decoder;
pub mod errors;
pub mod fixed;
pub mod fountain;
pub mod frame;
pub mod random;

pub use decoder::{DecodeStatus, Decoder};
pub use errors::CodecError;
pub use fixed::{split_chunks, FixedIntervalDecoder, FixedIntervalEncoder};
pub use fountain::{
    FountainDecoder, FountainEncoder, FountainPart, DEFAULT_MAX_MESSAGE_LEN, UR_SCHEME,
};
pub use frame::{FrameSource, QrScheme};
