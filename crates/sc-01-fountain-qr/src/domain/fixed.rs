//! # Fixed-Interval Cycling
//!
//! The payload is split into chunks of `fragment_size` characters which are
//! displayed one after another, wrapping back to the first chunk forever.
//! There is no error correction: the display keeps cycling until the external
//! scanner has caught every chunk.
//!
//! ```text
//! payload (600 chars), fragment_size 256
//!   ──→ [0..256) [256..512) [512..600)
//!   ──→ frame 0, 1, 2, 0, 1, 2, ...   (period = 3 × interval)
//! ```

use super::decoder::{DecodeStatus, Decoder};
use super::errors::CodecError;
use super::frame::{FrameSource, QrScheme};
use std::time::Duration;

/// Split `payload` into chunks of at most `fragment_size` characters.
///
/// The last chunk is shorter when the length is not a multiple of the size.
pub fn split_chunks(payload: &str, fragment_size: usize) -> Result<Vec<String>, CodecError> {
    if payload.is_empty() {
        return Err(CodecError::EmptyPayload);
    }
    if fragment_size == 0 {
        return Err(CodecError::InvalidFragmentSize(fragment_size));
    }

    let chars: Vec<char> = payload.chars().collect();
    Ok(chars
        .chunks(fragment_size)
        .map(|chunk| chunk.iter().collect())
        .collect())
}

/// Encoder cycling fixed-size chunks.
#[derive(Debug, Clone)]
pub struct FixedIntervalEncoder {
    chunks: Vec<String>,
    cursor: usize,
}

impl FixedIntervalEncoder {
    /// Split `payload` for display.
    ///
    /// # Errors
    ///
    /// `EmptyPayload` or `InvalidFragmentSize`.
    pub fn new(payload: &str, fragment_size: usize) -> Result<Self, CodecError> {
        Ok(Self {
            chunks: split_chunks(payload, fragment_size)?,
            cursor: 0,
        })
    }

    /// All chunks in emission order.
    #[must_use]
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Never true; empty payloads are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Frame shown at `tick` intervals after the start.
    #[must_use]
    pub fn frame_at(&self, tick: usize) -> &str {
        &self.chunks[tick % self.chunks.len()]
    }

    /// Time for one full cycle of all chunks.
    #[must_use]
    pub fn period(&self, interval: Duration) -> Duration {
        interval * self.chunks.len() as u32
    }
}

impl FrameSource for FixedIntervalEncoder {
    fn next_frame(&mut self) -> String {
        let frame = self.chunks[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.chunks.len();
        frame
    }

    fn is_static(&self) -> bool {
        self.chunks.len() == 1
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn scheme(&self) -> QrScheme {
        QrScheme::Fixed
    }
}

/// Order-dependent decoder: concatenates chunks in the order received until
/// the expected number of chunks has arrived.
#[derive(Debug, Clone)]
pub struct FixedIntervalDecoder {
    expected: usize,
    chunks: Vec<String>,
}

impl FixedIntervalDecoder {
    /// Expect `expected_chunks` chunks.
    ///
    /// # Errors
    ///
    /// `InvalidFragmentSize` when `expected_chunks` is zero.
    pub fn new(expected_chunks: usize) -> Result<Self, CodecError> {
        if expected_chunks == 0 {
            return Err(CodecError::InvalidFragmentSize(expected_chunks));
        }
        Ok(Self {
            expected: expected_chunks,
            chunks: Vec::with_capacity(expected_chunks),
        })
    }

    /// Decoder for a value that fits in one frame.
    #[must_use]
    pub fn single() -> Self {
        Self {
            expected: 1,
            chunks: Vec::with_capacity(1),
        }
    }

    /// Chunks received so far.
    #[must_use]
    pub fn received(&self) -> usize {
        self.chunks.len()
    }
}

impl Decoder for FixedIntervalDecoder {
    type Output = String;

    fn receive(&mut self, fragment: &str) -> Result<DecodeStatus, CodecError> {
        if self.is_complete() {
            return Ok(DecodeStatus::Complete);
        }
        if fragment.is_empty() {
            return Err(CodecError::Malformed("empty chunk".to_string()));
        }

        self.chunks.push(fragment.to_string());
        Ok(if self.is_complete() {
            DecodeStatus::Complete
        } else {
            DecodeStatus::NeedMore
        })
    }

    fn is_complete(&self) -> bool {
        self.chunks.len() >= self.expected
    }

    fn result(&self) -> Option<String> {
        self.is_complete().then(|| self.chunks.concat())
    }

    fn progress(&self) -> f64 {
        self.chunks.len() as f64 / self.expected as f64
    }
}
