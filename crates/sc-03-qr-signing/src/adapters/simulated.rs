//! # Simulated QR Signers
//!
//! Stand-ins for the Signer app and a Keystone device. Each one "looks at"
//! a [`RecordingSurface`], reassembles the request the wallet is showing,
//! produces a deterministic signature, and shows its answer to the wallet's
//! camera through a [`QrFeed`].
//!
//! Signatures are SHA-256 based placeholders; nothing here verifies them.

use crate::domain::{
    decode_keystone_request, encode_keystone_signature, parse_signer_link, KeystoneSignature,
    KEYSTONE_REQUEST_TYPE, KEYSTONE_SIGNATURE_TYPE, SIGNER_SCHEME,
};
use sc_01_fountain_qr::{CodecError, DecodeStatus, Decoder, FountainDecoder, FountainEncoder, RecordingSurface};
use sc_02_scanner_session::QrFeed;
use sha2::{Digest, Sha256};
use shared_types::ipc::{KeystoneRequest, SignerRequest};
use shared_types::{Signature, SigningError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Deterministic 64-byte placeholder signature over `message`.
#[must_use]
pub fn simulated_signature(secret: &[u8], message: &[u8]) -> Signature {
    let first = Sha256::new().chain_update(secret).chain_update(message).finalize();
    let second = Sha256::new().chain_update(message).chain_update(secret).finalize();

    let mut signature = [0u8; 64];
    signature[..32].copy_from_slice(&first);
    signature[32..].copy_from_slice(&second);
    signature
}

/// The frame on screen now, or the next one if the screen is blank.
async fn current_frame(frames: &mut watch::Receiver<Option<String>>) -> Result<String, SigningError> {
    if let Some(frame) = frames.borrow_and_update().clone() {
        return Ok(frame);
    }
    next_frame(frames).await
}

async fn next_frame(frames: &mut watch::Receiver<Option<String>>) -> Result<String, SigningError> {
    loop {
        frames
            .changed()
            .await
            .map_err(|_| SigningError::Unexpected("surface dropped".to_string()))?;
        if let Some(frame) = frames.borrow_and_update().clone() {
            return Ok(frame);
        }
    }
}

/// The air-gapped Signer app.
pub struct SimulatedSigner {
    surface: Arc<RecordingSurface>,
    feed: QrFeed,
    secret: Vec<u8>,
    settle: Duration,
}

impl SimulatedSigner {
    /// A Signer watching `surface` and answering through `feed`.
    ///
    /// `frame_interval` is the wallet's fixed-interval period; a frame that
    /// stays up for three periods is taken to be the whole request.
    pub fn new(surface: Arc<RecordingSurface>, feed: QrFeed, secret: &[u8], frame_interval: Duration) -> Self {
        Self {
            surface,
            feed,
            secret: secret.to_vec(),
            settle: frame_interval * 3,
        }
    }

    /// Read one request off the screen, sign it, and show the signature.
    ///
    /// The device may start looking mid-cycle; chunks are rotated back so the
    /// deep link comes first. Clear the surface between requests.
    pub async fn serve_once(&self) -> Result<SignerRequest, SigningError> {
        let mut frames = self.surface.watch_frames();
        let first = current_frame(&mut frames).await?;

        // Collect chunks until the cycle wraps back to the first one.
        let mut chunks = vec![first.clone()];
        loop {
            match tokio::time::timeout(self.settle, next_frame(&mut frames)).await {
                Ok(frame) => {
                    let frame = frame?;
                    if frame == first {
                        break;
                    }
                    chunks.push(frame);
                }
                // Static frame.
                Err(_) => break,
            }
        }

        if let Some(start) = chunks.iter().position(|c| c.starts_with(SIGNER_SCHEME)) {
            chunks.rotate_left(start);
        }

        let request = parse_signer_link(&chunks.concat()).map_err(SigningError::from)?;
        let signature = simulated_signature(&self.secret, &request.transaction.body);
        debug!(chunks = chunks.len(), "Simulated Signer signed a transaction");
        self.feed.show(hex::encode(signature));
        Ok(request)
    }
}

/// A Keystone hardware wallet.
pub struct SimulatedKeystone {
    surface: Arc<RecordingSurface>,
    feed: QrFeed,
    secret: Vec<u8>,
    fragment_len: usize,
}

impl SimulatedKeystone {
    /// A Keystone watching `surface` and answering through `feed`, splitting
    /// its answer into fragments of `fragment_len` bytes.
    pub fn new(surface: Arc<RecordingSurface>, feed: QrFeed, secret: &[u8], fragment_len: usize) -> Self {
        Self {
            surface,
            feed,
            secret: secret.to_vec(),
            fragment_len,
        }
    }

    /// Read one request off the screen, sign it, and show the answer parts in
    /// reverse order.
    pub async fn serve_once(&self) -> Result<KeystoneRequest, SigningError> {
        let mut frames = self.surface.watch_frames();
        let mut decoder = FountainDecoder::new(KEYSTONE_REQUEST_TYPE).map_err(SigningError::from)?;

        let mut frame = current_frame(&mut frames).await?;
        while decoder.receive(&frame).map_err(SigningError::from)? == DecodeStatus::NeedMore {
            frame = next_frame(&mut frames).await?;
        }

        let body = decoder
            .result()
            .ok_or_else(|| SigningError::Unexpected("decoder lost its result".to_string()))?;
        let request = decode_keystone_request(&body).map_err(SigningError::from)?;

        let answer = encode_keystone_signature(&KeystoneSignature {
            request_id: request.request_id,
            signature: simulated_signature(&self.secret, &request.sign_data),
        })
        .map_err(SigningError::from)?;

        for frame in answer_frames(&answer, self.fragment_len)?.into_iter().rev() {
            self.feed.show(frame);
        }
        debug!(request_id = %request.request_id, "Simulated Keystone signed a request");
        Ok(request)
    }
}

fn answer_frames(answer: &[u8], fragment_len: usize) -> Result<Vec<String>, SigningError> {
    let encoder = FountainEncoder::new(KEYSTONE_SIGNATURE_TYPE, answer, fragment_len)
        .map_err(SigningError::from)?;
    (1..=encoder.seq_len() as u32)
        .map(|seq| encoder.frame(seq))
        .collect::<Result<Vec<_>, CodecError>>()
        .map_err(SigningError::from)
}
