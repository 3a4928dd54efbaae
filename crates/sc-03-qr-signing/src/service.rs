//! # QR Signing Service
//!
//! Runs one signing request over QR codes:
//!
//! 1. Encode the protocol envelope and animate it on the presentation surface.
//! 2. Scan; feed each value to the response decoder.
//!    - `NeedMore`: scan again.
//!    - wrong code: notify the operator and scan again.
//!    - `Complete`: decode the signature and return.
//! 3. A failed scan resolves the request with an error; a cancelled scan
//!    resolves it as `Cancelled`.
//!
//! The animation stops before the call returns, whatever the outcome.

use crate::domain::{
    decode_keystone_signature, encode_keystone_request, parse_signer_signature, signer_link,
    KEYSTONE_REQUEST_TYPE, KEYSTONE_SIGNATURE_TYPE,
};
use crate::ports::QrSigningApi;
use async_trait::async_trait;
use sc_01_fountain_qr::{
    CodecConfig, CodecError, DecodeStatus, Decoder, FixedIntervalDecoder, FixedIntervalEncoder,
    FountainDecoder, FountainEncoder, FrameSource, QrAnimator, QrPresenter, SigningNotice,
};
use sc_02_scanner_session::{ScanError, ScannerSessionManager};
use shared_types::ipc::{KeystoneRequest, SignerRequest};
use shared_types::{
    DeviceKind, SessionContext, Signature, SigningError, SigningOutcome, SigningResult,
};
use signing_telemetry::{log_session_event, record_outcome};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Consecutive parts of another transfer after which the decoder starts over.
const STALE_TRANSFER_LIMIT: usize = 3;

/// QR signing for the Signer app and Keystone devices.
pub struct QrSigningService {
    scanner: ScannerSessionManager,
    animator: QrAnimator,
    config: CodecConfig,
}

impl QrSigningService {
    /// Create the service.
    pub fn new(scanner: ScannerSessionManager, animator: QrAnimator, config: CodecConfig) -> Self {
        Self {
            scanner,
            animator,
            config,
        }
    }

    /// Codec settings in use.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn notify(&self, notice: SigningNotice) {
        self.animator.surface().notify(notice);
    }

    async fn run<D, T>(
        &self,
        ctx: &SessionContext,
        device: DeviceKind,
        source: Box<dyn FrameSource>,
        interval: Duration,
        new_decoder: impl Fn() -> Result<D, CodecError> + Send + Sync,
        finish: impl Fn(D::Output) -> Result<T, CodecError> + Send + Sync,
    ) -> SigningResult<T>
    where
        D: Decoder + Send,
        D::Output: Send,
        T: Send,
    {
        log_session_event!(info, device.as_str(), ctx.correlation_id(), "Showing signing request");

        let animation = self.animator.present(source, interval, ctx.cancel_token());
        let result = self.collect(ctx, new_decoder, finish).await;
        let frames = animation.stop().await;

        let label = match &result {
            Ok(SigningOutcome::Completed(_)) => {
                self.notify(SigningNotice::Completed);
                log_session_event!(info, device.as_str(), ctx.correlation_id(), "Signature received", frames = frames);
                "completed"
            }
            Ok(SigningOutcome::Cancelled) => {
                self.notify(SigningNotice::Cancelled);
                log_session_event!(info, device.as_str(), ctx.correlation_id(), "Signing cancelled");
                "cancelled"
            }
            Err(e) => {
                log_session_event!(warn, device.as_str(), ctx.correlation_id(), "Signing failed", error = %e);
                e.kind()
            }
        };
        record_outcome(device.as_str(), label);
        result
    }

    async fn collect<D, T>(
        &self,
        ctx: &SessionContext,
        new_decoder: impl Fn() -> Result<D, CodecError>,
        finish: impl Fn(D::Output) -> Result<T, CodecError>,
    ) -> SigningResult<T>
    where
        D: Decoder,
    {
        let mut decoder = new_decoder().map_err(SigningError::from)?;
        let mut inconsistent = 0usize;

        loop {
            let value = match self.scanner.scan_next(ctx).await {
                Ok(value) => value,
                Err(ScanError::Cancelled) => return Ok(SigningOutcome::Cancelled),
                Err(e) => return Err(e.into()),
            };

            let received = decoder.receive(&value);
            if matches!(received, Err(CodecError::InconsistentPart(_))) {
                inconsistent += 1;
            } else if received.is_ok() {
                inconsistent = 0;
            }

            match received {
                Ok(DecodeStatus::NeedMore) => self.notify(SigningNotice::ScanProgress {
                    fraction: decoder.progress(),
                }),
                Ok(DecodeStatus::Complete) => {
                    let Some(output) = decoder.result() else {
                        error!(correlation_id = %ctx.correlation_id(), "Decoder complete without a result");
                        return Err(SigningError::Unexpected("decoder lost its result".to_string()));
                    };
                    match finish(output) {
                        Ok(signature) => return Ok(SigningOutcome::Completed(signature)),
                        Err(e) => {
                            self.wrong_code(ctx, &e);
                            decoder = new_decoder().map_err(SigningError::from)?;
                        }
                    }
                }
                Err(e) => {
                    self.wrong_code(ctx, &e);
                    // The first multi-part frame fixed the transfer; if it was
                    // left over from an earlier request, start over.
                    if inconsistent >= STALE_TRANSFER_LIMIT {
                        debug!(correlation_id = %ctx.correlation_id(), "Dropping partial transfer");
                        decoder = new_decoder().map_err(SigningError::from)?;
                        inconsistent = 0;
                    }
                }
            }
        }
    }

    fn wrong_code(&self, ctx: &SessionContext, err: &CodecError) {
        warn!(correlation_id = %ctx.correlation_id(), error = %err, "Scanned the wrong code");
        self.notify(SigningNotice::WrongCode {
            reason: err.to_string(),
        });
    }
}

#[async_trait]
impl QrSigningApi for QrSigningService {
    async fn sign_with_signer(
        &self,
        ctx: &SessionContext,
        request: &SignerRequest,
    ) -> SigningResult<Signature> {
        let link = signer_link(request);
        let encoder = FixedIntervalEncoder::new(&link, self.config.fragment_size)
            .map_err(SigningError::from)?;

        self.run(
            ctx,
            DeviceKind::Signer,
            Box::new(encoder),
            self.config.fixed_interval(),
            || Ok(FixedIntervalDecoder::single()),
            |value: String| parse_signer_signature(&value),
        )
        .await
    }

    async fn sign_with_keystone(
        &self,
        ctx: &SessionContext,
        request: &KeystoneRequest,
    ) -> SigningResult<Signature> {
        let body = encode_keystone_request(request).map_err(SigningError::from)?;
        let encoder = FountainEncoder::new(KEYSTONE_REQUEST_TYPE, &body, self.config.fountain_fragment_len)
            .map_err(SigningError::from)?;
        let request_id = request.request_id;

        self.run(
            ctx,
            DeviceKind::Keystone,
            Box::new(encoder),
            self.config.fountain_interval(),
            || FountainDecoder::with_max_message_len(KEYSTONE_SIGNATURE_TYPE, self.config.max_message_len),
            move |bytes: Vec<u8>| decode_keystone_signature(&bytes, request_id),
        )
        .await
    }
}
