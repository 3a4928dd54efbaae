//! Driving Ports (API - Inbound)

use async_trait::async_trait;
use shared_types::ipc::{KeystoneRequest, SignerRequest};
use shared_types::{SessionContext, Signature, SigningResult};

/// Signing through camera-scanned QR codes.
///
/// Each call resolves exactly once: with a signature, with
/// `SigningOutcome::Cancelled`, or with an error.
#[async_trait]
pub trait QrSigningApi: Send + Sync {
    /// Show `request` to the air-gapped Signer app and scan back its signature.
    async fn sign_with_signer(
        &self,
        ctx: &SessionContext,
        request: &SignerRequest,
    ) -> SigningResult<Signature>;

    /// Show `request` to a Keystone device and scan back its signature.
    async fn sign_with_keystone(
        &self,
        ctx: &SessionContext,
        request: &KeystoneRequest,
    ) -> SigningResult<Signature>;
}
