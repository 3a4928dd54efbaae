//! Protocol envelopes for QR-based signers.

pub mod keystone;
pub mod signer;

pub use keystone::{
    decode_keystone_request, decode_keystone_signature, encode_keystone_request,
    encode_keystone_signature, KeystoneSignature, KEYSTONE_REQUEST_TYPE, KEYSTONE_SIGNATURE_TYPE,
};
pub use signer::{parse_signer_link, parse_signer_signature, signer_link, SIGNER_SCHEME};

/// Shorten a scanned value for error messages.
pub(crate) fn preview(value: &str) -> String {
    const MAX: usize = 24;
    if value.chars().count() <= MAX {
        value.to_string()
    } else {
        let head: String = value.chars().take(MAX).collect();
        format!("{head}...")
    }
}
