//! # Signer Envelope
//!
//! The air-gapped Signer app reads a deep link shown with the fixed-interval
//! scheme and answers with a single QR holding the hex signature.
//!
//! ```text
//! tonsign://sign?v=<version>&network=<ton|testnet>&pk=<HEX(32)>&body=<HEX(tx)>
//! ```

use super::preview;
use sc_01_fountain_qr::CodecError;
use shared_types::ipc::{Network, SignerRequest};
use shared_types::{PublicKey, Signature, Transaction};

/// Deep-link scheme understood by the Signer app.
pub const SIGNER_SCHEME: &str = "tonsign";

const SIGNER_ACTION: &str = "sign";

/// Build the deep link for `request`.
#[must_use]
pub fn signer_link(request: &SignerRequest) -> String {
    format!(
        "{SIGNER_SCHEME}://{SIGNER_ACTION}?v={}&network={}&pk={}&body={}",
        request.version,
        request.network.as_str(),
        hex::encode(request.public_key),
        hex::encode(&request.transaction.body)
    )
}

/// Parse a deep link produced by [`signer_link`].
///
/// # Errors
///
/// `ProtocolMismatch` if the value is not a Signer link, `Malformed` if a
/// field is missing or invalid.
pub fn parse_signer_link(value: &str) -> Result<SignerRequest, CodecError> {
    let prefix = format!("{SIGNER_SCHEME}://{SIGNER_ACTION}?");
    let query = value
        .trim()
        .strip_prefix(prefix.as_str())
        .ok_or_else(|| CodecError::ProtocolMismatch {
            expected: format!("{SIGNER_SCHEME} link"),
            found: preview(value),
        })?;

    let mut version = None;
    let mut network = None;
    let mut public_key = None;
    let mut body = None;
    for pair in query.split('&') {
        let (key, field) = pair
            .split_once('=')
            .ok_or_else(|| CodecError::Malformed(format!("bad query pair '{pair}'")))?;
        match key {
            "v" => version = Some(field.to_string()),
            "network" => {
                network = Some(match field {
                    "ton" => Network::Mainnet,
                    "testnet" => Network::Testnet,
                    other => return Err(CodecError::Malformed(format!("unknown network '{other}'"))),
                });
            }
            "pk" => {
                let bytes = hex::decode(field).map_err(|e| CodecError::Malformed(e.to_string()))?;
                let key: PublicKey = bytes
                    .try_into()
                    .map_err(|_| CodecError::Malformed("public key must be 32 bytes".to_string()))?;
                public_key = Some(key);
            }
            "body" => {
                body = Some(hex::decode(field).map_err(|e| CodecError::Malformed(e.to_string()))?);
            }
            _ => {}
        }
    }

    let missing = |name: &str| CodecError::Malformed(format!("missing '{name}'"));
    Ok(SignerRequest {
        transaction: Transaction::new(body.ok_or_else(|| missing("body"))?),
        public_key: public_key.ok_or_else(|| missing("pk"))?,
        version: version.ok_or_else(|| missing("v"))?,
        network: network.ok_or_else(|| missing("network"))?,
    })
}

/// Parse the Signer's answer: 64 bytes as hex.
///
/// # Errors
///
/// `ProtocolMismatch` for anything else, so the operator can scan again.
pub fn parse_signer_signature(value: &str) -> Result<Signature, CodecError> {
    let mismatch = || CodecError::ProtocolMismatch {
        expected: "64-byte hex signature".to_string(),
        found: preview(value),
    };
    let bytes = hex::decode(value.trim()).map_err(|_| mismatch())?;
    bytes.try_into().map_err(|_| mismatch())
}
