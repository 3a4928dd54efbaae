//! # Keystone Envelope
//!
//! Requests travel as `UR:TON-SIGN-REQUEST` fountain frames; the device answers
//! with `UR:TON-SIGNATURE` frames. Both bodies are bincode-encoded.
//!
//! The signature echoes the request id; an answer to any other request is a
//! wrong code.

use super::preview;
use sc_01_fountain_qr::CodecError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::ipc::KeystoneRequest;
use shared_types::Signature;
use uuid::Uuid;

/// UR type of a signing request.
pub const KEYSTONE_REQUEST_TYPE: &str = "ton-sign-request";

/// UR type of a signature.
pub const KEYSTONE_SIGNATURE_TYPE: &str = "ton-signature";

/// Body of a `ton-signature` UR.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoneSignature {
    /// Id of the request this signature answers.
    pub request_id: Uuid,
    /// The signature.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

fn malformed(err: bincode::Error) -> CodecError {
    CodecError::Malformed(err.to_string())
}

/// Encode a request body.
pub fn encode_keystone_request(request: &KeystoneRequest) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(request).map_err(malformed)
}

/// Decode a request body.
pub fn decode_keystone_request(bytes: &[u8]) -> Result<KeystoneRequest, CodecError> {
    bincode::deserialize(bytes).map_err(malformed)
}

/// Encode a signature body.
pub fn encode_keystone_signature(signature: &KeystoneSignature) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(signature).map_err(malformed)
}

/// Decode a signature body and check it answers `request_id`.
///
/// # Errors
///
/// `ProtocolMismatch` when the body is not a signature or answers another
/// request.
pub fn decode_keystone_signature(bytes: &[u8], request_id: Uuid) -> Result<Signature, CodecError> {
    let decoded: KeystoneSignature =
        bincode::deserialize(bytes).map_err(|_| CodecError::ProtocolMismatch {
            expected: KEYSTONE_SIGNATURE_TYPE.to_string(),
            found: format!("{} undecodable bytes", bytes.len()),
        })?;

    if decoded.request_id != request_id {
        return Err(CodecError::ProtocolMismatch {
            expected: format!("signature for request {request_id}"),
            found: preview(&decoded.request_id.to_string()),
        });
    }
    Ok(decoded.signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ipc::KeystoneDataType;
    use shared_types::DerivationPath;

    fn request() -> KeystoneRequest {
        KeystoneRequest {
            request_id: Uuid::new_v4(),
            sign_data: vec![9; 300],
            data_type: KeystoneDataType::Transaction,
            derivation_path: DerivationPath::ton_account(0),
            address: "EQD...wallet".to_string(),
            origin: "Tonkeeper".to_string(),
        }
    }

    #[test]
    fn test_request_body() {
        let request = request();
        let bytes = encode_keystone_request(&request).unwrap();
        assert_eq!(decode_keystone_request(&bytes).unwrap(), request);
        assert!(decode_keystone_request(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_signature_must_answer_request() {
        let request_id = Uuid::new_v4();
        let bytes = encode_keystone_signature(&KeystoneSignature {
            request_id,
            signature: [5; 64],
        })
        .unwrap();

        assert_eq!(decode_keystone_signature(&bytes, request_id).unwrap(), [5; 64]);

        let err = decode_keystone_signature(&bytes, Uuid::new_v4()).unwrap_err();
        assert!(err.is_wrong_code());
    }

    #[test]
    fn test_garbage_is_wrong_code() {
        let err = decode_keystone_signature(&[0xff; 3], Uuid::new_v4()).unwrap_err();
        assert!(err.is_wrong_code());
    }
}
