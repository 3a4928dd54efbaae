//! # Bus Messages
//!
//! The closed set of envelopes that flow through the correlation bus, one
//! variant per method. Payload types live in `shared-types/src/ipc.rs`.

use serde::{Deserialize, Serialize};
use shared_types::entities::CorrelationId;
use shared_types::ipc::{
    KeystoneRequest, LedgerRequest, ResponseError, ResponsePayload, SignerRequest,
};

/// All envelopes that can be emitted on the bus.
///
/// Request variants travel from the wallet towards an external signer;
/// `Response` travels back, addressed by the id of the request it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusMessage {
    // =========================================================================
    // REQUESTS
    // =========================================================================
    /// Ask the camera to read one QR value.
    /// Source: Scanner Session Manager | Target: camera/QR reader
    Scan { id: CorrelationId },

    /// Ask the air-gapped Signer app to sign.
    /// Source: wallet | Target: signing request handler
    Signer {
        id: CorrelationId,
        params: SignerRequest,
    },

    /// Ask a Keystone device to sign.
    /// Source: wallet | Target: signing request handler
    Keystone {
        id: CorrelationId,
        params: KeystoneRequest,
    },

    /// Ask a Ledger device to sign.
    /// Source: wallet | Target: signing request handler
    Ledger {
        id: CorrelationId,
        params: LedgerRequest,
    },

    // =========================================================================
    // RESPONSES
    // =========================================================================
    /// The single response to the request carrying the same `id`.
    Response {
        id: CorrelationId,
        params: Result<ResponsePayload, ResponseError>,
    },
}

impl BusMessage {
    /// Build a response envelope.
    #[must_use]
    pub fn response(id: CorrelationId, params: Result<ResponsePayload, ResponseError>) -> Self {
        Self::Response { id, params }
    }

    /// The method tag of this envelope (used for routing).
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::Scan { .. } => Method::Scan,
            Self::Signer { .. } => Method::Signer,
            Self::Keystone { .. } => Method::Keystone,
            Self::Ledger { .. } => Method::Ledger,
            Self::Response { .. } => Method::Response,
        }
    }

    /// The correlation id carried by this envelope.
    #[must_use]
    pub fn id(&self) -> CorrelationId {
        match self {
            Self::Scan { id }
            | Self::Signer { id, .. }
            | Self::Keystone { id, .. }
            | Self::Ledger { id, .. }
            | Self::Response { id, .. } => *id,
        }
    }
}

/// Routing key of a bus envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Scan,
    Signer,
    Keystone,
    Ledger,
    Response,
}

impl Method {
    /// Every method, in declaration order.
    pub const ALL: [Method; 5] = [
        Method::Scan,
        Method::Signer,
        Method::Keystone,
        Method::Ledger,
        Method::Response,
    ];

    /// Wire name of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Signer => "signer",
            Self::Keystone => "keystone",
            Self::Ledger => "ledger",
            Self::Response => "response",
        }
    }
}

/// Filter for async subscriptions.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Methods to include. Empty means all methods.
    pub methods: Vec<Method>,
    /// Only envelopes carrying this id. `None` means any id.
    pub correlation_id: Option<CorrelationId>,
}

impl EventFilter {
    /// Create a filter that accepts all envelopes.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific methods.
    #[must_use]
    pub fn methods(methods: Vec<Method>) -> Self {
        Self {
            methods,
            correlation_id: None,
        }
    }

    /// Create a filter for the single response addressed to `id`.
    #[must_use]
    pub fn response_to(id: CorrelationId) -> Self {
        Self {
            methods: vec![Method::Response],
            correlation_id: Some(id),
        }
    }

    /// Methods this filter needs handlers for.
    #[must_use]
    pub fn routed_methods(&self) -> Vec<Method> {
        if self.methods.is_empty() {
            Method::ALL.to_vec()
        } else {
            self.methods.clone()
        }
    }

    /// Check if an envelope matches this filter.
    #[must_use]
    pub fn matches(&self, message: &BusMessage) -> bool {
        let method_match = self.methods.is_empty() || self.methods.contains(&message.method());
        let id_match = self.correlation_id.map_or(true, |id| id == message.id());

        method_match && id_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanned(id: u64, value: &str) -> BusMessage {
        BusMessage::response(
            CorrelationId(id),
            Ok(ResponsePayload::Scanned(value.to_string())),
        )
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(BusMessage::Scan { id: CorrelationId(1) }.method(), Method::Scan);
        assert_eq!(scanned(1, "x").method(), Method::Response);
        assert_eq!(Method::Response.as_str(), "response");
    }

    #[test]
    fn test_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.matches(&scanned(5, "x")));
        assert_eq!(filter.routed_methods().len(), Method::ALL.len());
    }

    #[test]
    fn test_filter_response_to() {
        let filter = EventFilter::response_to(CorrelationId(1001));
        assert!(filter.matches(&scanned(1001, "a")));
        assert!(!filter.matches(&scanned(1002, "b")));
        assert!(!filter.matches(&BusMessage::Scan {
            id: CorrelationId(1001)
        }));
        assert_eq!(filter.routed_methods(), vec![Method::Response]);
    }
}
