//! Error types for near-session.
//!
//! # Error Hierarchy
//!
//! - [`TransportError`] - what can go wrong while a single JSON-RPC call is
//!   on the wire (connection, HTTP status, timeout, body decoding, RPC error
//!   envelope). Only a [`Transport`](crate::client::Transport) produces it.
//! - [`NearError`] - the fixed vocabulary the rest of the crate speaks.
//!   Every transport failure is classified into one of its variants at the
//!   [`NearRpc`](crate::client::NearRpc) boundary, so callers never see a raw
//!   transport error.
//!
//! # Classification
//!
//! ```rust
//! use near_session::{NearError, TransportError};
//!
//! let err = NearError::from(TransportError::Rpc {
//!     code: -32000,
//!     message: "Server error: UNKNOWN_ACCOUNT".to_string(),
//!     data: None,
//! });
//! assert_eq!(err.to_string(), "RPC Error (-32000): Server error: UNKNOWN_ACCOUNT");
//!
//! // Failures with nothing but a message fall back to text matching.
//! let err = NearError::classify_message("connect timeout", None);
//! assert_eq!(err.to_string(), "Network Error: Request timeout");
//! ```

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Shared, cloneable handle to the error that caused a [`NearError`].
pub type ErrorCause = Arc<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Transport Errors
// ============================================================================

/// Failures raised while executing one JSON-RPC call.
#[derive(Debug, Error)]
pub enum TransportError {
    // ─── Network/Transport ───
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    // ─── Body decoding ───
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ─── Protocol envelope ───
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Failure reported by a custom transport with no better structure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create an unstructured transport error.
    pub fn other(message: impl Into<String>) -> Self {
        TransportError::Other(message.into())
    }
}

// ============================================================================
// Near Errors
// ============================================================================

/// Typed error vocabulary exposed to callers and observers.
///
/// The `Display` output is the string a UI should render verbatim.
/// `AuthError` and `TransactionError` have no producer inside this crate;
/// they are available for wallet-auth and transaction-submission callers.
#[derive(Debug, Clone, Error)]
pub enum NearError {
    #[error("Network Error: {message}")]
    Network {
        message: String,
        #[source]
        cause: Option<ErrorCause>,
    },

    #[error("RPC Error ({code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Parse Error: {message}")]
    Parse { message: String },

    #[error("Authentication Error: {message}")]
    Auth { message: String },

    #[error("Transaction Error: {message}{}", .details.as_deref().map(|d| format!(" - {d}")).unwrap_or_default())]
    Transaction {
        message: String,
        details: Option<String>,
    },

    #[error("Unknown Error: {message}")]
    Unknown {
        message: String,
        #[source]
        cause: Option<ErrorCause>,
    },
}

impl NearError {
    /// Create a network error without an underlying cause.
    pub fn network(message: impl Into<String>) -> Self {
        NearError::Network {
            message: message.into(),
            cause: None,
        }
    }

    /// Create an RPC error.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        NearError::Rpc {
            code,
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        NearError::Parse {
            message: message.into(),
        }
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        NearError::Auth {
            message: message.into(),
        }
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>, details: Option<String>) -> Self {
        NearError::Transaction {
            message: message.into(),
            details,
        }
    }

    /// Create an unknown error without an underlying cause.
    pub fn unknown(message: impl Into<String>) -> Self {
        NearError::Unknown {
            message: message.into(),
            cause: None,
        }
    }

    /// Classify a failure from its message text alone.
    ///
    /// Case-insensitive substring match, first match wins:
    /// `network`, then `timeout`, then `json-rpc`, else unknown.
    /// Used when a failure carries no structure to classify on.
    pub fn classify_message(text: &str, cause: Option<ErrorCause>) -> Self {
        let lower = text.to_lowercase();

        if lower.contains("network") {
            NearError::Network {
                message: "Network connection failed".to_string(),
                cause,
            }
        } else if lower.contains("timeout") {
            NearError::Network {
                message: "Request timeout".to_string(),
                cause,
            }
        } else if lower.contains("json-rpc") {
            NearError::rpc(-1, text)
        } else {
            let message = if text.is_empty() {
                "Unknown error occurred".to_string()
            } else {
                text.to_string()
            };
            NearError::Unknown { message, cause }
        }
    }

    /// The message carried by this error, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            NearError::Network { message, .. }
            | NearError::Rpc { message, .. }
            | NearError::Parse { message }
            | NearError::Auth { message }
            | NearError::Transaction { message, .. }
            | NearError::Unknown { message, .. } => message,
        }
    }

    /// Returns true if this is a network-level failure (including timeouts).
    pub fn is_network(&self) -> bool {
        matches!(self, NearError::Network { .. })
    }

    /// Returns true if this error was produced by input validation or
    /// response decoding.
    pub fn is_parse(&self) -> bool {
        matches!(self, NearError::Parse { .. })
    }
}

/// Structural classification of a transport failure.
impl From<TransportError> for NearError {
    fn from(err: TransportError) -> Self {
        match &err {
            TransportError::Rpc { code, message, .. } => {
                return NearError::rpc(*code, message.clone());
            }
            TransportError::Json(_) | TransportError::InvalidResponse(_) => {
                return NearError::parse(err.to_string());
            }
            _ => {}
        }

        let network_message = match &err {
            TransportError::Timeout(_) => Some("Request timeout".to_string()),
            TransportError::Http(e) if e.is_timeout() => Some("Request timeout".to_string()),
            TransportError::Http(e) if e.is_connect() || e.is_request() => {
                Some("Network connection failed".to_string())
            }
            TransportError::Status { status, body } => Some(format!("HTTP {status}: {body}")),
            _ => None,
        };

        let text = err.to_string();
        let cause: ErrorCause = Arc::new(err);
        match network_message {
            Some(message) => NearError::Network {
                message,
                cause: Some(cause),
            },
            None => NearError::classify_message(&text, Some(cause)),
        }
    }
}

/// Equality compares kind and fields; causes are ignored.
impl PartialEq for NearError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NearError::Network { message: a, .. }, NearError::Network { message: b, .. }) => a == b,
            (
                NearError::Rpc {
                    code: ca,
                    message: ma,
                },
                NearError::Rpc {
                    code: cb,
                    message: mb,
                },
            ) => ca == cb && ma == mb,
            (NearError::Parse { message: a }, NearError::Parse { message: b }) => a == b,
            (NearError::Auth { message: a }, NearError::Auth { message: b }) => a == b,
            (
                NearError::Transaction {
                    message: ma,
                    details: da,
                },
                NearError::Transaction {
                    message: mb,
                    details: db,
                },
            ) => ma == mb && da == db,
            (NearError::Unknown { message: a, .. }, NearError::Unknown { message: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for NearError {}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    // ========================================================================
    // Display tests
    // ========================================================================

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            NearError::network("down").to_string(),
            "Network Error: down"
        );
        assert_eq!(
            NearError::rpc(-32000, "Server error").to_string(),
            "RPC Error (-32000): Server error"
        );
        assert_eq!(NearError::parse("bad").to_string(), "Parse Error: bad");
        assert_eq!(
            NearError::auth("denied").to_string(),
            "Authentication Error: denied"
        );
        assert_eq!(
            NearError::unknown("???").to_string(),
            "Unknown Error: ???"
        );
    }

    #[test]
    fn test_display_transaction_details() {
        assert_eq!(
            NearError::transaction("rejected", None).to_string(),
            "Transaction Error: rejected"
        );
        assert_eq!(
            NearError::transaction("rejected", Some("nonce too low".to_string())).to_string(),
            "Transaction Error: rejected - nonce too low"
        );
    }

    // ========================================================================
    // classify_message tests
    // ========================================================================

    #[test]
    fn test_classify_message_network() {
        let err = NearError::classify_message("Unable to reach NETWORK host", None);
        assert_eq!(err, NearError::network("Network connection failed"));
    }

    #[test]
    fn test_classify_message_timeout() {
        let err = NearError::classify_message("socket Timeout while reading", None);
        assert_eq!(err, NearError::network("Request timeout"));
    }

    #[test]
    fn test_classify_message_network_wins_over_timeout() {
        let err = NearError::classify_message("network timeout", None);
        assert_eq!(err.message(), "Network connection failed");
    }

    #[test]
    fn test_classify_message_json_rpc() {
        let err = NearError::classify_message("JSON-RPC error: method not found", None);
        assert_eq!(err, NearError::rpc(-1, "JSON-RPC error: method not found"));

        let err = NearError::classify_message("json-rpc envelope", None);
        assert!(matches!(err, NearError::Rpc { code: -1, .. }));
    }

    #[test]
    fn test_classify_message_unknown() {
        let err = NearError::classify_message("something odd", None);
        assert_eq!(err, NearError::unknown("something odd"));

        let err = NearError::classify_message("", None);
        assert_eq!(err, NearError::unknown("Unknown error occurred"));
    }

    #[test]
    fn test_classify_message_keeps_cause() {
        let cause: ErrorCause = Arc::new(TransportError::other("network unreachable"));
        let err = NearError::classify_message("network unreachable", Some(cause));
        let source = err.source().expect("cause should be exposed as source");
        assert_eq!(source.to_string(), "network unreachable");
    }

    // ========================================================================
    // Structural classification tests
    // ========================================================================

    #[test]
    fn test_classify_timeout() {
        let err = NearError::from(TransportError::Timeout(Duration::from_secs(30)));
        assert_eq!(err, NearError::network("Request timeout"));
        assert!(err.is_network());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_classify_status() {
        let err = NearError::from(TransportError::Status {
            status: 503,
            body: "Service Unavailable".to_string(),
        });
        assert_eq!(err, NearError::network("HTTP 503: Service Unavailable"));
    }

    #[test]
    fn test_classify_rpc_envelope_keeps_code() {
        let err = NearError::from(TransportError::Rpc {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        });
        assert_eq!(err, NearError::rpc(-32601, "Method not found"));
    }

    #[test]
    fn test_classify_malformed_body() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = NearError::from(TransportError::Json(json_err));
        assert!(err.is_parse());
        assert!(err.message().starts_with("JSON parse error"));

        let err = NearError::from(TransportError::InvalidResponse("missing result".to_string()));
        assert_eq!(err, NearError::parse("Invalid response: missing result"));
    }

    #[test]
    fn test_classify_other_falls_back_to_message() {
        let err = NearError::from(TransportError::other("Network is unreachable"));
        assert_eq!(err, NearError::network("Network connection failed"));

        let err = NearError::from(TransportError::other("boom"));
        assert_eq!(err, NearError::unknown("boom"));
    }

    #[test]
    fn test_equality_ignores_cause() {
        let with_cause = NearError::Network {
            message: "Request timeout".to_string(),
            cause: Some(Arc::new(TransportError::other("x"))),
        };
        assert_eq!(with_cause, NearError::network("Request timeout"));
        assert_ne!(NearError::parse("a"), NearError::unknown("a"));
    }
}
