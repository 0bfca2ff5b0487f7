//! JSON-RPC transport for NEAR.
//!
//! [`Transport`] is the seam between the facade and the wire: it sends one
//! named method with a JSON parameter payload and returns the raw `result`
//! value. [`HttpTransport`] is the production implementation over HTTPS.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// Network configuration presets.
pub struct NetworkConfig {
    /// The RPC URL for this network.
    pub rpc_url: &'static str,
    /// The network identifier (e.g., "mainnet", "testnet").
    pub network_id: &'static str,
}

/// Mainnet configuration.
pub const MAINNET: NetworkConfig = NetworkConfig {
    rpc_url: "https://rpc.mainnet.near.org",
    network_id: "mainnet",
};

/// Testnet configuration.
pub const TESTNET: NetworkConfig = NetworkConfig {
    rpc_url: "https://rpc.testnet.near.org",
    network_id: "testnet",
};

/// Default bound on a single call, including connect and body read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Future returned by [`Transport::call`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'a>>;

/// Sends a single JSON-RPC method call.
///
/// Implementations fail with a [`TransportError`] on network failure,
/// non-2xx HTTP status, timeout, an undecodable body, or a JSON-RPC error
/// envelope. They never retry.
///
/// # Example
///
/// ```rust
/// use near_session::{Transport, TransportError, TransportFuture};
/// use serde_json::{Value, json};
///
/// struct Offline;
///
/// impl Transport for Offline {
///     fn call<'a>(&'a self, method: &'a str, _params: Value) -> TransportFuture<'a> {
///         Box::pin(async move {
///             match method {
///                 "health" => Ok(Value::Null),
///                 _ => Err(TransportError::other("network unreachable")),
///             }
///         })
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Call `method` with `params` and return the response's `result`.
    fn call<'a>(&'a self, method: &'a str, params: Value) -> TransportFuture<'a>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn call<'a>(&'a self, method: &'a str, params: Value) -> TransportFuture<'a> {
        (**self).call(method, params)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn call<'a>(&'a self, method: &'a str, params: Value) -> TransportFuture<'a> {
        (**self).call(method, params)
    }
}

/// JSON-RPC request structure.
#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC error structure.
/// NEAR RPC returns structured errors with name/cause/info pattern.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    cause: Option<ErrorCause>,
}

/// Structured error cause from NEAR RPC.
#[derive(Debug, Deserialize)]
struct ErrorCause {
    name: String,
}

/// JSON-RPC 2.0 transport over HTTPS.
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
    request_id: AtomicU64,
}

impl HttpTransport {
    /// Create a transport for the given RPC URL with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom per-call timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            timeout,
            request_id: AtomicU64::new(0),
        }
    }

    /// Get the RPC URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Make one bounded RPC call.
    pub async fn send(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        match tokio::time::timeout(self.timeout, self.try_call(&request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn try_call(&self, request: &JsonRpcRequest<'_>) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

impl Transport for HttpTransport {
    fn call<'a>(&'a self, method: &'a str, params: Value) -> TransportFuture<'a> {
        Box::pin(self.send(method, params))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Extract `result` from a JSON-RPC response body.
///
/// A present-but-null `result` is a valid response (`health` returns one).
fn parse_response(body: &str) -> Result<Value, TransportError> {
    let mut envelope: Value = serde_json::from_str(body)?;

    if let Some(error) = envelope.get_mut("error").filter(|e| !e.is_null()) {
        let error: JsonRpcError = serde_json::from_value(error.take())?;
        return Err(rpc_error(error));
    }

    envelope
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| TransportError::InvalidResponse("Missing result in response".to_string()))
}

/// Flatten a NEAR error envelope into a coded RPC error.
///
/// NEAR puts the useful part in `cause.name` or a string `data`, with a
/// generic `message` such as "Server error".
fn rpc_error(error: JsonRpcError) -> TransportError {
    let detail = error
        .cause
        .map(|c| c.name)
        .or_else(|| error.data.as_ref().and_then(Value::as_str).map(String::from));

    let message = match detail {
        Some(detail) if detail != error.message => format!("{}: {}", error.message, detail),
        _ => error.message,
    };

    TransportError::Rpc {
        code: error.code,
        message,
        data: error.data,
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::error::NearError;

    use super::*;

    /// Read one HTTP request (headers and `Content-Length` body).
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let body_len = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + body_len {
                return;
            }
        }
    }

    // ========================================================================
    // HttpTransport tests
    // ========================================================================

    #[test]
    fn test_http_transport_new() {
        let transport = HttpTransport::new("https://rpc.testnet.near.org");
        assert_eq!(transport.url(), "https://rpc.testnet.near.org");
        assert_eq!(transport.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_http_transport_with_timeout() {
        let transport = HttpTransport::with_timeout("https://rpc.example.com", Duration::from_secs(5));
        assert_eq!(transport.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_http_transport_debug() {
        let transport = HttpTransport::new("https://rpc.testnet.near.org");
        let debug = format!("{:?}", transport);
        assert!(debug.contains("HttpTransport"));
        assert!(debug.contains("rpc.testnet.near.org"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let transport = HttpTransport::with_timeout("http://127.0.0.1:9", Duration::from_secs(5));
        let err = transport.send("status", serde_json::json!([])).await.unwrap_err();
        assert!(matches!(err, TransportError::Http(_)), "unexpected error: {err:?}");
        assert_eq!(NearError::from(err), NearError::network("Network connection failed"));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(stream);
        });

        let timeout = Duration::from_millis(200);
        let transport = HttpTransport::with_timeout(format!("http://{addr}"), timeout);
        let err = transport.send("status", serde_json::json!([])).await.unwrap_err();
        server.abort();

        assert!(matches!(err, TransportError::Timeout(t) if t == timeout), "unexpected error: {err:?}");
        assert_eq!(NearError::from(err), NearError::network("Request timeout"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            stream
                .write_all(
                    b"HTTP/1.1 503 Service Unavailable\r\n\
                      Content-Type: text/plain\r\n\
                      Content-Length: 11\r\n\
                      Connection: close\r\n\r\n\
                      unavailable",
                )
                .await
                .unwrap();
            stream.shutdown().await.unwrap();
        });

        let transport = HttpTransport::with_timeout(format!("http://{addr}"), Duration::from_secs(5));
        let err = transport.send("status", serde_json::json!([])).await.unwrap_err();
        server.await.unwrap();

        match &err {
            TransportError::Status { status, body } => {
                assert_eq!(*status, 503);
                assert_eq!(body, "unavailable");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
        assert_eq!(NearError::from(err), NearError::network("HTTP 503: unavailable"));
    }

    #[test]
    fn test_request_serialization() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "status",
            params: serde_json::json!([]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "jsonrpc": "2.0", "id": 7, "method": "status", "params": [] })
        );
    }

    // ========================================================================
    // parse_response tests
    // ========================================================================

    #[test]
    fn test_parse_response_result() {
        let body = r#"{"jsonrpc":"2.0","id":0,"result":{"chain_id":"testnet"}}"#;
        let value = parse_response(body).unwrap();
        assert_eq!(value["chain_id"], "testnet");
    }

    #[test]
    fn test_parse_response_null_result() {
        let body = r#"{"jsonrpc":"2.0","id":0,"result":null}"#;
        assert_eq!(parse_response(body).unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_response_missing_result() {
        let body = r#"{"jsonrpc":"2.0","id":0}"#;
        assert!(matches!(
            parse_response(body),
            Err(TransportError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_response_malformed() {
        assert!(matches!(
            parse_response("<html>502</html>"),
            Err(TransportError::Json(_))
        ));
    }

    #[test]
    fn test_parse_response_error_with_cause() {
        let body = r#"{
            "jsonrpc": "2.0",
            "id": 0,
            "error": {
                "code": -32000,
                "message": "Server error",
                "name": "HANDLER_ERROR",
                "cause": { "name": "UNKNOWN_ACCOUNT", "info": { "requested_account_id": "nope.testnet" } },
                "data": "account nope.testnet does not exist while viewing"
            }
        }"#;
        match parse_response(body) {
            Err(TransportError::Rpc { code, message, data }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "Server error: UNKNOWN_ACCOUNT");
                assert!(data.is_some());
            }
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_error_with_string_data() {
        let body = r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32602,"message":"Invalid params","data":"missing field `finality`"}}"#;
        match parse_response(body) {
            Err(TransportError::Rpc { code, message, .. }) => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Invalid params: missing field `finality`");
            }
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_error_plain() {
        let body = r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32601,"message":"Method not found"}}"#;
        match parse_response(body) {
            Err(TransportError::Rpc { code, message, data }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
                assert!(data.is_none());
            }
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    // ========================================================================
    // NetworkConfig tests
    // ========================================================================

    #[test]
    fn test_network_configs() {
        assert_eq!(MAINNET.network_id, "mainnet");
        assert!(MAINNET.rpc_url.contains("mainnet"));
        assert_eq!(TESTNET.network_id, "testnet");
        assert!(TESTNET.rpc_url.contains("testnet"));
    }
}
