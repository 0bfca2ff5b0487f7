//! Typed facade over a [`Transport`].
//!
//! Every operation shapes one JSON-RPC call and returns a
//! [`NearResult`]; failures are classified into [`NearError`] here and
//! never escape as errors or panics.

use std::panic::AssertUnwindSafe;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::FutureExt;
use serde_json::{Value, json};

use crate::error::NearError;
use crate::result::NearResult;
use crate::types::{BlockReference, Finality, RpcEndpoint};

use super::transport::{HttpTransport, Transport};

/// Default `changes_type` for state-change queries.
pub const DEFAULT_CHANGES_TYPE: &str = "all";

/// Caller-supplied arguments for [`NearRpc::fetch`].
///
/// Most endpoints need nothing; `Chunk` needs a chunk hash and `Changes`
/// needs a block id.
///
/// # Example
///
/// ```rust
/// use near_session::EndpointParams;
///
/// let params = EndpointParams::new().chunk_id("EBM2qg5cGr47EjMPtH88uvmXHDHqmWPzKaQadbWhdw22");
/// assert!(params.chunk_id.is_some());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointParams {
    /// Finality for `Block` and `ProtocolConfig`.
    pub finality: Finality,
    /// Block height for `Block` and `GasPrice`.
    pub block_height: Option<u64>,
    /// Block hash or height for `Validators` and `Changes`.
    pub block_id: Option<String>,
    /// Chunk hash for `Chunk`.
    pub chunk_id: Option<String>,
    /// Change kind for `Changes`; defaults to [`DEFAULT_CHANGES_TYPE`].
    pub changes_type: Option<String>,
}

impl EndpointParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finality(mut self, finality: Finality) -> Self {
        self.finality = finality;
        self
    }

    pub fn block_height(mut self, height: u64) -> Self {
        self.block_height = Some(height);
        self
    }

    pub fn block_id(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }

    pub fn chunk_id(mut self, chunk_id: impl Into<String>) -> Self {
        self.chunk_id = Some(chunk_id.into());
        self
    }

    pub fn changes_type(mut self, changes_type: impl Into<String>) -> Self {
        self.changes_type = Some(changes_type.into());
        self
    }
}

/// Typed NEAR JSON-RPC facade.
///
/// # Example
///
/// ```rust,no_run
/// use near_session::{NearRpc, HttpTransport};
///
/// # async fn example() {
/// let rpc = NearRpc::new(HttpTransport::new("https://rpc.testnet.near.org"));
/// match rpc.status().await.into_result() {
///     Some(Ok(status)) => println!("chain: {}", status["chain_id"]),
///     Some(Err(e)) => println!("{e}"),
///     None => unreachable!("resolved calls are never Loading"),
/// }
/// # }
/// ```
pub struct NearRpc<T: Transport = HttpTransport> {
    transport: T,
}

impl<T: Transport> NearRpc<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one transport call, classifying any failure.
    ///
    /// A panicking transport is classified from its panic message, whether
    /// it panics while building its future or while polling it.
    async fn safe_call(&self, method: &str, params: Value) -> NearResult<Value> {
        tracing::debug!(method, %params, "dispatching RPC call");

        let outcome = AssertUnwindSafe(async { self.transport.call(method, params).await })
            .catch_unwind()
            .await;

        let error = match outcome {
            Ok(Ok(value)) => return NearResult::Success(value),
            Ok(Err(e)) => NearError::from(e),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                NearError::classify_message(&message, None)
            }
        };

        tracing::warn!(method, error = %error, "RPC call failed");
        NearResult::Error(error)
    }

    // ========================================================================
    // Node & network
    // ========================================================================

    /// Get node status.
    pub async fn status(&self) -> NearResult<Value> {
        self.safe_call("status", json!([])).await
    }

    /// Get network info (peers, known producers).
    pub async fn network_info(&self) -> NearResult<Value> {
        self.safe_call("network_info", json!([])).await
    }

    /// Get node health. A healthy node returns `null`.
    pub async fn health(&self) -> NearResult<Value> {
        self.safe_call("health", json!([])).await
    }

    /// Get the node's client configuration.
    pub async fn client_config(&self) -> NearResult<Value> {
        self.safe_call("client_config", json!([])).await
    }

    // ========================================================================
    // Blocks & chain config
    // ========================================================================

    /// Get block information.
    pub async fn block(&self, block: BlockReference) -> NearResult<Value> {
        self.safe_call("block", block.to_rpc_params()).await
    }

    /// Get gas price, at a block height or for the latest block.
    pub async fn gas_price(&self, block_height: Option<u64>) -> NearResult<Value> {
        let params = match block_height {
            Some(height) => json!({ "block_id": height }),
            None => json!([Value::Null]),
        };
        self.safe_call("gas_price", params).await
    }

    /// Get validators, at a block or for the latest epoch.
    pub async fn validators(&self, block_id: Option<&str>) -> NearResult<Value> {
        let params = match block_id {
            Some(block_id) => json!({ "block_id": block_id }),
            None => json!([Value::Null]),
        };
        self.safe_call("validators", params).await
    }

    /// Get protocol configuration.
    pub async fn protocol_config(&self, finality: Finality) -> NearResult<Value> {
        self.safe_call(
            "EXPERIMENTAL_protocol_config",
            json!({ "finality": finality }),
        )
        .await
    }

    /// Get genesis configuration.
    pub async fn genesis_config(&self) -> NearResult<Value> {
        self.safe_call("genesis_config", json!([])).await
    }

    /// Get chunk details by chunk hash.
    ///
    /// A blank hash fails with a parse error without calling the transport.
    pub async fn chunk(&self, chunk_hash: &str) -> NearResult<Value> {
        if chunk_hash.trim().is_empty() {
            return NearResult::Error(NearError::parse("Chunk hash required for this endpoint"));
        }
        self.safe_call("chunk", json!({ "chunk_id": chunk_hash }))
            .await
    }

    /// Get state changes in a block.
    ///
    /// A blank block id fails with a parse error without calling the transport.
    pub async fn changes(&self, block_id: &str, changes_type: &str) -> NearResult<Value> {
        if block_id.trim().is_empty() {
            return NearResult::Error(NearError::parse("Block ID required for this endpoint"));
        }
        self.safe_call(
            "changes",
            json!({ "block_id": block_id, "changes_type": changes_type }),
        )
        .await
    }

    // ========================================================================
    // Accounts & contracts
    // ========================================================================

    /// View account information.
    pub async fn query_account(&self, account_id: &str, finality: Finality) -> NearResult<Value> {
        let mut params = json!({
            "request_type": "view_account",
            "account_id": account_id,
        });
        BlockReference::from(finality).merge_into(&mut params);
        self.safe_call("query", params).await
    }

    /// Call a view method on a contract.
    ///
    /// `args` is JSON text (use `"{}"` for none); it is sent base64-encoded.
    pub async fn call_view_method(
        &self,
        account_id: &str,
        method_name: &str,
        args: &str,
        finality: Finality,
    ) -> NearResult<Value> {
        let mut params = json!({
            "request_type": "call_function",
            "account_id": account_id,
            "method_name": method_name,
            "args_base64": STANDARD.encode(args.as_bytes()),
        });
        BlockReference::from(finality).merge_into(&mut params);
        self.safe_call("query", params).await
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Get transaction status with receipts.
    pub async fn transaction_status(&self, tx_hash: &str, account_id: &str) -> NearResult<Value> {
        self.safe_call("EXPERIMENTAL_tx_status", json!([tx_hash, account_id]))
            .await
    }

    /// Get a light-client execution proof for a transaction.
    pub async fn light_client_proof(&self, tx_hash: &str, sender_id: &str) -> NearResult<Value> {
        self.safe_call(
            "light_client_proof",
            json!({
                "type": "transaction",
                "transaction_hash": tx_hash,
                "sender_id": sender_id,
            }),
        )
        .await
    }

    // ========================================================================
    // Endpoint dispatch
    // ========================================================================

    /// Fetch an endpoint by variant.
    ///
    /// `Chunk` and `Changes` fail fast with a parse error when `params`
    /// lacks the chunk hash or block id.
    pub async fn fetch(&self, endpoint: RpcEndpoint, params: &EndpointParams) -> NearResult<Value> {
        match endpoint {
            RpcEndpoint::NetworkInfo => self.network_info().await,
            RpcEndpoint::Status => self.status().await,
            RpcEndpoint::Block => {
                let block = match params.block_height {
                    Some(height) => BlockReference::Height(height),
                    None => BlockReference::Finality(params.finality),
                };
                self.block(block).await
            }
            RpcEndpoint::GasPrice => self.gas_price(params.block_height).await,
            RpcEndpoint::Validators => self.validators(params.block_id.as_deref()).await,
            RpcEndpoint::Health => self.health().await,
            RpcEndpoint::ProtocolConfig => self.protocol_config(params.finality).await,
            RpcEndpoint::GenesisConfig => self.genesis_config().await,
            RpcEndpoint::Chunk => self.chunk(params.chunk_id.as_deref().unwrap_or_default()).await,
            RpcEndpoint::Changes => {
                let changes_type = params
                    .changes_type
                    .as_deref()
                    .unwrap_or(DEFAULT_CHANGES_TYPE);
                self.changes(params.block_id.as_deref().unwrap_or_default(), changes_type)
                    .await
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for NearRpc<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearRpc").finish_non_exhaustive()
    }
}
