//! Request orchestration and observable session state.
//!
//! A [`Session`] owns the RPC facade and is the only writer of the state
//! that a UI observes. Each trigger runs exactly one tracked request:
//!
//! 1. `is_loading = true`, `error = None`, `result = Loading` (one snapshot)
//! 2. the facade call runs on a spawned task
//! 3. `result`, `is_loading = false`, `error`, `last_endpoint` (one snapshot)
//!
//! At most one request is in flight. A new trigger aborts the previous
//! request (replace-latest-wins); a superseded request never publishes.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use near_token::NearToken;
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::error::NearError;
use crate::result::NearResult;
use crate::types::{CallbackOutcome, Finality, RpcEndpoint, WalletCallback, WalletLogin, WalletState};

use super::rpc::{EndpointParams, NearRpc};
use super::transport::{DEFAULT_TIMEOUT, HttpTransport, MAINNET, TESTNET, Transport};

/// UI-facing request state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiState {
    pub is_loading: bool,
    /// Error of the last completed request, or of the last rejected trigger.
    pub error: Option<NearError>,
    /// Label of the last completed request.
    pub last_endpoint: Option<String>,
    pub selected_endpoint: RpcEndpoint,
}

/// Everything an observer sees, published as a single snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub ui: UiState,
    pub result: NearResult<Value>,
}

/// Completion handle for a dispatched request.
///
/// Dropping the ticket does not cancel the request.
#[derive(Debug)]
#[must_use = "a ticket does nothing unless awaited; drop it to detach"]
pub struct RequestTicket {
    done: oneshot::Receiver<bool>,
}

impl RequestTicket {
    /// Wait for the request to finish.
    ///
    /// Returns `true` if it published its outcome, `false` if it was
    /// superseded, cancelled, or the session was dropped.
    pub async fn wait(self) -> bool {
        self.done.await.unwrap_or(false)
    }
}

struct InFlight {
    generation: u64,
    task: JoinHandle<()>,
    /// Outcome to restore if this request is cancelled.
    previous_result: NearResult<Value>,
    previous_error: Option<NearError>,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    in_flight: Option<InFlight>,
}

struct Inner<T: Transport> {
    rpc: NearRpc<T>,
    state: watch::Sender<SessionState>,
    wallet: watch::Sender<WalletState>,
    slot: Mutex<Slot>,
}

impl<T: Transport> Inner<T> {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a finished request if it is still the current one.
    fn complete(&self, generation: u64, label: String, result: NearResult<Value>) -> bool {
        let mut slot = self.slot();
        if slot.in_flight.as_ref().map(|f| f.generation) != Some(generation) {
            tracing::debug!(generation, label = %label, "discarding superseded result");
            return false;
        }
        slot.in_flight = None;

        let error = result.error().cloned();
        tracing::debug!(generation, label = %label, ok = error.is_none(), "request finished");
        self.state.send_modify(|state| {
            state.result = result;
            state.ui.is_loading = false;
            state.ui.error = error;
            state.ui.last_endpoint = Some(label);
        });
        true
    }

    /// Refresh the wallet balance from a `view_account` response.
    fn record_balance(&self, account_id: &str, view: &Value) {
        let Some(yocto) = view
            .get("amount")
            .and_then(Value::as_str)
            .and_then(|amount| amount.parse::<u128>().ok())
        else {
            return;
        };
        let balance = NearToken::from_yoctonear(yocto).to_string();

        self.wallet.send_if_modified(|wallet| {
            if !wallet.is_connected_as(account_id) {
                return false;
            }
            wallet.balance = Some(balance);
            true
        });
    }
}

/// A single logical client session: facade, observable state, wallet.
///
/// Triggers spawn onto the current tokio runtime and return immediately.
/// Calling one outside a runtime panics without changing any state.
/// Dropping the session aborts any in-flight request and releases the
/// transport once that request has unwound.
///
/// # Example
///
/// ```rust,no_run
/// use near_session::{RpcEndpoint, Session};
///
/// # async fn example() {
/// let session = Session::testnet().build();
/// let mut updates = session.subscribe();
///
/// let ticket = session.fetch_endpoint(RpcEndpoint::Status);
/// assert!(session.state().ui.is_loading);
///
/// ticket.wait().await;
/// let state = updates.borrow_and_update().clone();
/// println!("{}: {:?}", state.ui.last_endpoint.unwrap(), state.result);
/// # }
/// ```
pub struct Session<T: Transport = HttpTransport> {
    inner: Arc<Inner<T>>,
    wallet_login: WalletLogin,
}

impl Session<HttpTransport> {
    /// Create a builder for mainnet.
    pub fn mainnet() -> SessionBuilder {
        SessionBuilder::new(MAINNET.rpc_url)
    }

    /// Create a builder for testnet.
    pub fn testnet() -> SessionBuilder {
        SessionBuilder::new(TESTNET.rpc_url)
    }

    /// Create a builder with a custom RPC URL.
    pub fn custom(rpc_url: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(rpc_url)
    }

    /// Get the RPC URL.
    pub fn rpc_url(&self) -> &str {
        self.inner.rpc.transport().url()
    }
}

impl<T: Transport + 'static> Session<T> {
    /// Create a session over any transport with the default wallet login.
    pub fn new(transport: T) -> Self {
        Self::with_wallet_login(transport, WalletLogin::default())
    }

    /// Create a session over any transport.
    pub fn with_wallet_login(transport: T, wallet_login: WalletLogin) -> Self {
        Self {
            inner: Arc::new(Inner {
                rpc: NearRpc::new(transport),
                state: watch::channel(SessionState::default()).0,
                wallet: watch::channel(WalletState::default()).0,
                slot: Mutex::new(Slot::default()),
            }),
            wallet_login,
        }
    }

    /// Get the facade, for calls that should bypass session state.
    pub fn rpc(&self) -> &NearRpc<T> {
        &self.inner.rpc
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Current wallet state.
    pub fn wallet(&self) -> WalletState {
        self.inner.wallet.borrow().clone()
    }

    /// Subscribe to wallet state changes.
    pub fn subscribe_wallet(&self) -> watch::Receiver<WalletState> {
        self.inner.wallet.subscribe()
    }

    /// Returns true while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.inner.slot().in_flight.is_some()
    }

    // ========================================================================
    // UI state
    // ========================================================================

    /// Record the endpoint selected in the UI.
    pub fn select_endpoint(&self, endpoint: RpcEndpoint) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.ui.selected_endpoint != endpoint;
            state.ui.selected_endpoint = endpoint;
            changed
        });
    }

    /// Clear the displayed error.
    pub fn clear_error(&self) {
        self.inner
            .state
            .send_if_modified(|state| state.ui.error.take().is_some());
    }

    // ========================================================================
    // Triggers
    // ========================================================================

    /// Fetch an endpoint with default parameters.
    ///
    /// `Chunk` and `Changes` need identifiers; without them the request
    /// resolves to a parse error without touching the network.
    pub fn fetch_endpoint(&self, endpoint: RpcEndpoint) -> RequestTicket {
        self.fetch_endpoint_with(endpoint, EndpointParams::default())
    }

    /// Fetch an endpoint with caller-supplied parameters.
    pub fn fetch_endpoint_with(&self, endpoint: RpcEndpoint, params: EndpointParams) -> RequestTicket {
        self.dispatch(endpoint.label().to_string(), move |inner| async move {
            inner.rpc.fetch(endpoint, &params).await
        })
    }

    /// Query account information.
    ///
    /// A successful query for the connected wallet account also refreshes
    /// the wallet balance.
    pub fn query_account(&self, account_id: &str) -> Result<RequestTicket, NearError> {
        if account_id.trim().is_empty() {
            return Err(self.reject(NearError::parse("Account ID cannot be empty")));
        }

        let account_id = account_id.to_string();
        let label = format!("Account Query: {account_id}");
        Ok(self.dispatch(label, move |inner| async move {
            let result = inner.rpc.query_account(&account_id, Finality::Final).await;
            if let NearResult::Success(view) = &result {
                inner.record_balance(&account_id, view);
            }
            result
        }))
    }

    /// Call a contract view method. `args` is JSON text.
    pub fn call_view_method(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &str,
    ) -> Result<RequestTicket, NearError> {
        if contract_id.trim().is_empty() || method_name.trim().is_empty() {
            return Err(self.reject(NearError::parse(
                "Contract ID and method name are required",
            )));
        }

        let contract_id = contract_id.to_string();
        let method_name = method_name.to_string();
        let args = args.to_string();
        let label = format!("View Method: {contract_id}.{method_name}");
        Ok(self.dispatch(label, move |inner| async move {
            inner
                .rpc
                .call_view_method(&contract_id, &method_name, &args, Finality::Final)
                .await
        }))
    }

    /// Get transaction status.
    pub fn transaction_status(
        &self,
        tx_hash: &str,
        account_id: &str,
    ) -> Result<RequestTicket, NearError> {
        if tx_hash.trim().is_empty() || account_id.trim().is_empty() {
            return Err(self.reject(NearError::parse(
                "Transaction hash and account ID are required",
            )));
        }

        let tx_hash = tx_hash.to_string();
        let account_id = account_id.to_string();
        Ok(self.dispatch("Transaction Status".to_string(), move |inner| async move {
            inner.rpc.transaction_status(&tx_hash, &account_id).await
        }))
    }

    /// Get a light-client proof for a transaction.
    pub fn light_client_proof(
        &self,
        tx_hash: &str,
        sender_id: &str,
    ) -> Result<RequestTicket, NearError> {
        if tx_hash.trim().is_empty() || sender_id.trim().is_empty() {
            return Err(self.reject(NearError::parse(
                "Transaction hash and sender ID are required",
            )));
        }

        let tx_hash = tx_hash.to_string();
        let sender_id = sender_id.to_string();
        Ok(self.dispatch("Light Client Proof".to_string(), move |inner| async move {
            inner.rpc.light_client_proof(&tx_hash, &sender_id).await
        }))
    }

    /// Abort the in-flight request, if any.
    ///
    /// Restores the result and error that were current before it started.
    pub fn cancel(&self) -> bool {
        let mut slot = self.inner.slot();
        let Some(in_flight) = slot.in_flight.take() else {
            return false;
        };
        in_flight.task.abort();
        tracing::debug!(generation = in_flight.generation, "request cancelled");

        self.inner.state.send_modify(|state| {
            state.result = in_flight.previous_result;
            state.ui.error = in_flight.previous_error;
            state.ui.is_loading = false;
        });
        true
    }

    // ========================================================================
    // Wallet
    // ========================================================================

    /// The wallet login configuration.
    pub fn wallet_login(&self) -> &WalletLogin {
        &self.wallet_login
    }

    /// Build the wallet login URL for `contract_id`.
    pub fn wallet_login_url(&self, contract_id: &str) -> Url {
        self.wallet_login.login_url(contract_id)
    }

    /// Mark the wallet connected and refresh the account.
    pub fn connect_wallet(&self, account_id: &str) -> Result<RequestTicket, NearError> {
        self.inner
            .wallet
            .send_replace(WalletState::connected(account_id));
        tracing::info!(account_id, "wallet connected");
        self.query_account(account_id)
    }

    /// Reset the wallet to the disconnected state.
    pub fn disconnect_wallet(&self) {
        let previous = self.inner.wallet.send_replace(WalletState::default());
        if previous.is_connected {
            tracing::info!(account_id = previous.account_id.as_deref(), "wallet disconnected");
        }
    }

    /// Apply a wallet login callback.
    ///
    /// An `error` leaves the wallet unchanged; an `account_id` connects.
    pub fn handle_wallet_callback(
        &self,
        callback: &WalletCallback,
    ) -> Result<Option<RequestTicket>, NearError> {
        match callback.outcome() {
            CallbackOutcome::Connect(account_id) => self.connect_wallet(&account_id).map(Some),
            CallbackOutcome::Failed(error) => {
                tracing::warn!(error = %error, "wallet login failed");
                Ok(None)
            }
            CallbackOutcome::Ignored => Ok(None),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Abort any in-flight request and wait for it to unwind.
    pub async fn shutdown(self) {
        let in_flight = self.inner.slot().in_flight.take();
        if let Some(in_flight) = in_flight {
            in_flight.task.abort();
            let _ = in_flight.task.await;
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Publish a validation failure without starting a request.
    fn reject(&self, error: NearError) -> NearError {
        tracing::warn!(error = %error, "request rejected");
        let published = error.clone();
        self.inner
            .state
            .send_modify(|state| state.ui.error = Some(published));
        error
    }

    /// Start `request` as the only in-flight request.
    fn dispatch<F, Fut>(&self, label: String, request: F) -> RequestTicket
    where
        F: FnOnce(Arc<Inner<T>>) -> Fut + Send + 'static,
        Fut: Future<Output = NearResult<Value>> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();

        // Held until the new request is registered, so its completion
        // cannot be checked against a stale slot.
        let mut slot = self.inner.slot();
        let generation = slot.generation + 1;
        tracing::debug!(generation, label = %label, "request started");

        // Spawn before touching any state: outside a runtime this panics
        // and leaves the session as it was.
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = request(Arc::clone(&inner)).await;
            let published = inner.complete(generation, label, result);
            let _ = done_tx.send(published);
        });
        slot.generation = generation;

        let (previous_result, previous_error) = match slot.in_flight.take() {
            Some(superseded) => {
                superseded.task.abort();
                tracing::debug!(
                    generation = superseded.generation,
                    "superseded by a newer request"
                );
                (superseded.previous_result, superseded.previous_error)
            }
            None => {
                let current = self.inner.state.borrow();
                (current.result.clone(), current.ui.error.clone())
            }
        };

        self.inner.state.send_modify(|state| {
            state.ui.is_loading = true;
            state.ui.error = None;
            state.result = NearResult::Loading;
        });

        slot.in_flight = Some(InFlight {
            generation,
            task,
            previous_result,
            previous_error,
        });
        RequestTicket { done: done_rx }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.inner.slot().in_flight.take() {
            in_flight.task.abort();
        }
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.inner.state.borrow())
            .field("wallet", &*self.inner.wallet.borrow())
            .field("wallet_login", &self.wallet_login)
            .finish()
    }
}

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for an HTTP-backed [`Session`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use near_session::{Session, WalletLogin};
///
/// let session = Session::testnet()
///     .timeout(Duration::from_secs(10))
///     .wallet_login(WalletLogin::default().success_url("demo://callback"))
///     .build();
/// assert!(session.rpc_url().contains("testnet"));
/// ```
#[derive(Clone, Debug)]
pub struct SessionBuilder {
    rpc_url: String,
    timeout: Duration,
    wallet_login: WalletLogin,
}

impl SessionBuilder {
    fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            timeout: DEFAULT_TIMEOUT,
            wallet_login: WalletLogin::default(),
        }
    }

    /// Bound every RPC call by `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the wallet login configuration.
    pub fn wallet_login(mut self, wallet_login: WalletLogin) -> Self {
        self.wallet_login = wallet_login;
        self
    }

    /// Build a session over HTTPS.
    pub fn build(self) -> Session {
        let transport = HttpTransport::with_timeout(self.rpc_url, self.timeout);
        Session::with_wallet_login(transport, self.wallet_login)
    }

    /// Build a session over a custom transport, keeping the wallet config.
    ///
    /// The RPC URL and timeout are ignored.
    pub fn build_with<T: Transport + 'static>(self, transport: T) -> Session<T> {
        Session::with_wallet_login(transport, self.wallet_login)
    }
}

impl From<SessionBuilder> for Session {
    fn from(builder: SessionBuilder) -> Self {
        builder.build()
    }
}
