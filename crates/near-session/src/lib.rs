//! A typed client session for the NEAR Protocol JSON-RPC API.
//!
//! **near-session** wraps the public NEAR RPC in three layers: a transport,
//! a facade that turns every call into a [`NearResult`], and a [`Session`]
//! that drives one request at a time and publishes observable state for a
//! UI, including a browser-wallet login session.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use near_session::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Session::testnet().build();
//!
//!     let ticket = session.query_account("alice.testnet").unwrap();
//!     ticket.wait().await;
//!
//!     match session.state().result {
//!         NearResult::Success(account) => println!("{}", account["amount"]),
//!         NearResult::Error(err) => eprintln!("{err}"),
//!         NearResult::Loading => {}
//!     }
//! }
//! ```
//!
//! # Calling the facade directly
//!
//! [`NearRpc`] can be used without a session. It never returns a bare
//! error: transport, RPC, decode and unexpected failures are all folded
//! into [`NearResult::Error`] with a classified [`NearError`].
//!
//! ```rust,no_run
//! use near_session::*;
//!
//! # async fn example() {
//! let rpc = NearRpc::new(HttpTransport::new(TESTNET.rpc_url));
//! let block = rpc.block(BlockReference::at_height(100_000_000)).await;
//! let status = rpc.fetch(RpcEndpoint::Status, &EndpointParams::default()).await;
//! # }
//! ```
//!
//! # Error categories
//!
//! - [`NearError::Network`] - connection failures, timeouts, HTTP status
//! - [`NearError::Rpc`] - JSON-RPC error envelopes, with the server's code
//! - [`NearError::Parse`] - undecodable responses and rejected input
//! - [`NearError::Unknown`] - anything else

pub mod client;
pub mod error;
pub mod result;
pub mod types;

pub use client::{
    DEFAULT_CHANGES_TYPE, DEFAULT_TIMEOUT, EndpointParams, HttpTransport, MAINNET, NearRpc,
    NetworkConfig, RequestTicket, Session, SessionBuilder, SessionState, TESTNET, Transport,
    TransportFuture, UiState,
};
pub use error::{ErrorCause, NearError, TransportError};
pub use result::NearResult;
pub use types::*;
