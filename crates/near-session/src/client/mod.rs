//! Client layer: transport, RPC facade and session orchestration.
//!
//! - [`Transport`] sends one JSON-RPC method call ([`HttpTransport`] over HTTPS)
//! - [`NearRpc`] exposes one typed operation per RPC method, never failing
//!   outside of [`NearResult`](crate::NearResult)
//! - [`Session`] runs at most one request at a time and publishes UI and
//!   wallet state through `tokio::sync::watch` channels

mod rpc;
mod session;
mod transport;

pub use rpc::{DEFAULT_CHANGES_TYPE, EndpointParams, NearRpc};
pub use session::{RequestTicket, Session, SessionBuilder, SessionState, UiState};
pub use transport::{
    DEFAULT_TIMEOUT, HttpTransport, MAINNET, NetworkConfig, TESTNET, Transport, TransportFuture,
};
