//! Core types shared by the facade and the session.

mod block_reference;
mod endpoint;
mod wallet;

pub use block_reference::{BlockReference, Finality};
pub use endpoint::{RpcEndpoint, UnknownEndpoint};
pub use wallet::{
    CallbackOutcome, DEFAULT_CONTRACT_ID, DEFAULT_FAILURE_URL, DEFAULT_SUCCESS_URL,
    DEFAULT_WALLET_LOGIN_URL, WalletCallback, WalletLogin, WalletState,
};
