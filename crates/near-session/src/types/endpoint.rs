//! The set of RPC endpoints a session can fetch by name.

use std::fmt;
use std::str::FromStr;

/// An RPC endpoint selectable from a UI.
///
/// Each endpoint has a stable wire method name and a human-readable label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RpcEndpoint {
    #[default]
    NetworkInfo,
    Status,
    Block,
    GasPrice,
    Validators,
    Health,
    ProtocolConfig,
    GenesisConfig,
    /// Requires a chunk hash.
    Chunk,
    /// Requires a block id.
    Changes,
}

impl RpcEndpoint {
    /// Every endpoint, in display order.
    pub const ALL: [RpcEndpoint; 10] = [
        RpcEndpoint::NetworkInfo,
        RpcEndpoint::Status,
        RpcEndpoint::Block,
        RpcEndpoint::GasPrice,
        RpcEndpoint::Validators,
        RpcEndpoint::Health,
        RpcEndpoint::ProtocolConfig,
        RpcEndpoint::GenesisConfig,
        RpcEndpoint::Chunk,
        RpcEndpoint::Changes,
    ];

    /// The JSON-RPC method name.
    pub fn wire_name(&self) -> &'static str {
        match self {
            RpcEndpoint::NetworkInfo => "network_info",
            RpcEndpoint::Status => "status",
            RpcEndpoint::Block => "block",
            RpcEndpoint::GasPrice => "gas_price",
            RpcEndpoint::Validators => "validators",
            RpcEndpoint::Health => "health",
            RpcEndpoint::ProtocolConfig => "EXPERIMENTAL_protocol_config",
            RpcEndpoint::GenesisConfig => "genesis_config",
            RpcEndpoint::Chunk => "chunk",
            RpcEndpoint::Changes => "changes",
        }
    }

    /// The human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RpcEndpoint::NetworkInfo => "Network Info",
            RpcEndpoint::Status => "Status",
            RpcEndpoint::Block => "Block",
            RpcEndpoint::GasPrice => "Gas Price",
            RpcEndpoint::Validators => "Validators",
            RpcEndpoint::Health => "Health Check",
            RpcEndpoint::ProtocolConfig => "Protocol Config",
            RpcEndpoint::GenesisConfig => "Genesis Config",
            RpcEndpoint::Chunk => "Chunk Details",
            RpcEndpoint::Changes => "State Changes",
        }
    }
}

impl fmt::Display for RpcEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a wire name matches no endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown RPC endpoint: '{0}'")]
pub struct UnknownEndpoint(pub String);

impl FromStr for RpcEndpoint {
    type Err = UnknownEndpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RpcEndpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.wire_name() == s)
            .ok_or_else(|| UnknownEndpoint(s.to_string()))
    }
}
