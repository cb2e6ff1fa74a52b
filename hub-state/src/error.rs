//! Error types for hub-state

use std::fmt;

/// Result type for hub-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur during inventory management and polling
#[derive(Debug)]
pub enum StateError {
    /// Error during initialization
    Init(String),

    /// Error from the RPC channel
    Rpc(rpc_channel::RpcError),

    /// Error parsing a response payload
    Parse(String),

    /// The hub answered outside its own protocol (e.g. an aborted exchange)
    Protocol(String),

    /// Device not present in the inventory
    DeviceNotFound(crate::model::DeviceId),

    /// Shutdown failed
    ShutdownFailed,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Init(msg) => write!(f, "Initialization error: {}", msg),
            StateError::Rpc(err) => write!(f, "RPC error: {}", err),
            StateError::Parse(msg) => write!(f, "Parse error: {}", msg),
            StateError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            StateError::DeviceNotFound(id) => write!(f, "Device not found: {}", id),
            StateError::ShutdownFailed => write!(f, "Shutdown failed"),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Rpc(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rpc_channel::RpcError> for StateError {
    fn from(err: rpc_channel::RpcError) -> Self {
        StateError::Rpc(err)
    }
}

impl StateError {
    /// Whether this failure came out of the RPC layer as a domain-level
    /// command rejection (the connection is intact)
    pub fn is_command_failure(&self) -> bool {
        matches!(self, StateError::Rpc(err) if err.is_command_failure())
    }
}
