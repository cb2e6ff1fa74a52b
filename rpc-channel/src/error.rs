use std::time::Duration;
use thiserror::Error;

/// Result type for channel and client operations
pub type Result<T> = std::result::Result<T, RpcError>;

/// Errors raised by the session channel and RPC client
#[derive(Debug, Error)]
pub enum RpcError {
    /// Invalid channel configuration (bad port, unresolvable host)
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller handed us a null/empty request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The hub explicitly rejected the command (domain failure, never retried)
    #[error("hub rejected command (code {code}): {message}")]
    CommandFailed { code: i64, message: String },

    /// The absolute per-call read deadline elapsed before the expected
    /// fragment count arrived
    #[error("read deadline of {0:?} elapsed")]
    Deadline(Duration),

    /// The hub closed the stream mid-exchange
    #[error("connection closed by hub")]
    Disconnected,

    /// Transport-level I/O failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize the request envelope
    #[error("envelope error: {0}")]
    Envelope(#[from] serde_json::Error),
}

impl RpcError {
    /// Whether this error is a domain-level rejection from the hub.
    ///
    /// Command failures leave the connection intact and are never retried;
    /// every other failure tears the channel down.
    pub fn is_command_failure(&self) -> bool {
        matches!(self, RpcError::CommandFailed { .. })
    }

    /// Whether this error indicates the channel read deadline elapsed
    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Deadline(_))
    }

    /// Whether a fresh connection might cure this failure.
    ///
    /// Only transport-level failures qualify; configuration and envelope
    /// errors would fail identically on a retry and propagate immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RpcError::Deadline(_) | RpcError::Disconnected | RpcError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_only_transport_failures_are_transient() {
        assert!(RpcError::Deadline(Duration::from_secs(30)).is_transient());
        assert!(RpcError::Disconnected.is_transient());
        assert!(RpcError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset")).is_transient());

        assert!(!RpcError::Config("bad address".to_string()).is_transient());
        assert!(!RpcError::InvalidRequest("empty".to_string()).is_transient());
        assert!(!RpcError::CommandFailed {
            code: -32000,
            message: "rejected".to_string(),
        }
        .is_transient());
    }
}
