use thiserror::Error;

/// Errors raised while acquiring a bearer token
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token endpoint could not be reached
    #[error("token endpoint unreachable: {0}")]
    Http(String),

    /// The hub rejected the stored credentials
    #[error("credentials rejected by hub (HTTP {0})")]
    Denied(u16),

    /// The token response did not carry a usable token
    #[error("malformed token response: {0}")]
    Parse(String),
}
