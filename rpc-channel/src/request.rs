//! Request envelope construction
//!
//! The hub speaks a fixed JSON-RPC 2.0 dialect: every request is a JSON
//! envelope followed by a newline, framed on the wire by a single NUL byte.
//! The correlation id is a protocol constant; responses are matched by
//! one-request-at-a-time serialization, not by id.

use serde::Serialize;

use crate::error::Result;

/// Fixed correlation id carried by every request envelope
pub const CORRELATION_ID: u32 = 1234;

/// One RPC request: method name, parameter string, fixed correlation id
///
/// The parameter string is itself a small templated string, e.g.
/// `{name:AmpRack1}` for calls scoped to one component.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    jsonrpc: &'static str,
    method: String,
    params: String,
    id: u32,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params: params.into(),
            id: CORRELATION_ID,
        }
    }

    /// A request scoped to a single named component
    pub fn scoped(method: impl Into<String>, name: &str) -> Self {
        Self::new(method, format!("{{name:{}}}", name))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Serialize to the wire text: the JSON envelope plus trailing newline.
    /// The NUL frame byte is appended by the channel, not here.
    pub fn to_wire(&self) -> Result<String> {
        let mut text = serde_json::to_string(self)?;
        text.push('\n');
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_is_bit_exact() {
        let request = RpcRequest::new("component.list", "");
        assert_eq!(
            request.to_wire().unwrap(),
            "{\"jsonrpc\":\"2.0\",\"method\":\"component.list\",\"params\":\"\",\"id\":1234}\n"
        );
    }

    #[test]
    fn test_scoped_params_template() {
        let request = RpcRequest::scoped("component.controls", "AmpRack1");
        assert_eq!(
            request.to_wire().unwrap(),
            "{\"jsonrpc\":\"2.0\",\"method\":\"component.controls\",\"params\":\"{name:AmpRack1}\",\"id\":1234}\n"
        );
    }
}
