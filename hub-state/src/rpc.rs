//! Seam over the RPC client
//!
//! Discovery and the scheduler talk to the hub through this trait so they
//! can be driven by a mock in tests. The real implementation builds the
//! fixed method/params dialect and extracts the payload fragment.

use rpc_channel::{RpcClient, RpcRequest};

use crate::error::{Result, StateError};

/// Enumerate the hub's attached components
pub const METHOD_LIST_COMPONENTS: &str = "component.list";
/// Fetch the control list of one named component
pub const METHOD_GET_CONTROLS: &str = "component.controls";
/// Apply a value to one control of one named component
pub const METHOD_SET_CONTROL: &str = "component.set";

/// The subset of hub RPC operations the state layer needs
pub trait HubRpc: Send + Sync {
    /// Component listing; returns the payload JSON text
    fn list_components(&self) -> Result<String>;

    /// Control list for one component; returns the payload JSON text
    fn component_controls(&self, id: &str) -> Result<String>;

    /// Apply a control value; returns the payload JSON text
    fn set_control(&self, id: &str, control: &str, value: &str) -> Result<String>;
}

impl HubRpc for RpcClient {
    fn list_components(&self) -> Result<String> {
        let fragments = self.call_request(&RpcRequest::new(METHOD_LIST_COMPONENTS, ""))?;
        payload(fragments)
    }

    fn component_controls(&self, id: &str) -> Result<String> {
        let fragments = self.call_request(&RpcRequest::scoped(METHOD_GET_CONTROLS, id))?;
        payload(fragments)
    }

    fn set_control(&self, id: &str, control: &str, value: &str) -> Result<String> {
        let params = format!("{{name:{},control:{},value:{}}}", id, control, value);
        let fragments = self.call_request(&RpcRequest::new(METHOD_SET_CONTROL, params))?;
        payload(fragments)
    }
}

/// The real reply always sits at fragment index 1 (the client normalizes
/// banner/sentinel fragments into index 0). An empty fragment list signals
/// an aborted exchange.
fn payload(mut fragments: Vec<String>) -> Result<String> {
    if fragments.len() < 2 {
        return Err(StateError::Protocol(
            "aborted exchange: no response fragments".to_string(),
        ));
    }
    Ok(fragments.swap_remove(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_fragment_one() {
        let fragments = vec!["banner".to_string(), "{\"result\":[]}".to_string()];
        assert_eq!(payload(fragments).unwrap(), "{\"result\":[]}");
    }

    #[test]
    fn test_empty_fragments_are_a_protocol_error() {
        assert!(matches!(
            payload(Vec::new()),
            Err(StateError::Protocol(_))
        ));
    }
}
