//! RPC client: drives the session channel for one call at a time
//!
//! The protocol has no multiplexing. The client holds the session's
//! exclusive lock for the whole round trip, so no two calls can interleave
//! their bytes on the wire and responses come back in request order.

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::channel::{ChannelConfig, ChannelStatus, ConnectionState, SessionChannel, FRAME_DELIMITER};
use crate::error::{Result, RpcError};
use crate::request::RpcRequest;

/// Client for the hub's NUL-framed JSON-RPC protocol
///
/// A call lazily (re)connects the channel, writes the request frame, and
/// reads response fragments. A freshly (re)established connection provokes
/// one extra "banner" fragment from the hub, so the expected fragment count
/// is 2 right after a (re)connect and 1 on an already-live connection; in
/// the latter case an empty sentinel fragment is prepended so the real
/// payload is always at index 1.
pub struct RpcClient {
    session: RwLock<SessionChannel>,
}

impl RpcClient {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            session: RwLock::new(SessionChannel::new(config)),
        }
    }

    /// Read-only copy of the channel state, taken under the shared lock
    pub fn status(&self) -> ChannelStatus {
        self.session.read().status()
    }

    /// Explicitly open the channel (calls also connect lazily)
    pub fn connect(&self) -> Result<()> {
        self.session.write().connect()
    }

    /// Close and discard the channel
    pub fn disconnect(&self) {
        self.session.write().disconnect();
    }

    /// Build the envelope for `request` and issue it
    pub fn call_request(&self, request: &RpcRequest) -> Result<Vec<String>> {
        let wire = request.to_wire()?;
        debug!(method = request.method(), "issuing rpc call");
        self.call(&wire)
    }

    /// Issue one raw request and return the normalized response fragments.
    ///
    /// A command failure from the hub is surfaced immediately with the
    /// connection left intact. A transport failure tears the channel down
    /// and the call is retried exactly once on a fresh connection; a second
    /// failure propagates to the caller. Configuration errors (bad port,
    /// unresolvable address) are never retried.
    pub fn call(&self, request_text: &str) -> Result<Vec<String>> {
        if request_text.trim().is_empty() {
            return Err(RpcError::InvalidRequest(
                "request text must not be empty".to_string(),
            ));
        }

        // Exclusive for the whole round trip: full mutual exclusion with
        // connect/disconnect and with every other in-flight call.
        let mut session = self.session.write();

        match Self::attempt(&mut session, request_text) {
            Ok(fragments) => Ok(fragments),
            Err(err) if err.is_command_failure() => {
                warn!(error = %err, "hub rejected command");
                Err(err)
            }
            Err(first) if first.is_transient() => {
                warn!(error = %first, "rpc attempt failed, retrying on a fresh connection");
                Self::attempt(&mut session, request_text)
            }
            Err(err) => Err(err),
        }
    }

    /// One request/response exchange on the locked session
    fn attempt(session: &mut SessionChannel, request_text: &str) -> Result<Vec<String>> {
        // Computed before the lazy connect: a live channel answers with one
        // fragment, a (re)connect provokes the hub's banner as well.
        let expected = if session.is_live() { 1 } else { 2 };

        session.connect()?;

        if let Err(err) = session.write_frame(request_text.as_bytes()) {
            session.teardown(ConnectionState::Failed, Some(err.to_string()));
            return Err(err);
        }

        let buffer = match session.read_fragments(expected) {
            Ok(buffer) => buffer,
            Err(err) => {
                let state = if err.is_timeout() {
                    ConnectionState::Unknown
                } else {
                    ConnectionState::Failed
                };
                session.teardown(state, Some(err.to_string()));
                return Err(err);
            }
        };

        let fragments = normalize_fragments(&buffer, expected);
        if let Some(err) = classify_command_failure(&fragments) {
            // Domain rejection: connection state stays untouched
            return Err(err);
        }

        session.touch();
        Ok(fragments)
    }
}

/// Split the raw buffer on the frame delimiter into ordered fragments.
///
/// A buffer without any delimiter signals a malformed/aborted exchange and
/// yields an empty list. When only one fragment was expected (live
/// connection, no banner) an empty sentinel is prepended so callers can
/// always index the real payload at position 1.
fn normalize_fragments(buffer: &[u8], expected: usize) -> Vec<String> {
    if !buffer.contains(&FRAME_DELIMITER) {
        return Vec::new();
    }

    let mut fragments: Vec<String> = buffer
        .split(|byte| *byte == FRAME_DELIMITER)
        .map(|piece| String::from_utf8_lossy(piece).into_owned())
        .collect();
    // Remainder after the final delimiter; empty on a clean read
    fragments.pop();

    if expected == 1 {
        fragments.insert(0, String::new());
    }
    fragments
}

/// Detect an explicit rejection in the payload fragment
fn classify_command_failure(fragments: &[String]) -> Option<RpcError> {
    let payload = fragments.get(1)?;
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    let error = value.get("error")?;

    let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(RpcError::CommandFailed { code, message })
}
