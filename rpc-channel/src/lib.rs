//! Private session-oriented RPC channel for hub communication
//!
//! This crate owns the persistent TCP session to the central audio/video
//! processing hub and the client that frames, sends, and demultiplexes
//! responses over it. The wire format is fixed to one hub's behavior:
//! JSON-RPC 2.0 envelopes terminated by a single NUL byte, with one extra
//! "banner" fragment emitted by the hub right after a (re)connect.
//!
//! This is not a general RPC framework. Calls are serialized one at a time
//! over the session; there is no multiplexing and no ordering guarantee
//! beyond that serialization.

mod channel;
mod client;
mod error;
mod request;

pub use channel::{
    ChannelConfig, ChannelStatus, ConnectionState, SessionChannel, FRAME_DELIMITER,
};
pub use client::RpcClient;
pub use error::{Result, RpcError};
pub use request::{RpcRequest, CORRELATION_ID};
