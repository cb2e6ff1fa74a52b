//! TCP session channel to the hub
//!
//! Owns the single TCP connection the RPC client drives. The channel is
//! created lazily on first use, torn down on any unrecoverable I/O error,
//! and re-created transparently by the next call.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use socket2::SockRef;
use tracing::{debug, trace};

use crate::error::{Result, RpcError};

/// Framing delimiter for the hub's wire protocol. Terminates every request
/// and every response fragment; never part of the payload.
pub const FRAME_DELIMITER: u8 = 0x00;

/// Connection state of the session channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection is open
    Disconnected,
    /// A connection is open and healthy
    Connected,
    /// The last I/O operation failed and the connection was discarded
    Failed,
    /// A read timed out; the hub may or may not still be healthy
    Unknown,
}

/// Immutable copy of the channel's state record
///
/// Handed out to callers so readers never observe a half-updated record;
/// the live record is only mutated under the session's exclusive lock.
#[derive(Debug, Clone)]
pub struct ChannelStatus {
    pub state: ConnectionState,
    pub last_activity: Option<Instant>,
    pub last_error: Option<String>,
}

impl ChannelStatus {
    fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            last_activity: None,
            last_error: None,
        }
    }
}

/// Configuration for a session channel
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Hub hostname or IP
    pub host: String,
    /// Hub RPC port
    pub port: u16,
    /// Timeout for establishing the TCP connection
    pub connect_timeout: Duration,
    /// Socket-level read timeout; the read loop wakes at this interval to
    /// check the absolute deadline
    pub read_poll: Duration,
    /// Absolute per-call read deadline, computed once at the start of a read
    pub read_deadline: Duration,
}

impl ChannelConfig {
    /// Create a config with the fixed protocol timeouts
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        if port == 0 {
            return Err(RpcError::Config(format!("invalid hub port: {}", port)));
        }
        Ok(Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(5),
            read_poll: Duration::from_secs(1),
            read_deadline: Duration::from_secs(30),
        })
    }
}

/// One TCP session to the hub
///
/// All mutation happens through `&mut self`; the owning [`RpcClient`]
/// wraps the channel in a `parking_lot::RwLock` so state transitions only
/// occur while holding the exclusive side.
///
/// [`RpcClient`]: crate::RpcClient
pub struct SessionChannel {
    config: ChannelConfig,
    stream: Option<TcpStream>,
    status: ChannelStatus,
}

impl SessionChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            stream: None,
            status: ChannelStatus::new(),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Whether a handle exists and the transport still reports a peer
    pub fn is_live(&self) -> bool {
        match &self.stream {
            Some(stream) => stream.peer_addr().is_ok(),
            None => false,
        }
    }

    /// Immutable copy of the current state record
    pub fn status(&self) -> ChannelStatus {
        self.status.clone()
    }

    /// Open the TCP connection if none is open.
    ///
    /// Configures the socket for low-latency delivery (TCP_NODELAY),
    /// keep-alive, urgent-data inline delivery, and a bounded read timeout.
    /// On any failure the channel is fully torn down before the error is
    /// returned; no handle leaks.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_live() {
            return Ok(());
        }

        match self.try_connect() {
            Ok(stream) => {
                debug!(host = %self.config.host, port = self.config.port, "session channel connected");
                self.stream = Some(stream);
                self.status.state = ConnectionState::Connected;
                self.status.last_error = None;
                Ok(())
            }
            Err(err) => {
                self.teardown(ConnectionState::Failed, Some(err.to_string()));
                Err(err)
            }
        }
    }

    fn try_connect(&self) -> Result<TcpStream> {
        let addr = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                RpcError::Config(format!(
                    "hub address did not resolve: {}:{}",
                    self.config.host, self.config.port
                ))
            })?;

        let stream = TcpStream::connect_timeout(&addr, self.config.connect_timeout)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(self.config.read_poll))?;

        let sock = SockRef::from(&stream);
        sock.set_keepalive(true)?;
        sock.set_out_of_band_inline(true)?;

        Ok(stream)
    }

    /// Close and discard the connection unconditionally
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.status.state = ConnectionState::Disconnected;
    }

    /// Discard the connection after a failure, recording the cause
    pub(crate) fn teardown(&mut self, state: ConnectionState, error: Option<String>) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.status.state = state;
        if error.is_some() {
            self.status.last_error = error;
        }
    }

    /// Record successful traffic on the channel
    pub(crate) fn touch(&mut self) {
        self.status.last_activity = Some(Instant::now());
    }

    /// Write one request frame: the payload followed by the delimiter byte
    pub(crate) fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(RpcError::Disconnected)?;
        stream.write_all(payload)?;
        stream.write_all(&[FRAME_DELIMITER])?;
        stream.flush()?;
        trace!(bytes = payload.len(), "request frame written");
        Ok(())
    }

    /// Read byte-by-byte until `expected` delimiter bytes have arrived.
    ///
    /// The deadline is absolute: computed once here, not renewed per byte.
    /// Elapsing it, or the stream ending, is a fatal read error for the call.
    pub(crate) fn read_fragments(&mut self, expected: usize) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.config.read_deadline;
        let stream = self.stream.as_mut().ok_or(RpcError::Disconnected)?;

        let mut buffer = Vec::new();
        let mut seen = 0usize;
        let mut byte = [0u8; 1];

        while seen < expected {
            if Instant::now() >= deadline {
                return Err(RpcError::Deadline(self.config.read_deadline));
            }
            match stream.read(&mut byte) {
                Ok(0) => return Err(RpcError::Disconnected),
                Ok(_) => {
                    if byte[0] == FRAME_DELIMITER {
                        seen += 1;
                    }
                    buffer.push(byte[0]);
                }
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.kind() == std::io::ErrorKind::TimedOut =>
                {
                    // Socket-level poll expired; loop back to the deadline check
                    continue;
                }
                Err(err) => return Err(RpcError::Io(err)),
            }
        }

        trace!(bytes = buffer.len(), fragments = seen, "response read complete");
        Ok(buffer)
    }
}
