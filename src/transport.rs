//! TCP transport layer for AMS communication.
//!
//! This module provides the [`TcpTransport`] struct which owns the TCP
//! connection to an AMS router and moves whole AMS/TCP frames across it.
//! It knows about the 6-byte length prefix, not about ADS commands.
//!
//! # Design
//!
//! - **Framing only** - Each frame is `[command u16][length u32][payload]`
//! - **Synchronous** - Blocking send/receive with configurable timeout
//! - **Simple** - One socket, one remote address, no connection pooling
//!
//! # Constants
//!
//! - [`ADS_TCP_PORT`] - Default AMS router TCP port (48898)
//! - [`DEFAULT_TIMEOUT`] - Default timeout (5 seconds)
//! - [`MAX_FRAME_SIZE`] - Largest accepted frame payload (1 MiB)

use std::io::{self, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use log::{trace, warn};

use crate::error::{AdsError, Result};
use crate::header::{AmsTcpHeader, AMS_TCP_HEADER_SIZE};

/// Default AMS router TCP port.
pub const ADS_TCP_PORT: u16 = 48898;

/// Default timeout for connect and receive operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum accepted frame payload size.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Parses a router address given as `ip` or `ip:port`.
///
/// The port defaults to [`ADS_TCP_PORT`].
///
/// # Example
///
/// ```
/// use beckhoff_ads::parse_router_addr;
///
/// assert_eq!(parse_router_addr("192.168.1.20").unwrap().to_string(), "192.168.1.20:48898");
/// assert_eq!(parse_router_addr("127.0.0.1:9000").unwrap().port(), 9000);
/// assert!(parse_router_addr("plc.local").is_err());
/// ```
pub fn parse_router_addr(s: &str) -> Result<SocketAddr> {
    let s = s.trim();
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    s.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, ADS_TCP_PORT))
        .map_err(|_| AdsError::invalid_parameter("router", format!("'{s}' is not an IP address")))
}

/// One AMS/TCP frame: the prefix command plus its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmsTcpFrame {
    /// AMS/TCP command (`0x0000` for ADS traffic).
    pub command: u16,
    /// Frame payload.
    pub payload: Vec<u8>,
}

impl AmsTcpFrame {
    /// Creates a frame.
    pub fn new(command: u16, payload: Vec<u8>) -> Self {
        Self { command, payload }
    }

    /// Serializes prefix and payload into one buffer.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidParameter` if the payload exceeds [`MAX_FRAME_SIZE`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.payload.len() > MAX_FRAME_SIZE {
            return Err(AdsError::invalid_parameter(
                "payload",
                format!(
                    "{} bytes exceeds the {} byte frame limit",
                    self.payload.len(),
                    MAX_FRAME_SIZE
                ),
            ));
        }
        let header = AmsTcpHeader {
            command: self.command,
            length: self.payload.len() as u32,
        };
        let mut out = Vec::with_capacity(AMS_TCP_HEADER_SIZE + self.payload.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&self.payload);
        Ok(out)
    }
}

/// TCP transport for AMS communication.
///
/// The protocol layer doesn't know about sockets; the socket layer doesn't know ADS.
pub struct TcpTransport {
    stream: Option<TcpStream>,
    remote_addr: SocketAddr,
}

impl TcpTransport {
    /// Connects to the AMS router at `addr`.
    ///
    /// `timeout` bounds the connect itself and becomes the read/write timeout.
    ///
    /// # Errors
    ///
    /// - `AdsError::InvalidParameter` if `timeout` is zero
    /// - `AdsError::Connect` if the connection cannot be established
    pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(AdsError::invalid_parameter("timeout", "must be greater than zero"));
        }
        let connect_err = |source| AdsError::Connect { addr, source };

        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(connect_err)?;
        stream.set_read_timeout(Some(timeout)).map_err(connect_err)?;
        stream.set_write_timeout(Some(timeout)).map_err(connect_err)?;
        stream.set_nodelay(true).map_err(connect_err)?;

        trace!("connected to AMS router at {addr}");
        Ok(Self {
            stream: Some(stream),
            remote_addr: addr,
        })
    }

    fn stream(&self) -> Result<&TcpStream> {
        self.stream.as_ref().ok_or_else(|| {
            AdsError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport is closed",
            ))
        })
    }

    /// Changes the receive timeout.
    ///
    /// A zero duration is rejected by the OS, so it is raised to one millisecond.
    pub fn set_read_timeout(&self, timeout: Duration) -> Result<()> {
        let timeout = timeout.max(Duration::from_millis(1));
        self.stream()?.set_read_timeout(Some(timeout))?;
        Ok(())
    }

    /// Sends one frame.
    ///
    /// A failed write may have left part of the frame on the wire, so the
    /// connection is dropped.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::Io` on socket failure, `AdsError::Timeout` if the
    /// write blocks past the timeout.
    pub fn send(&mut self, frame: &AmsTcpFrame) -> Result<()> {
        let bytes = frame.to_bytes()?;
        trace!(
            "-> command 0x{:04X}, {} payload bytes",
            frame.command,
            frame.payload.len()
        );
        let mut stream = self.stream()?;
        let written = stream.write_all(&bytes).and_then(|()| stream.flush());
        written.map_err(|e| self.abandon(map_io_error(e)))
    }

    /// Receives one complete frame, blocking until it has fully arrived.
    ///
    /// A timeout before the first byte of a frame leaves the connection
    /// usable. Any other failure leaves the stream out of step with the
    /// frame boundaries, so the connection is dropped and [`is_open`]
    /// returns `false` afterwards.
    ///
    /// # Errors
    ///
    /// - `AdsError::Timeout` if the read timeout expires
    /// - `AdsError::InvalidResponse` if the announced length exceeds [`MAX_FRAME_SIZE`]
    /// - `AdsError::Io` if the connection is closed or reset
    ///
    /// [`is_open`]: TcpTransport::is_open
    pub fn receive(&mut self) -> Result<AmsTcpFrame> {
        let mut prefix = [0u8; AMS_TCP_HEADER_SIZE];
        let outcome = read_full(self.stream()?, &mut prefix);
        match outcome {
            Ok(()) => {}
            // Nothing consumed yet, so the stream is still aligned.
            Err((0, e)) if is_timeout(&e) => return Err(AdsError::Timeout),
            Err((_, e)) => return Err(self.abandon(map_io_error(e))),
        }
        let header = AmsTcpHeader::from_bytes(&prefix);

        let length = header.length as usize;
        if length > MAX_FRAME_SIZE {
            return Err(self.abandon(AdsError::invalid_response(format!(
                "frame length {} exceeds the {} byte limit",
                length, MAX_FRAME_SIZE
            ))));
        }

        let mut payload = vec![0u8; length];
        let outcome = read_full(self.stream()?, &mut payload);
        if let Err((_, e)) = outcome {
            return Err(self.abandon(map_io_error(e)));
        }

        trace!(
            "<- command 0x{:04X}, {} payload bytes",
            header.command,
            length
        );
        Ok(AmsTcpFrame::new(header.command, payload))
    }

    /// Drops a connection whose framing can no longer be trusted.
    fn abandon(&mut self, err: AdsError) -> AdsError {
        warn!("dropping connection to {}: {err}", self.remote_addr);
        self.close();
        err
    }

    /// Closes the connection. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // The peer may already be gone; dropping the stream releases the socket either way.
            let _ = stream.shutdown(Shutdown::Both);
            trace!("closed connection to {}", self.remote_addr);
        }
    }

    /// Returns whether the connection is still held.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Returns the router address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("remote_addr", &self.remote_addr)
            .field(
                "local_addr",
                &self.stream.as_ref().and_then(|s| s.local_addr().ok()),
            )
            .field("open", &self.is_open())
            .finish()
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

fn map_io_error(e: io::Error) -> AdsError {
    if is_timeout(&e) {
        AdsError::Timeout
    } else {
        AdsError::Io(e)
    }
}

/// Fills `buf` from `stream`. On failure, reports how many bytes had
/// already been consumed.
fn read_full(
    mut stream: &TcpStream,
    buf: &mut [u8],
) -> std::result::Result<(), (usize, io::Error)> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by peer");
                return Err((filled, eof));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err((filled, e)),
        }
    }
    Ok(())
}
