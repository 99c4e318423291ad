//! Router sessions: port negotiation and request/response correlation.
//!
//! A [`Session`] owns one [`TcpTransport`] to an AMS router and speaks for
//! one local AMS address. Every ADS request gets a fresh invoke id; the
//! session then reads frames until the response carrying that id arrives.
//! Anything else that shows up in the meantime (late answers to requests
//! that already timed out, router notes) is logged and dropped.
//!
//! Only one request is in flight at a time: [`Session::invoke`] takes
//! `&mut self`, so the borrow checker rules out pipelining.
//!
//! # Local address
//!
//! When no source address is configured, the session asks the router for
//! one with the AMS/TCP "port connect" command. The router answers with the
//! 8-byte AMS address (its own Net ID plus a freshly allocated port) and the
//! port is released again when the session closes.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::address::AmsAddr;
use crate::command::AdsCommand;
use crate::error::{AdsError, Result};
use crate::header::{
    AmsHeader, AMS_HEADER_SIZE, AMS_TCP_PORT_AMS_CMD, AMS_TCP_PORT_CLOSE, AMS_TCP_PORT_CONNECT,
};
use crate::transport::{AmsTcpFrame, TcpTransport};

/// An open logical connection to one ADS target.
pub struct Session {
    transport: TcpTransport,
    target: AmsAddr,
    source: AmsAddr,
    negotiated: bool,
    invoke_id: u32,
    timeout: Duration,
}

impl Session {
    /// Connects to the router at `router_addr` and prepares to talk to `target`.
    ///
    /// If `source` is `None` a local AMS address is negotiated with the router.
    /// On any failure the connection is released before returning.
    ///
    /// # Errors
    ///
    /// - `AdsError::Connect` if the router is unreachable
    /// - `AdsError::Timeout` if the router does not answer the port request
    pub fn open(
        router_addr: SocketAddr,
        target: AmsAddr,
        source: Option<AmsAddr>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut transport = TcpTransport::connect(router_addr, timeout)?;

        let (source, negotiated) = match source {
            Some(source) => (source, false),
            None => (port_connect(&mut transport, timeout)?, true),
        };
        debug!("session open: {source} -> {target} via {router_addr}");

        Ok(Self {
            transport,
            target,
            source,
            negotiated,
            invoke_id: 0,
            timeout,
        })
    }

    /// Generates the next invoke id. Zero is skipped.
    fn next_invoke_id(&mut self) -> u32 {
        self.invoke_id = self.invoke_id.wrapping_add(1);
        if self.invoke_id == 0 {
            self.invoke_id = 1;
        }
        self.invoke_id
    }

    /// Sends one ADS request and waits for its response data.
    ///
    /// # Errors
    ///
    /// - `AdsError::Protocol` if the AMS header carries a non-zero error code
    /// - `AdsError::Timeout` if no matching response arrives within the timeout
    /// - `AdsError::InvalidResponse` for malformed frames
    /// - `AdsError::Io` if the connection breaks
    /// - `AdsError::InvalidState` if the session is closed
    ///
    /// After any error other than a clean timeout the connection is dropped
    /// and every later call fails with `InvalidState`.
    pub fn invoke(&mut self, command: AdsCommand, data: &[u8]) -> Result<Vec<u8>> {
        if !self.transport.is_open() {
            return Err(AdsError::invalid_state(
                "session is closed; the connection must be reopened",
            ));
        }

        let invoke_id = self.next_invoke_id();
        let header = AmsHeader::new_request(
            self.target,
            self.source,
            command.id(),
            data.len() as u32,
            invoke_id,
        );

        let mut payload = Vec::with_capacity(AMS_HEADER_SIZE + data.len());
        payload.extend_from_slice(&header.to_bytes());
        payload.extend_from_slice(data);
        self.transport
            .send(&AmsTcpFrame::new(AMS_TCP_PORT_AMS_CMD, payload))?;
        trace!("invoke {invoke_id}: {command:?} with {} bytes", data.len());

        let deadline = Instant::now() + self.timeout;
        loop {
            let frame = receive_before(&mut self.transport, deadline)?;
            if frame.command != AMS_TCP_PORT_AMS_CMD {
                debug!(
                    "ignoring AMS/TCP command 0x{:04X} while waiting for invoke {invoke_id}",
                    frame.command
                );
                continue;
            }

            let response = AmsHeader::from_bytes(&frame.payload)?;
            if !response.is_response() || response.invoke_id != invoke_id {
                warn!(
                    "discarding stale frame: invoke id {}, expected {}",
                    response.invoke_id, invoke_id
                );
                continue;
            }

            if response.error_code != 0 {
                return Err(AdsError::protocol(response.error_code));
            }

            let body = &frame.payload[AMS_HEADER_SIZE..];
            if body.len() != response.data_length as usize {
                return Err(AdsError::invalid_response(format!(
                    "AMS header announces {} data bytes but frame carries {}",
                    response.data_length,
                    body.len()
                )));
            }
            return Ok(body.to_vec());
        }
    }

    /// Returns the target endpoint.
    pub fn target(&self) -> AmsAddr {
        self.target
    }

    /// Returns the local endpoint this session sends from.
    pub fn local_addr(&self) -> AmsAddr {
        self.source
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns whether the transport is still held.
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Releases the negotiated router port (if any) and closes the connection.
    ///
    /// Safe to call more than once.
    pub fn close(&mut self) {
        if !self.transport.is_open() {
            return;
        }
        if self.negotiated {
            release_port(&mut self.transport, self.source.port());
        }
        self.transport.close();
        debug!("session closed: {} -> {}", self.source, self.target);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("target", &self.target)
            .field("source", &self.source)
            .field("invoke_id", &self.invoke_id)
            .finish()
    }
}

/// Asks the router at `router_addr` for the local AMS address.
///
/// Opens a router port, reads the address the router assigned to it and
/// releases the port again. The Net ID of the result is the router's own.
///
/// # Errors
///
/// Returns `AdsError::Connect` if the router is unreachable and
/// `AdsError::Timeout` if it does not answer.
pub fn router_address(router_addr: SocketAddr, timeout: Duration) -> Result<AmsAddr> {
    let mut transport = TcpTransport::connect(router_addr, timeout)?;
    let result = port_connect(&mut transport, timeout);
    if let Ok(addr) = &result {
        release_port(&mut transport, addr.port());
    }
    transport.close();
    result
}

fn receive_before(transport: &mut TcpTransport, deadline: Instant) -> Result<AmsTcpFrame> {
    let remaining = deadline
        .checked_duration_since(Instant::now())
        .filter(|d| !d.is_zero())
        .ok_or(AdsError::Timeout)?;
    transport.set_read_timeout(remaining)?;
    transport.receive()
}

fn port_connect(transport: &mut TcpTransport, timeout: Duration) -> Result<AmsAddr> {
    // Requested port 0 lets the router choose.
    transport.send(&AmsTcpFrame::new(
        AMS_TCP_PORT_CONNECT,
        0u16.to_le_bytes().to_vec(),
    ))?;

    let deadline = Instant::now() + timeout;
    loop {
        let frame = receive_before(transport, deadline)?;
        if frame.command == AMS_TCP_PORT_CONNECT {
            let addr = AmsAddr::from_bytes(&frame.payload)?;
            debug!("router assigned local address {addr}");
            return Ok(addr);
        }
        warn!(
            "ignoring AMS/TCP command 0x{:04X} during port negotiation",
            frame.command
        );
    }
}

fn release_port(transport: &mut TcpTransport, port: u16) {
    let frame = AmsTcpFrame::new(AMS_TCP_PORT_CLOSE, port.to_le_bytes().to_vec());
    if let Err(e) = transport.send(&frame) {
        debug!("could not release router port {port}: {e}");
    }
}
