//! High-level ADS client for reading and writing PLC symbols.
//!
//! This module provides the [`Client`] struct, which is the primary interface
//! for talking to a TwinCAT PLC through an AMS router.
//!
//! # Overview
//!
//! The client composes the lower layers:
//! - [`Session`] for the router connection and invoke-id correlation
//! - [`resolve`](crate::resolve) for name lookups
//! - [`AdsValue`] for decoding the returned bytes
//!
//! # Lifecycle
//!
//! ```text
//! Closed --open()--> Open --close()--> Closed
//! ```
//!
//! Reading while `Closed`, or calling `open` while `Open`, fails with
//! [`AdsError::InvalidState`]. Dropping an open client closes it.
//!
//! # Example
//!
//! ```no_run
//! use beckhoff_ads::{Client, ClientConfig};
//!
//! let target = "172.18.236.210.1.1:851".parse()?;
//! let mut client = Client::new(ClientConfig::new(target));
//! client.open()?;
//!
//! let temperature: f32 = client.read_tag("MAIN.Temperature")?;
//! println!("{temperature}");
//!
//! client.write_tag("MAIN.Setpoint", 21.0)?;
//! client.close();
//! # Ok::<(), beckhoff_ads::AdsError>(())
//! ```
//!
//! # Thread Safety
//!
//! Every operation takes `&mut self` and blocks until its round trip
//! completes or times out. To read several tags concurrently, open one
//! client per thread; each gets its own connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::debug;

use crate::address::AmsAddr;
use crate::command::{ReadCommand, ReadDeviceInfoCommand, ReadStateCommand, WriteCommand};
use crate::error::{AdsError, Result};
use crate::response::{
    parse_device_info_response, parse_read_response, parse_read_state_response,
    parse_write_response, AdsState, DeviceInfo,
};
use crate::session::Session;
use crate::symbol::{self, SymbolEntry, TagAddress};
use crate::transport::{ADS_TCP_PORT, DEFAULT_TIMEOUT};
use crate::value::{decode_f32, AdsType, AdsValue};

/// Configuration for creating an ADS client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// AMS router TCP address.
    pub router_addr: SocketAddr,
    /// Target endpoint (PLC Net ID and port).
    pub target: AmsAddr,
    /// Local endpoint; negotiated with the router when `None`.
    pub source: Option<AmsAddr>,
    /// Timeout for connecting and for each request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration that reaches `target` through the local router.
    ///
    /// # Example
    ///
    /// ```
    /// use beckhoff_ads::{ClientConfig, ADS_TCP_PORT};
    ///
    /// let config = ClientConfig::new("5.1.2.3.1.1:851".parse().unwrap());
    /// assert_eq!(config.router_addr.port(), ADS_TCP_PORT);
    /// assert!(config.source.is_none());
    /// ```
    pub fn new(target: AmsAddr) -> Self {
        Self {
            router_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, ADS_TCP_PORT)),
            target,
            source: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the router address (default `127.0.0.1:48898`).
    pub fn with_router(mut self, router_addr: SocketAddr) -> Self {
        self.router_addr = router_addr;
        self
    }

    /// Sets the router host, keeping the default port.
    ///
    /// # Example
    ///
    /// ```
    /// use beckhoff_ads::ClientConfig;
    /// use std::net::Ipv4Addr;
    ///
    /// let config = ClientConfig::new("5.1.2.3.1.1:851".parse().unwrap())
    ///     .with_router_ip(Ipv4Addr::new(192, 168, 1, 20).into());
    /// assert_eq!(config.router_addr.to_string(), "192.168.1.20:48898");
    /// ```
    pub fn with_router_ip(mut self, ip: IpAddr) -> Self {
        self.router_addr.set_ip(ip);
        self
    }

    /// Uses a fixed local endpoint instead of negotiating one.
    ///
    /// Needed when talking directly to a remote PLC router that has a
    /// static route configured for this address.
    pub fn with_source(mut self, source: AmsAddr) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets a custom timeout (default is 5 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// ADS client for one PLC endpoint.
///
/// Each operation produces its requests synchronously. No automatic
/// retries, caching, or reconnection; symbols are resolved on every call.
pub struct Client {
    config: ClientConfig,
    session: Option<Session>,
}

impl Client {
    /// Creates a closed client.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Opens the session.
    ///
    /// A client whose connection was dropped after a transport error can be
    /// opened again.
    ///
    /// # Errors
    ///
    /// - `AdsError::InvalidState` if the client is already open
    /// - `AdsError::InvalidParameter` if the configured timeout is zero
    /// - `AdsError::Connect` / `AdsError::Timeout` from the session
    pub fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(AdsError::invalid_state("client is already open"));
        }
        self.close();
        let session = Session::open(
            self.config.router_addr,
            self.config.target,
            self.config.source,
            self.config.timeout,
        )?;
        self.session = Some(session);
        Ok(())
    }

    /// Closes the session. Does nothing when already closed.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }

    /// Returns whether the client is open.
    ///
    /// Turns `false` on its own when a transport error drops the connection.
    pub fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_open)
    }

    /// Returns the local endpoint while open.
    pub fn local_addr(&self) -> Option<AmsAddr> {
        self.session.as_ref().map(Session::local_addr)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn session(&mut self) -> Result<&mut Session> {
        self.session
            .as_mut()
            .ok_or_else(|| AdsError::invalid_state("client is not open"))
    }

    /// Looks up the symbol entry for `name`.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::SymbolNotFound` if the PLC does not know the name.
    pub fn resolve(&mut self, name: &str) -> Result<SymbolEntry> {
        symbol::resolve(self.session()?, name)
    }

    /// Reads `length` raw bytes at a numeric address.
    pub fn read(&mut self, address: TagAddress, length: u32) -> Result<Vec<u8>> {
        let cmd = ReadCommand::new(address.index_group, address.index_offset, length)?;
        let response = self.session()?.invoke(cmd.command_id(), &cmd.to_bytes())?;
        parse_read_response(&response)
    }

    /// Writes raw bytes at a numeric address.
    pub fn write(&mut self, address: TagAddress, data: &[u8]) -> Result<()> {
        let cmd = WriteCommand::new(address.index_group, address.index_offset, data)?;
        let response = self.session()?.invoke(cmd.command_id(), &cmd.to_bytes())?;
        parse_write_response(&response)
    }

    /// Reads a REAL symbol.
    ///
    /// # Errors
    ///
    /// - `AdsError::InvalidState` if the client is not open
    /// - `AdsError::SymbolNotFound` if the name does not resolve
    /// - `AdsError::Decode` if the symbol is not 4 bytes wide
    /// - any transport or protocol error, unchanged
    pub fn read_tag(&mut self, name: &str) -> Result<f32> {
        let entry = self.resolve_sized(name, AdsType::Real)?;
        let bytes = self.read(entry.address(), AdsType::Real.size() as u32)?;
        decode_f32(&bytes)
    }

    /// Writes a REAL symbol.
    pub fn write_tag(&mut self, name: &str, value: f32) -> Result<()> {
        self.write_by_name(name, &AdsValue::Real(value))
    }

    /// Reads a symbol as the given scalar type.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use beckhoff_ads::{AdsType, AdsValue, Client, ClientConfig};
    ///
    /// let mut client = Client::new(ClientConfig::new("5.1.2.3.1.1:851".parse()?));
    /// client.open()?;
    /// if let AdsValue::DInt(count) = client.read_by_name("MAIN.nCount", AdsType::DInt)? {
    ///     println!("{count}");
    /// }
    /// # Ok::<(), beckhoff_ads::AdsError>(())
    /// ```
    pub fn read_by_name(&mut self, name: &str, ty: AdsType) -> Result<AdsValue> {
        let entry = self.resolve_sized(name, ty)?;
        let bytes = self.read(entry.address(), ty.size() as u32)?;
        AdsValue::decode(ty, &bytes)
    }

    /// Writes a scalar value to a symbol.
    pub fn write_by_name(&mut self, name: &str, value: &AdsValue) -> Result<()> {
        let entry = self.resolve_sized(name, value.ads_type())?;
        self.write(entry.address(), &value.to_bytes())
    }

    /// Resolves `name` and checks that its size matches `ty`.
    fn resolve_sized(&mut self, name: &str, ty: AdsType) -> Result<SymbolEntry> {
        let entry = self.resolve(name)?;
        if entry.size as usize != ty.size() {
            return Err(AdsError::decode(format!(
                "symbol '{}' is {} bytes ({}), {} needs {}",
                name,
                entry.size,
                entry.type_name,
                ty,
                ty.size()
            )));
        }
        debug!("{name}: {ty} at {}", entry.address());
        Ok(entry)
    }

    /// Reads the ADS state and device state.
    pub fn read_state(&mut self) -> Result<(AdsState, u16)> {
        let cmd = ReadStateCommand;
        let response = self.session()?.invoke(cmd.command_id(), &cmd.to_bytes())?;
        parse_read_state_response(&response)
    }

    /// Reads the device name and version.
    pub fn read_device_info(&mut self) -> Result<DeviceInfo> {
        let cmd = ReadDeviceInfoCommand;
        let response = self.session()?.invoke(cmd.command_id(), &cmd.to_bytes())?;
        parse_device_info_response(&response)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AmsNetId;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn target() -> AmsAddr {
        AmsAddr::new(AmsNetId::new([172, 18, 236, 210, 1, 1]), 851)
    }

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new(target());

        assert_eq!(config.router_addr.ip(), Ipv4Addr::LOCALHOST);
        assert_eq!(config.router_addr.port(), ADS_TCP_PORT);
        assert_eq!(config.target, target());
        assert!(config.source.is_none());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_client_config_builders() {
        let source = AmsAddr::new(AmsNetId::new([10, 0, 0, 9, 1, 1]), 30000);
        let config = ClientConfig::new(target())
            .with_router("10.0.0.5:48898".parse().unwrap())
            .with_source(source)
            .with_timeout(Duration::from_millis(250));

        assert_eq!(config.router_addr.to_string(), "10.0.0.5:48898");
        assert_eq!(config.source, Some(source));
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_read_before_open() {
        let mut client = Client::new(ClientConfig::new(target()));
        assert!(!client.is_open());

        let err = client.read_tag("MAIN.Temperature").unwrap_err();
        assert!(matches!(err, AdsError::InvalidState { .. }));
        assert!(matches!(
            client.read_state(),
            Err(AdsError::InvalidState { .. })
        ));
        assert!(matches!(
            client.write_tag("MAIN.Setpoint", 1.0),
            Err(AdsError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_open_twice() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let source = AmsAddr::new(AmsNetId::new([127, 0, 0, 1, 1, 1]), 30000);
        let config = ClientConfig::new(target())
            .with_router(listener.local_addr().unwrap())
            .with_source(source);

        let mut client = Client::new(config);
        client.open().unwrap();
        assert!(client.is_open());
        assert_eq!(client.local_addr(), Some(source));

        let err = client.open().unwrap_err();
        assert!(matches!(err, AdsError::InvalidState { .. }));
        assert!(client.is_open());

        client.close();
        client.close();
        assert!(!client.is_open());
        assert_eq!(client.local_addr(), None);
    }

    #[test]
    fn test_open_refused_leaves_client_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut client = Client::new(ClientConfig::new(target()).with_router(addr));
        assert!(matches!(client.open(), Err(AdsError::Connect { .. })));
        assert!(!client.is_open());
    }

    #[test]
    fn test_open_rejects_zero_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ClientConfig::new(target())
            .with_router(listener.local_addr().unwrap())
            .with_timeout(Duration::ZERO);

        let mut client = Client::new(config);
        assert!(matches!(
            client.open(),
            Err(AdsError::InvalidParameter { .. })
        ));
        assert!(!client.is_open());
    }

    #[test]
    fn test_reopen_after_dropped_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let source = AmsAddr::new(AmsNetId::new([127, 0, 0, 1, 1, 1]), 30000);
        let config = ClientConfig::new(target())
            .with_router(listener.local_addr().unwrap())
            .with_source(source)
            .with_timeout(Duration::from_secs(2));

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 6 + 32];
            stream.read_exact(&mut request).unwrap();
            // A length no AMS frame can have.
            stream.write_all(&[0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x7F]).unwrap();
            let (_second, _) = listener.accept().unwrap();
        });

        let mut client = Client::new(config);
        client.open().unwrap();
        assert!(matches!(
            client.read_state(),
            Err(AdsError::InvalidResponse { .. })
        ));
        assert!(!client.is_open());
        assert!(matches!(
            client.read_state(),
            Err(AdsError::InvalidState { .. })
        ));

        client.open().unwrap();
        assert!(client.is_open());

        server.join().unwrap();
    }

    #[test]
    fn test_client_debug() {
        let client = Client::new(ClientConfig::new(target()));
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("Client"));
    }
}
