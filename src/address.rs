//! AMS addressing: Net IDs and endpoints.
//!
//! Every participant on an AMS network is identified by an [`AmsNetId`]
//! (six octets, usually written like an IP address with two extra parts)
//! and an AMS port. The pair forms an [`AmsAddr`].
//!
//! | Port | Service |
//! |------|---------|
//! | 851 | TwinCAT 3 PLC runtime 1 |
//! | 801 | TwinCAT 2 PLC runtime 1 |
//! | 10000 | System service |
//!
//! # Example
//!
//! ```
//! use beckhoff_ads::{AmsAddr, AmsNetId, PORT_TC3PLC1};
//!
//! let addr: AmsAddr = "172.18.236.210.1.1:851".parse().unwrap();
//! assert_eq!(addr.net_id(), AmsNetId::new([172, 18, 236, 210, 1, 1]));
//! assert_eq!(addr.port(), PORT_TC3PLC1);
//! assert_eq!(addr.to_string(), "172.18.236.210.1.1:851");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{AdsError, Result};

/// Serialized size of an [`AmsNetId`].
pub const AMS_NET_ID_SIZE: usize = 6;

/// Serialized size of an [`AmsAddr`] (Net ID + port).
pub const AMS_ADDR_SIZE: usize = 8;

/// TwinCAT 3 PLC runtime 1.
pub const PORT_TC3PLC1: u16 = 851;

/// TwinCAT 2 PLC runtime 1.
pub const PORT_TC2PLC1: u16 = 801;

/// TwinCAT system service.
pub const PORT_SYSTEM_SERVICE: u16 = 10000;

/// Six-part AMS network identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AmsNetId([u8; AMS_NET_ID_SIZE]);

impl AmsNetId {
    /// Creates a Net ID from its six octets.
    pub const fn new(parts: [u8; AMS_NET_ID_SIZE]) -> Self {
        Self(parts)
    }

    /// Derives the conventional Net ID for a host IPv4 address (`ip.1.1`).
    ///
    /// # Example
    ///
    /// ```
    /// use beckhoff_ads::AmsNetId;
    /// use std::net::Ipv4Addr;
    ///
    /// let id = AmsNetId::from_ipv4(Ipv4Addr::new(192, 168, 1, 20));
    /// assert_eq!(id.to_string(), "192.168.1.20.1.1");
    /// ```
    pub fn from_ipv4(ip: std::net::Ipv4Addr) -> Self {
        let [a, b, c, d] = ip.octets();
        Self([a, b, c, d, 1, 1])
    }

    /// Returns the six octets.
    pub fn octets(&self) -> [u8; AMS_NET_ID_SIZE] {
        self.0
    }

    /// Parses a Net ID from its 6-byte wire form.
    pub(crate) fn from_slice(data: &[u8]) -> Result<Self> {
        let parts: [u8; AMS_NET_ID_SIZE] = data
            .get(..AMS_NET_ID_SIZE)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                AdsError::invalid_response(format!(
                    "AMS Net ID needs {} bytes, got {}",
                    AMS_NET_ID_SIZE,
                    data.len()
                ))
            })?;
        Ok(Self(parts))
    }
}

impl fmt::Display for AmsNetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a}.{b}.{c}.{d}.{e}.{g}")
    }
}

impl FromStr for AmsNetId {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = [0u8; AMS_NET_ID_SIZE];
        let mut count = 0;

        for piece in s.trim().split('.') {
            if count == AMS_NET_ID_SIZE {
                return Err(AdsError::invalid_address(s, "expected 6 parts"));
            }
            parts[count] = piece.parse::<u8>().map_err(|_| {
                AdsError::invalid_address(s, format!("'{piece}' is not a number in 0-255"))
            })?;
            count += 1;
        }

        if count != AMS_NET_ID_SIZE {
            return Err(AdsError::invalid_address(s, "expected 6 parts"));
        }
        Ok(Self(parts))
    }
}

/// A logical endpoint on the AMS network: Net ID plus port.
///
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AmsAddr {
    net_id: AmsNetId,
    port: u16,
}

impl AmsAddr {
    /// Creates an endpoint.
    pub const fn new(net_id: AmsNetId, port: u16) -> Self {
        Self { net_id, port }
    }

    /// Returns the Net ID.
    pub fn net_id(&self) -> AmsNetId {
        self.net_id
    }

    /// Returns the AMS port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parses an endpoint, using `default_port` when the text has no `:port` suffix.
    ///
    /// # Example
    ///
    /// ```
    /// use beckhoff_ads::{AmsAddr, PORT_TC3PLC1};
    ///
    /// let addr = AmsAddr::parse_with_default_port("5.1.2.3.1.1", PORT_TC3PLC1).unwrap();
    /// assert_eq!(addr.port(), 851);
    /// ```
    pub fn parse_with_default_port(s: &str, default_port: u16) -> Result<Self> {
        match s.trim().split_once(':') {
            Some((net_id, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| AdsError::invalid_address(s, format!("invalid port '{port}'")))?;
                Ok(Self::new(net_id.parse()?, port))
            }
            None => Ok(Self::new(s.parse()?, default_port)),
        }
    }

    /// Serializes to the 8-byte wire form (Net ID, port little endian).
    pub fn to_bytes(self) -> [u8; AMS_ADDR_SIZE] {
        let mut out = [0u8; AMS_ADDR_SIZE];
        out[..AMS_NET_ID_SIZE].copy_from_slice(&self.net_id.0);
        out[AMS_NET_ID_SIZE..].copy_from_slice(&self.port.to_le_bytes());
        out
    }

    /// Parses the 8-byte wire form.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidResponse` if fewer than 8 bytes are given.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < AMS_ADDR_SIZE {
            return Err(AdsError::invalid_response(format!(
                "AMS address needs {} bytes, got {}",
                AMS_ADDR_SIZE,
                data.len()
            )));
        }
        let net_id = AmsNetId::from_slice(&data[..AMS_NET_ID_SIZE])?;
        let port = u16::from_le_bytes([data[6], data[7]]);
        Ok(Self::new(net_id, port))
    }
}

impl fmt::Display for AmsAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.net_id, self.port)
    }
}

impl FromStr for AmsAddr {
    type Err = AdsError;

    /// Parses `a.b.c.d.e.f:port`. The port is mandatory here; see
    /// [`AmsAddr::parse_with_default_port`] for the lenient form.
    fn from_str(s: &str) -> Result<Self> {
        if !s.contains(':') {
            return Err(AdsError::invalid_address(s, "missing ':port'"));
        }
        Self::parse_with_default_port(s, 0)
    }
}
