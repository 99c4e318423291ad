//! AMS/TCP and AMS header structures.
//!
//! Every message on an ADS TCP connection starts with a 6-byte AMS/TCP
//! prefix. For ADS traffic the payload then begins with a 32-byte AMS header.
//! All multi-byte fields are little endian.
//!
//! # AMS/TCP prefix
//!
//! | Bytes | Field | Description |
//! |-------|-------|-------------|
//! | 0-1 | Command | `0x0000` ADS traffic, `0x1000` port connect, ... |
//! | 2-5 | Length | Payload length in bytes |
//!
//! # AMS header
//!
//! | Bytes | Field | Description |
//! |-------|-------|-------------|
//! | 0-5 | Target Net ID | |
//! | 6-7 | Target port | |
//! | 8-13 | Source Net ID | |
//! | 14-15 | Source port | |
//! | 16-17 | Command ID | ADS command (Read, Write, ...) |
//! | 18-19 | State flags | `0x0004` request, `0x0005` response |
//! | 20-23 | Data length | Bytes following the header |
//! | 24-27 | Error code | AMS-level return code |
//! | 28-31 | Invoke ID | Correlates responses with requests |
//!
//! # Example
//!
//! ```
//! use beckhoff_ads::{AmsAddr, AmsHeader, AMS_HEADER_SIZE};
//!
//! let target: AmsAddr = "10.0.0.5.1.1:851".parse().unwrap();
//! let source: AmsAddr = "10.0.0.9.1.1:32905".parse().unwrap();
//!
//! let header = AmsHeader::new_request(target, source, 0x0002, 12, 1);
//! let bytes = header.to_bytes();
//! assert_eq!(bytes.len(), AMS_HEADER_SIZE);
//! assert_eq!(AmsHeader::from_bytes(&bytes).unwrap(), header);
//! ```

use crate::address::{AmsAddr, AMS_ADDR_SIZE};
use crate::error::{AdsError, Result};

/// AMS/TCP prefix size in bytes.
pub const AMS_TCP_HEADER_SIZE: usize = 6;

/// AMS header size in bytes.
pub const AMS_HEADER_SIZE: usize = 32;

/// AMS/TCP command: ADS traffic carrying an AMS header.
pub(crate) const AMS_TCP_PORT_AMS_CMD: u16 = 0x0000;
/// AMS/TCP command: release a router port.
pub(crate) const AMS_TCP_PORT_CLOSE: u16 = 0x0001;
/// AMS/TCP command: ask the router for a local port and AMS address.
pub(crate) const AMS_TCP_PORT_CONNECT: u16 = 0x1000;

/// State flag bit: message is a response.
pub(crate) const STATE_FLAG_RESPONSE: u16 = 0x0001;
/// State flag bit: ADS command (always set for ADS traffic).
pub(crate) const STATE_FLAG_ADS_COMMAND: u16 = 0x0004;

/// The 6-byte AMS/TCP prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmsTcpHeader {
    /// AMS/TCP command (`0x0000` for ADS traffic).
    pub command: u16,
    /// Length of the payload that follows.
    pub length: u32,
}

impl AmsTcpHeader {
    /// Serializes the prefix.
    pub fn to_bytes(self) -> [u8; AMS_TCP_HEADER_SIZE] {
        let mut out = [0u8; AMS_TCP_HEADER_SIZE];
        out[..2].copy_from_slice(&self.command.to_le_bytes());
        out[2..].copy_from_slice(&self.length.to_le_bytes());
        out
    }

    /// Parses the prefix.
    pub fn from_bytes(data: &[u8; AMS_TCP_HEADER_SIZE]) -> Self {
        Self {
            command: u16::from_le_bytes([data[0], data[1]]),
            length: u32::from_le_bytes([data[2], data[3], data[4], data[5]]),
        }
    }
}

/// The 32-byte AMS header preceding every ADS request and response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmsHeader {
    /// Destination endpoint.
    pub target: AmsAddr,
    /// Originating endpoint.
    pub source: AmsAddr,
    /// ADS command id.
    pub command_id: u16,
    /// State flags (request/response, transport).
    pub state_flags: u16,
    /// Length of the ADS data following the header.
    pub data_length: u32,
    /// AMS return code (0 = success).
    pub error_code: u32,
    /// Invoke id used for request/response correlation.
    pub invoke_id: u32,
}

impl AmsHeader {
    /// Creates a request header.
    pub fn new_request(
        target: AmsAddr,
        source: AmsAddr,
        command_id: u16,
        data_length: u32,
        invoke_id: u32,
    ) -> Self {
        Self {
            target,
            source,
            command_id,
            state_flags: STATE_FLAG_ADS_COMMAND,
            data_length,
            error_code: 0,
            invoke_id,
        }
    }

    /// Creates the response header answering `request`.
    ///
    /// Source and target are swapped.
    pub fn response_to(request: &AmsHeader, data_length: u32, error_code: u32) -> Self {
        Self {
            target: request.source,
            source: request.target,
            command_id: request.command_id,
            state_flags: STATE_FLAG_ADS_COMMAND | STATE_FLAG_RESPONSE,
            data_length,
            error_code,
            invoke_id: request.invoke_id,
        }
    }

    /// Serializes the header.
    pub fn to_bytes(self) -> [u8; AMS_HEADER_SIZE] {
        let mut out = [0u8; AMS_HEADER_SIZE];
        out[..8].copy_from_slice(&self.target.to_bytes());
        out[8..16].copy_from_slice(&self.source.to_bytes());
        out[16..18].copy_from_slice(&self.command_id.to_le_bytes());
        out[18..20].copy_from_slice(&self.state_flags.to_le_bytes());
        out[20..24].copy_from_slice(&self.data_length.to_le_bytes());
        out[24..28].copy_from_slice(&self.error_code.to_le_bytes());
        out[28..32].copy_from_slice(&self.invoke_id.to_le_bytes());
        out
    }

    /// Parses a header from bytes.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidResponse` if the slice is too short.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < AMS_HEADER_SIZE {
            return Err(AdsError::invalid_response(format!(
                "AMS header too short: expected {} bytes, got {}",
                AMS_HEADER_SIZE,
                data.len()
            )));
        }

        let u16_at = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]);
        let u32_at =
            |i: usize| u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);

        Ok(Self {
            target: AmsAddr::from_bytes(&data[..AMS_ADDR_SIZE])?,
            source: AmsAddr::from_bytes(&data[AMS_ADDR_SIZE..2 * AMS_ADDR_SIZE])?,
            command_id: u16_at(16),
            state_flags: u16_at(18),
            data_length: u32_at(20),
            error_code: u32_at(24),
            invoke_id: u32_at(28),
        })
    }

    /// Returns whether this is a response header.
    pub fn is_response(&self) -> bool {
        (self.state_flags & STATE_FLAG_RESPONSE) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AmsNetId;

    fn target() -> AmsAddr {
        AmsAddr::new(AmsNetId::new([10, 0, 0, 5, 1, 1]), 851)
    }

    fn source() -> AmsAddr {
        AmsAddr::new(AmsNetId::new([10, 0, 0, 9, 1, 1]), 0x8001)
    }

    #[test]
    fn test_tcp_header_bytes() {
        let header = AmsTcpHeader {
            command: AMS_TCP_PORT_CONNECT,
            length: 2,
        };
        assert_eq!(header.to_bytes(), [0x00, 0x10, 0x02, 0x00, 0x00, 0x00]);
        assert_eq!(AmsTcpHeader::from_bytes(&header.to_bytes()), header);
    }

    #[test]
    fn test_request_header_to_bytes() {
        let header = AmsHeader::new_request(target(), source(), 0x0002, 12, 0x0102_0304);
        let bytes = header.to_bytes();

        let expected = hex::decode(concat!(
            "0a0000050101", "5303", // target
            "0a0000090101", "0180", // source
            "0200",                 // command: read
            "0400",                 // flags: request
            "0c000000",             // data length
            "00000000",             // error code
            "04030201",             // invoke id
        ))
        .unwrap();
        assert_eq!(bytes.to_vec(), expected);
    }

    #[test]
    fn test_header_from_bytes_too_short() {
        let result = AmsHeader::from_bytes(&[0u8; 10]);
        assert!(matches!(result, Err(AdsError::InvalidResponse { .. })));
    }

    #[test]
    fn test_response_to_swaps_addresses() {
        let request = AmsHeader::new_request(target(), source(), 0x0009, 20, 7);
        let response = AmsHeader::response_to(&request, 8, 0x710);

        assert_eq!(response.target, source());
        assert_eq!(response.source, target());
        assert_eq!(response.invoke_id, 7);
        assert_eq!(response.error_code, 0x710);
        assert!(response.is_response());
        assert!(!request.is_response());
    }

    #[test]
    fn test_header_roundtrip() {
        let original = AmsHeader::new_request(target(), source(), 0x0003, 64, u32::MAX);
        let parsed = AmsHeader::from_bytes(&original.to_bytes()).unwrap();
        assert_eq!(original, parsed);
    }
}
