//! ADS response parsing and validation.
//!
//! Every ADS response data block starts with a 4-byte result code. Commands
//! that return data follow it with a 4-byte length and the data itself.
//!
//! | Command | Layout after the AMS header |
//! |---------|-----------------------------|
//! | Read / ReadWrite | result (4), length (4), data |
//! | Write | result (4) |
//! | ReadState | result (4), ADS state (2), device state (2) |
//! | ReadDeviceInfo | result (4), major (1), minor (1), build (2), name (16) |
//!
//! A result of 0 means success; anything else is surfaced as
//! [`AdsError::Protocol`], never treated as a value.
//!
//! # Example
//!
//! ```
//! use beckhoff_ads::parse_read_response;
//!
//! let data = [
//!     0x00, 0x00, 0x00, 0x00, // result: success
//!     0x04, 0x00, 0x00, 0x00, // length
//!     0x00, 0x00, 0xBC, 0x41, // 23.5f32
//! ];
//! let payload = parse_read_response(&data).unwrap();
//! assert_eq!(payload, vec![0x00, 0x00, 0xBC, 0x41]);
//! ```

use std::fmt;

use crate::error::{AdsError, Result};

/// Size of the device name field in a ReadDeviceInfo response.
pub const DEVICE_NAME_SIZE: usize = 16;

fn u32_at(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| {
            AdsError::invalid_response(format!(
                "response too short: expected at least {} bytes, got {}",
                offset + 4,
                data.len()
            ))
        })
}

/// Checks the leading result code and returns the bytes after it.
///
/// # Errors
///
/// Returns `AdsError::Protocol` for a non-zero result and
/// `AdsError::InvalidResponse` if fewer than 4 bytes are present.
pub fn check_result(data: &[u8]) -> Result<&[u8]> {
    let code = u32_at(data, 0)?;
    if code != 0 {
        return Err(AdsError::protocol(code));
    }
    Ok(&data[4..])
}

/// Parses a Read or ReadWrite response and returns its data block.
///
/// # Errors
///
/// Returns an error if the result is non-zero or the announced length
/// does not match the bytes actually present.
pub fn parse_read_response(data: &[u8]) -> Result<Vec<u8>> {
    let rest = check_result(data)?;
    let length = u32_at(rest, 0)? as usize;
    let payload = &rest[4..];
    if payload.len() != length {
        return Err(AdsError::invalid_response(format!(
            "read response announces {} bytes but carries {}",
            length,
            payload.len()
        )));
    }
    Ok(payload.to_vec())
}

/// Parses a Write response.
pub fn parse_write_response(data: &[u8]) -> Result<()> {
    check_result(data).map(|_| ())
}

/// ADS state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdsState {
    /// Invalid.
    Invalid,
    /// Idle.
    Idle,
    /// Reset.
    Reset,
    /// Initialising.
    Init,
    /// Starting.
    Start,
    /// Running.
    Run,
    /// Stopped.
    Stop,
    /// Saving configuration.
    SaveConfig,
    /// Loading configuration.
    LoadConfig,
    /// Power failure.
    PowerFailure,
    /// Power good.
    PowerGood,
    /// Error.
    Error,
    /// Shutting down.
    Shutdown,
    /// Suspended.
    Suspend,
    /// Resuming.
    Resume,
    /// Config mode.
    Config,
    /// Reconfiguring.
    Reconfig,
    /// A state code this library does not know.
    Unknown(u16),
}

impl AdsState {
    /// Maps a wire state code.
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => Self::Invalid,
            1 => Self::Idle,
            2 => Self::Reset,
            3 => Self::Init,
            4 => Self::Start,
            5 => Self::Run,
            6 => Self::Stop,
            7 => Self::SaveConfig,
            8 => Self::LoadConfig,
            9 => Self::PowerFailure,
            10 => Self::PowerGood,
            11 => Self::Error,
            12 => Self::Shutdown,
            13 => Self::Suspend,
            14 => Self::Resume,
            15 => Self::Config,
            16 => Self::Reconfig,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for AdsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Parses a ReadState response into (ADS state, device state).
pub fn parse_read_state_response(data: &[u8]) -> Result<(AdsState, u16)> {
    let rest = check_result(data)?;
    if rest.len() < 4 {
        return Err(AdsError::invalid_response(format!(
            "state response too short: expected 4 bytes, got {}",
            rest.len()
        )));
    }
    let ads_state = u16::from_le_bytes([rest[0], rest[1]]);
    let device_state = u16::from_le_bytes([rest[2], rest[3]]);
    Ok((AdsState::from_code(ads_state), device_state))
}

/// Device name and version reported by ReadDeviceInfo.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Build number.
    pub build: u16,
    /// Device name, NUL padding removed.
    pub name: String,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}.{}", self.name, self.major, self.minor, self.build)
    }
}

/// Parses a ReadDeviceInfo response.
pub fn parse_device_info_response(data: &[u8]) -> Result<DeviceInfo> {
    let rest = check_result(data)?;
    if rest.len() < 4 + DEVICE_NAME_SIZE {
        return Err(AdsError::invalid_response(format!(
            "device info response too short: expected {} bytes, got {}",
            4 + DEVICE_NAME_SIZE,
            rest.len()
        )));
    }
    let name_bytes = &rest[4..4 + DEVICE_NAME_SIZE];
    let end = name_bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(DEVICE_NAME_SIZE);

    Ok(DeviceInfo {
        major: rest[0],
        minor: rest[1],
        build: u16::from_le_bytes([rest[2], rest[3]]),
        name: String::from_utf8_lossy(&name_bytes[..end]).into_owned(),
    })
}
