//! Error types for the ADS protocol.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for ADS operations.
pub type Result<T> = std::result::Result<T, AdsError>;

/// ADS device error code for "symbol not found".
pub const ADSERR_DEVICE_SYMBOLNOTFOUND: u32 = 0x710;

/// Errors that can occur during ADS communication.
#[derive(Debug, Error)]
pub enum AdsError {
    /// The TCP connection to the router could not be established.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        /// Router socket address that was dialed.
        addr: SocketAddr,
        /// Underlying socket error.
        source: io::Error,
    },

    /// No response arrived before the deadline.
    #[error("Communication timeout")]
    Timeout,

    /// The device or router answered a well-formed request with a non-zero code.
    #[error("ADS error 0x{code:04X}: {}", ads_error_description(*code))]
    Protocol {
        /// ADS return code reported by the device.
        code: u32,
    },

    /// The symbol name is unknown to the PLC.
    #[error("Symbol not found: '{name}'")]
    SymbolNotFound {
        /// Name that failed to resolve.
        name: String,
    },

    /// A response payload has the wrong shape for the requested value.
    #[error("Decode error: {reason}")]
    Decode {
        /// Description of the mismatch.
        reason: String,
    },

    /// API misuse, e.g. reading before `open`.
    #[error("Invalid state: {reason}")]
    InvalidState {
        /// Description of the misuse.
        reason: String,
    },

    /// Invalid parameter provided.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Malformed frame or response received from the router.
    #[error("Invalid response: {reason}")]
    InvalidResponse {
        /// Description of the response error.
        reason: String,
    },

    /// An AMS address string could not be parsed.
    #[error("Invalid AMS address '{input}': {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// Description of the problem.
        reason: String,
    },

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AdsError {
    /// Creates a new `Protocol` error from an ADS return code.
    ///
    /// # Example
    ///
    /// ```
    /// use beckhoff_ads::AdsError;
    ///
    /// let err = AdsError::protocol(0x702);
    /// assert_eq!(err.to_string(), "ADS error 0x0702: invalid index group");
    /// ```
    pub fn protocol(code: u32) -> Self {
        Self::Protocol { code }
    }

    /// Creates a new `SymbolNotFound` error.
    pub fn symbol_not_found(name: impl Into<String>) -> Self {
        Self::SymbolNotFound { name: name.into() }
    }

    /// Creates a new `Decode` error.
    ///
    /// # Example
    ///
    /// ```
    /// use beckhoff_ads::AdsError;
    ///
    /// let err = AdsError::decode("expected 4 bytes, got 2");
    /// ```
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidState` error.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use beckhoff_ads::AdsError;
    ///
    /// let err = AdsError::invalid_parameter("name", "must not be empty");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidAddress` error.
    pub fn invalid_address(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`AdsError::Timeout`].
    ///
    /// A timeout means the device was reachable but slow; retrying may help.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` for [`AdsError::SymbolNotFound`].
    pub fn is_symbol_not_found(&self) -> bool {
        matches!(self, Self::SymbolNotFound { .. })
    }

    /// Returns the ADS return code carried by a `Protocol` error.
    pub fn ads_code(&self) -> Option<u32> {
        match self {
            Self::Protocol { code } => Some(*code),
            _ => None,
        }
    }
}

/// Returns a short description for an ADS return code.
///
/// Unknown codes yield `"unknown error"`.
///
/// # Example
///
/// ```
/// use beckhoff_ads::ads_error_description;
///
/// assert_eq!(ads_error_description(0x710), "symbol not found");
/// assert_eq!(ads_error_description(0x6), "target port not found");
/// ```
pub fn ads_error_description(code: u32) -> &'static str {
    match code {
        0x000 => "no error",
        0x001 => "internal error",
        0x002 => "no real-time",
        0x006 => "target port not found",
        0x007 => "target machine not found",
        0x008 => "unknown command id",
        0x00A => "no IO",
        0x00B => "unknown AMS command",
        0x00D => "port not connected",
        0x00E => "invalid AMS length",
        0x00F => "invalid AMS Net ID",
        0x012 => "port disabled",
        0x013 => "port already connected",
        0x018 => "invalid AMS port",
        0x019 => "no memory",
        0x01A => "TCP send error",
        0x01B => "host unreachable",
        0x700 => "general device error",
        0x701 => "service not supported",
        0x702 => "invalid index group",
        0x703 => "invalid index offset",
        0x704 => "reading/writing not permitted",
        0x705 => "parameter size not correct",
        0x706 => "invalid parameter value",
        0x707 => "device not in ready state",
        0x708 => "device busy",
        0x70A => "out of memory",
        0x70B => "invalid parameter",
        0x70C => "not found",
        0x70D => "syntax error",
        0x70E => "objects do not match",
        0x70F => "object already exists",
        ADSERR_DEVICE_SYMBOLNOTFOUND => "symbol not found",
        0x711 => "symbol version invalid",
        0x712 => "device in invalid state",
        0x719 => "device timeout",
        0x740 => "client error",
        0x741 => "client: invalid parameter",
        0x745 => "client: sync timeout",
        0x748 => "client: port not open",
        0x750 => "client: no AMS address",
        _ => "unknown error",
    }
}
