//! Typed scalar values and their wire encoding.
//!
//! ADS transports PLC variables as raw little-endian bytes. This module
//! defines a closed set of supported scalar types ([`AdsType`]) and the
//! tagged value ([`AdsValue`]) they decode into. Every type knows its wire
//! size, so a payload of the wrong length is rejected as
//! [`AdsError::Decode`] instead of being reinterpreted.
//!
//! | IEC 61131-3 | [`AdsType`] | Bytes | ADS data type id |
//! |-------------|-------------|:-----:|:----------------:|
//! | BOOL | `Bool` | 1 | 33 |
//! | SINT | `SInt` | 1 | 16 |
//! | USINT / BYTE | `USInt` | 1 | 17 |
//! | INT | `Int` | 2 | 2 |
//! | UINT / WORD | `UInt` | 2 | 18 |
//! | DINT | `DInt` | 4 | 3 |
//! | UDINT / DWORD | `UDInt` | 4 | 19 |
//! | LINT | `LInt` | 8 | 20 |
//! | ULINT / LWORD | `ULInt` | 8 | 21 |
//! | REAL | `Real` | 4 | 4 |
//! | LREAL | `LReal` | 8 | 5 |
//!
//! # Example
//!
//! ```
//! use beckhoff_ads::{decode_f32, encode_f32, AdsType, AdsValue};
//!
//! let bytes = encode_f32(23.5);
//! assert_eq!(decode_f32(&bytes).unwrap(), 23.5);
//!
//! let value = AdsValue::decode(AdsType::DInt, &(-7i32).to_le_bytes()).unwrap();
//! assert_eq!(value, AdsValue::DInt(-7));
//! assert!(AdsValue::decode(AdsType::Real, &[0, 0]).is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{AdsError, Result};

/// Decodes a REAL (little-endian IEEE-754 single).
///
/// # Errors
///
/// Returns `AdsError::Decode` unless `bytes` is exactly 4 bytes long.
pub fn decode_f32(bytes: &[u8]) -> Result<f32> {
    let raw: [u8; 4] = bytes.try_into().map_err(|_| {
        AdsError::decode(format!("REAL needs 4 bytes, got {}", bytes.len()))
    })?;
    Ok(f32::from_le_bytes(raw))
}

/// Encodes a REAL as little-endian IEEE-754 single.
pub fn encode_f32(value: f32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Scalar PLC data types supported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdsType {
    /// BOOL.
    Bool,
    /// SINT (i8).
    SInt,
    /// USINT / BYTE (u8).
    USInt,
    /// INT (i16).
    Int,
    /// UINT / WORD (u16).
    UInt,
    /// DINT (i32).
    DInt,
    /// UDINT / DWORD (u32).
    UDInt,
    /// LINT (i64).
    LInt,
    /// ULINT / LWORD (u64).
    ULInt,
    /// REAL (f32).
    Real,
    /// LREAL (f64).
    LReal,
}

impl AdsType {
    /// Returns the wire size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Bool | Self::SInt | Self::USInt => 1,
            Self::Int | Self::UInt => 2,
            Self::DInt | Self::UDInt | Self::Real => 4,
            Self::LInt | Self::ULInt | Self::LReal => 8,
        }
    }

    /// Returns the IEC 61131-3 name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::SInt => "SINT",
            Self::USInt => "USINT",
            Self::Int => "INT",
            Self::UInt => "UINT",
            Self::DInt => "DINT",
            Self::UDInt => "UDINT",
            Self::LInt => "LINT",
            Self::ULInt => "ULINT",
            Self::Real => "REAL",
            Self::LReal => "LREAL",
        }
    }

    /// Maps an ADS data type id (as reported in symbol information).
    ///
    /// Returns `None` for strings, structures and other non-scalar ids.
    pub fn from_data_type_id(id: u32) -> Option<Self> {
        match id {
            33 => Some(Self::Bool),
            16 => Some(Self::SInt),
            17 => Some(Self::USInt),
            2 => Some(Self::Int),
            18 => Some(Self::UInt),
            3 => Some(Self::DInt),
            19 => Some(Self::UDInt),
            20 => Some(Self::LInt),
            21 => Some(Self::ULInt),
            4 => Some(Self::Real),
            5 => Some(Self::LReal),
            _ => None,
        }
    }

    /// Returns the ADS data type id.
    pub fn data_type_id(self) -> u32 {
        match self {
            Self::Bool => 33,
            Self::SInt => 16,
            Self::USInt => 17,
            Self::Int => 2,
            Self::UInt => 18,
            Self::DInt => 3,
            Self::UDInt => 19,
            Self::LInt => 20,
            Self::ULInt => 21,
            Self::Real => 4,
            Self::LReal => 5,
        }
    }
}

impl fmt::Display for AdsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdsType {
    type Err = AdsError;

    /// Parses an IEC type name, case-insensitively. `BYTE`, `WORD`, `DWORD`
    /// and `LWORD` map to their unsigned equivalents.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOOL" => Ok(Self::Bool),
            "SINT" => Ok(Self::SInt),
            "USINT" | "BYTE" => Ok(Self::USInt),
            "INT" => Ok(Self::Int),
            "UINT" | "WORD" => Ok(Self::UInt),
            "DINT" => Ok(Self::DInt),
            "UDINT" | "DWORD" => Ok(Self::UDInt),
            "LINT" => Ok(Self::LInt),
            "ULINT" | "LWORD" => Ok(Self::ULInt),
            "REAL" => Ok(Self::Real),
            "LREAL" => Ok(Self::LReal),
            _ => Err(AdsError::invalid_parameter(
                "type",
                format!("unsupported PLC type '{s}'"),
            )),
        }
    }
}

/// A decoded scalar, tagged with its PLC type.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdsValue {
    /// BOOL.
    Bool(bool),
    /// SINT.
    SInt(i8),
    /// USINT.
    USInt(u8),
    /// INT.
    Int(i16),
    /// UINT.
    UInt(u16),
    /// DINT.
    DInt(i32),
    /// UDINT.
    UDInt(u32),
    /// LINT.
    LInt(i64),
    /// ULINT.
    ULInt(u64),
    /// REAL.
    Real(f32),
    /// LREAL.
    LReal(f64),
}

impl AdsValue {
    /// Returns the PLC type of this value.
    pub fn ads_type(&self) -> AdsType {
        match self {
            Self::Bool(_) => AdsType::Bool,
            Self::SInt(_) => AdsType::SInt,
            Self::USInt(_) => AdsType::USInt,
            Self::Int(_) => AdsType::Int,
            Self::UInt(_) => AdsType::UInt,
            Self::DInt(_) => AdsType::DInt,
            Self::UDInt(_) => AdsType::UDInt,
            Self::LInt(_) => AdsType::LInt,
            Self::ULInt(_) => AdsType::ULInt,
            Self::Real(_) => AdsType::Real,
            Self::LReal(_) => AdsType::LReal,
        }
    }

    /// Decodes `bytes` as a value of type `ty`.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::Decode` if `bytes.len()` differs from `ty.size()`.
    pub fn decode(ty: AdsType, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ty.size() {
            return Err(AdsError::decode(format!(
                "{} needs {} bytes, got {}",
                ty,
                ty.size(),
                bytes.len()
            )));
        }

        let b = bytes;
        Ok(match ty {
            AdsType::Bool => Self::Bool(b[0] != 0),
            AdsType::SInt => Self::SInt(b[0] as i8),
            AdsType::USInt => Self::USInt(b[0]),
            AdsType::Int => Self::Int(i16::from_le_bytes([b[0], b[1]])),
            AdsType::UInt => Self::UInt(u16::from_le_bytes([b[0], b[1]])),
            AdsType::DInt => Self::DInt(i32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            AdsType::UDInt => Self::UDInt(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            AdsType::Real => Self::Real(decode_f32(b)?),
            AdsType::LInt => Self::LInt(i64::from_le_bytes(eight(b))),
            AdsType::ULInt => Self::ULInt(u64::from_le_bytes(eight(b))),
            AdsType::LReal => Self::LReal(f64::from_le_bytes(eight(b))),
        })
    }

    /// Encodes the value in its little-endian wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            Self::Bool(v) => vec![u8::from(v)],
            Self::SInt(v) => v.to_le_bytes().to_vec(),
            Self::USInt(v) => vec![v],
            Self::Int(v) => v.to_le_bytes().to_vec(),
            Self::UInt(v) => v.to_le_bytes().to_vec(),
            Self::DInt(v) => v.to_le_bytes().to_vec(),
            Self::UDInt(v) => v.to_le_bytes().to_vec(),
            Self::LInt(v) => v.to_le_bytes().to_vec(),
            Self::ULInt(v) => v.to_le_bytes().to_vec(),
            Self::Real(v) => encode_f32(v).to_vec(),
            Self::LReal(v) => v.to_le_bytes().to_vec(),
        }
    }

    /// Parses text into a value of type `ty`.
    ///
    /// `BOOL` accepts `true`/`false`/`1`/`0` in any case; numbers must fit the
    /// type's range.
    ///
    /// # Example
    ///
    /// ```
    /// use beckhoff_ads::{AdsType, AdsValue};
    ///
    /// assert_eq!(AdsValue::parse(AdsType::Real, "23.5").unwrap(), AdsValue::Real(23.5));
    /// assert_eq!(AdsValue::parse(AdsType::Bool, "TRUE").unwrap(), AdsValue::Bool(true));
    /// assert!(AdsValue::parse(AdsType::USInt, "300").is_err());
    /// ```
    pub fn parse(ty: AdsType, text: &str) -> Result<Self> {
        let text = text.trim();
        let bad = || AdsError::invalid_parameter("value", format!("'{text}' is not a valid {ty}"));

        Ok(match ty {
            AdsType::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "1" => Self::Bool(true),
                "false" | "0" => Self::Bool(false),
                _ => return Err(bad()),
            },
            AdsType::SInt => Self::SInt(text.parse().map_err(|_| bad())?),
            AdsType::USInt => Self::USInt(text.parse().map_err(|_| bad())?),
            AdsType::Int => Self::Int(text.parse().map_err(|_| bad())?),
            AdsType::UInt => Self::UInt(text.parse().map_err(|_| bad())?),
            AdsType::DInt => Self::DInt(text.parse().map_err(|_| bad())?),
            AdsType::UDInt => Self::UDInt(text.parse().map_err(|_| bad())?),
            AdsType::LInt => Self::LInt(text.parse().map_err(|_| bad())?),
            AdsType::ULInt => Self::ULInt(text.parse().map_err(|_| bad())?),
            AdsType::Real => Self::Real(text.parse().map_err(|_| bad())?),
            AdsType::LReal => Self::LReal(text.parse().map_err(|_| bad())?),
        })
    }
}

fn eight(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

impl fmt::Display for AdsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::SInt(v) => write!(f, "{v}"),
            Self::USInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::DInt(v) => write!(f, "{v}"),
            Self::UDInt(v) => write!(f, "{v}"),
            Self::LInt(v) => write!(f, "{v}"),
            Self::ULInt(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::LReal(v) => write!(f, "{v}"),
        }
    }
}
