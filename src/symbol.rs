//! Symbol resolution: tag name to (index group, index offset).
//!
//! PLC variables are addressed on the wire by a numeric pair. The device
//! translates names through its symbol table; this module asks for the
//! extended symbol entry of one name (index group `0xF009`) and decodes it.
//!
//! # Symbol entry layout
//!
//! | Bytes | Field |
//! |-------|-------|
//! | 0-3 | Entry length |
//! | 4-7 | Index group |
//! | 8-11 | Index offset |
//! | 12-15 | Size in bytes |
//! | 16-19 | ADS data type id |
//! | 20-23 | Flags |
//! | 24-25 | Name length |
//! | 26-27 | Type name length |
//! | 28-29 | Comment length |
//! | 30.. | Name, type name, comment (each NUL-terminated) |
//!
//! Resolved addresses belong to the session that resolved them: a PLC may
//! move variables when a new program is downloaded.

use log::debug;

use crate::command::{ReadWriteCommand, ADSIGRP_SYM_INFOBYNAMEEX};
use crate::error::{AdsError, Result, ADSERR_DEVICE_SYMBOLNOTFOUND};
use crate::response::parse_read_response;
use crate::session::Session;
use crate::value::AdsType;

/// Fixed part of a symbol entry.
pub const SYMBOL_ENTRY_HEADER_SIZE: usize = 30;

/// Read length requested for a symbol entry.
const SYMBOL_ENTRY_READ_LENGTH: u32 = 0xFFFF;

/// Numeric address of a PLC variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagAddress {
    /// Index group.
    pub index_group: u32,
    /// Index offset.
    pub index_offset: u32,
}

impl std::fmt::Display for TagAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:X}:0x{:X}", self.index_group, self.index_offset)
    }
}

/// Symbol information reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Index group.
    pub index_group: u32,
    /// Index offset.
    pub index_offset: u32,
    /// Size of the variable in bytes.
    pub size: u32,
    /// ADS data type id.
    pub data_type: u32,
    /// Symbol flags.
    pub flags: u32,
    /// Fully qualified name, e.g. `MAIN.fTemperature`.
    pub name: String,
    /// Declared type, e.g. `REAL`.
    pub type_name: String,
    /// Declaration comment.
    pub comment: String,
}

impl SymbolEntry {
    /// Returns the (index group, index offset) pair.
    pub fn address(&self) -> TagAddress {
        TagAddress {
            index_group: self.index_group,
            index_offset: self.index_offset,
        }
    }

    /// Returns the scalar type, if the data type id is one the codec supports.
    pub fn ads_type(&self) -> Option<AdsType> {
        AdsType::from_data_type_id(self.data_type)
    }

    /// Parses a symbol entry.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvalidResponse` if the buffer is shorter than the
    /// fixed part or the string lengths point past its end.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < SYMBOL_ENTRY_HEADER_SIZE {
            return Err(AdsError::invalid_response(format!(
                "symbol entry too short: expected at least {} bytes, got {}",
                SYMBOL_ENTRY_HEADER_SIZE,
                data.len()
            )));
        }

        let u32_at = |i: usize| u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        let u16_at = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]) as usize;

        let mut strings = &data[SYMBOL_ENTRY_HEADER_SIZE..];
        let mut take = |len: usize| -> Result<String> {
            // Each string is followed by a NUL terminator.
            if strings.len() < len + 1 {
                return Err(AdsError::invalid_response(
                    "symbol entry strings run past end of data",
                ));
            }
            let text = String::from_utf8_lossy(&strings[..len]).into_owned();
            strings = &strings[len + 1..];
            Ok(text)
        };

        let name = take(u16_at(24))?;
        let type_name = take(u16_at(26))?;
        let comment = take(u16_at(28))?;

        Ok(Self {
            index_group: u32_at(4),
            index_offset: u32_at(8),
            size: u32_at(12),
            data_type: u32_at(16),
            flags: u32_at(20),
            name,
            type_name,
            comment,
        })
    }

    /// Serializes the entry in device format (used by simulators and tests).
    pub fn to_bytes(&self) -> Vec<u8> {
        let strings_len = self.name.len() + self.type_name.len() + self.comment.len() + 3;
        let entry_length = (SYMBOL_ENTRY_HEADER_SIZE + strings_len) as u32;

        let mut out = Vec::with_capacity(entry_length as usize);
        out.extend_from_slice(&entry_length.to_le_bytes());
        out.extend_from_slice(&self.index_group.to_le_bytes());
        out.extend_from_slice(&self.index_offset.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&self.data_type.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&(self.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(self.type_name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        for text in [&self.name, &self.type_name, &self.comment] {
            out.extend_from_slice(text.as_bytes());
            out.push(0);
        }
        out
    }
}

/// Encodes a tag name as NUL-terminated request data.
fn encode_name(name: &str) -> Result<Vec<u8>> {
    if name.trim().is_empty() {
        return Err(AdsError::invalid_parameter("name", "must not be empty"));
    }
    if name.contains('\0') {
        return Err(AdsError::invalid_parameter(
            "name",
            "must not contain NUL characters",
        ));
    }
    let mut data = Vec::with_capacity(name.len() + 1);
    data.extend_from_slice(name.as_bytes());
    data.push(0);
    Ok(data)
}

/// Resolves `name` to its symbol entry on the device behind `session`.
///
/// # Errors
///
/// - `AdsError::SymbolNotFound` if the device does not know the name
/// - `AdsError::InvalidParameter` for an empty name or one containing NUL
/// - any session error, unchanged
pub fn resolve(session: &mut Session, name: &str) -> Result<SymbolEntry> {
    let data = encode_name(name)?;
    let cmd = ReadWriteCommand::new(ADSIGRP_SYM_INFOBYNAMEEX, 0, SYMBOL_ENTRY_READ_LENGTH, &data)?;

    let response = session
        .invoke(cmd.command_id(), &cmd.to_bytes())
        .and_then(|bytes| parse_read_response(&bytes))
        .map_err(|e| match e {
            AdsError::Protocol {
                code: ADSERR_DEVICE_SYMBOLNOTFOUND,
            } => AdsError::symbol_not_found(name),
            other => other,
        })?;

    let entry = SymbolEntry::from_bytes(&response)?;
    debug!("resolved '{}' to {}", name, entry.address());
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature() -> SymbolEntry {
        SymbolEntry {
            index_group: 0x4020,
            index_offset: 0x10,
            size: 4,
            data_type: 4,
            flags: 0x8,
            name: "MAIN.Temperature".to_string(),
            type_name: "REAL".to_string(),
            comment: "degC".to_string(),
        }
    }

    #[test]
    fn test_entry_from_bytes() {
        let bytes = temperature().to_bytes();
        let entry = SymbolEntry::from_bytes(&bytes).unwrap();

        assert_eq!(entry, temperature());
        assert_eq!(
            entry.address(),
            TagAddress {
                index_group: 0x4020,
                index_offset: 0x10
            }
        );
        assert_eq!(entry.ads_type(), Some(AdsType::Real));
    }

    #[test]
    fn test_entry_layout() {
        let bytes = temperature().to_bytes();
        assert_eq!(&bytes[4..8], &[0x20, 0x40, 0x00, 0x00]);
        assert_eq!(&bytes[8..12], &[0x10, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[24..26], &[16, 0]);
        assert_eq!(bytes[SYMBOL_ENTRY_HEADER_SIZE + 16], 0);
        assert_eq!(
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
            bytes.len()
        );
    }

    #[test]
    fn test_entry_too_short() {
        assert!(SymbolEntry::from_bytes(&[0u8; 12]).is_err());
    }

    #[test]
    fn test_entry_truncated_strings() {
        let mut bytes = temperature().to_bytes();
        bytes.truncate(SYMBOL_ENTRY_HEADER_SIZE + 5);
        assert!(matches!(
            SymbolEntry::from_bytes(&bytes),
            Err(AdsError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_encode_name() {
        assert_eq!(encode_name("MAIN.x").unwrap(), b"MAIN.x\0".to_vec());
        assert!(encode_name("").is_err());
        assert!(encode_name("   ").is_err());
        assert!(encode_name("a\0b").is_err());
    }

    #[test]
    fn test_tag_address_display() {
        assert_eq!(temperature().address().to_string(), "0x4020:0x10");
    }
}
