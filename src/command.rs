//! ADS command structures and serialization.
//!
//! Each command builds the ADS data block that follows the AMS header.
//! The header itself (addresses, invoke id) is added by the
//! [`Session`](crate::Session), which owns the correlation counter.
//!
//! # Command Types
//!
//! - [`ReadCommand`] - Read bytes at (index group, index offset)
//! - [`WriteCommand`] - Write bytes at (index group, index offset)
//! - [`ReadWriteCommand`] - Write then read in one request (symbol lookups)
//! - [`ReadStateCommand`] - Query ADS and device state
//! - [`ReadDeviceInfoCommand`] - Query device name and version
//!
//! # Example
//!
//! ```
//! use beckhoff_ads::{AdsCommand, ReadCommand};
//!
//! let cmd = ReadCommand::new(0x4020, 0x10, 4).unwrap();
//! assert_eq!(cmd.command_id(), AdsCommand::Read);
//! assert_eq!(cmd.to_bytes().len(), 12);
//! ```

use crate::error::{AdsError, Result};
use crate::transport::MAX_FRAME_SIZE;

/// Index group: extended symbol information by name.
pub const ADSIGRP_SYM_INFOBYNAMEEX: u32 = 0xF009;

/// Largest data block a single read or write may carry.
pub const MAX_DATA_LENGTH: u32 = (MAX_FRAME_SIZE - 64) as u32;

/// ADS command identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum AdsCommand {
    /// Read device name and version.
    ReadDeviceInfo = 0x0001,
    /// Read data.
    Read = 0x0002,
    /// Write data.
    Write = 0x0003,
    /// Read ADS and device state.
    ReadState = 0x0004,
    /// Write data, then read data.
    ReadWrite = 0x0009,
}

impl AdsCommand {
    /// Returns the wire command id.
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Looks up a command by its wire id.
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0x0001 => Some(Self::ReadDeviceInfo),
            0x0002 => Some(Self::Read),
            0x0003 => Some(Self::Write),
            0x0004 => Some(Self::ReadState),
            0x0009 => Some(Self::ReadWrite),
            _ => None,
        }
    }
}

fn check_length(parameter: &str, length: usize) -> Result<u32> {
    if length > MAX_DATA_LENGTH as usize {
        return Err(AdsError::invalid_parameter(
            parameter,
            format!("must not exceed {} bytes", MAX_DATA_LENGTH),
        ));
    }
    Ok(length as u32)
}

/// Command for reading bytes from device memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCommand {
    index_group: u32,
    index_offset: u32,
    length: u32,
}

impl ReadCommand {
    /// Creates a new read command.
    ///
    /// # Errors
    ///
    /// Returns an error if `length` is 0 or exceeds [`MAX_DATA_LENGTH`].
    pub fn new(index_group: u32, index_offset: u32, length: u32) -> Result<Self> {
        if length == 0 {
            return Err(AdsError::invalid_parameter(
                "length",
                "must be greater than 0",
            ));
        }
        check_length("length", length as usize)?;
        Ok(Self {
            index_group,
            index_offset,
            length,
        })
    }

    /// Returns the ADS command id.
    pub fn command_id(&self) -> AdsCommand {
        AdsCommand::Read
    }

    /// Serializes the command data (group, offset, length).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(&self.index_group.to_le_bytes());
        out.extend_from_slice(&self.index_offset.to_le_bytes());
        out.extend_from_slice(&self.length.to_le_bytes());
        out
    }
}

/// Command for writing bytes to device memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCommand<'a> {
    index_group: u32,
    index_offset: u32,
    data: &'a [u8],
}

impl<'a> WriteCommand<'a> {
    /// Creates a new write command.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is empty or larger than [`MAX_DATA_LENGTH`].
    pub fn new(index_group: u32, index_offset: u32, data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(AdsError::invalid_parameter("data", "cannot be empty"));
        }
        check_length("data", data.len())?;
        Ok(Self {
            index_group,
            index_offset,
            data,
        })
    }

    /// Returns the ADS command id.
    pub fn command_id(&self) -> AdsCommand {
        AdsCommand::Write
    }

    /// Serializes the command data (group, offset, length, data).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.data.len());
        out.extend_from_slice(&self.index_group.to_le_bytes());
        out.extend_from_slice(&self.index_offset.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(self.data);
        out
    }
}

/// Command that writes a request block and reads back a reply block.
///
/// Symbol lookups use this with the symbol name as write data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWriteCommand<'a> {
    index_group: u32,
    index_offset: u32,
    read_length: u32,
    data: &'a [u8],
}

impl<'a> ReadWriteCommand<'a> {
    /// Creates a new read/write command.
    ///
    /// # Errors
    ///
    /// Returns an error if either length exceeds [`MAX_DATA_LENGTH`].
    pub fn new(
        index_group: u32,
        index_offset: u32,
        read_length: u32,
        data: &'a [u8],
    ) -> Result<Self> {
        check_length("read_length", read_length as usize)?;
        check_length("data", data.len())?;
        Ok(Self {
            index_group,
            index_offset,
            read_length,
            data,
        })
    }

    /// Returns the ADS command id.
    pub fn command_id(&self) -> AdsCommand {
        AdsCommand::ReadWrite
    }

    /// Serializes the command data (group, offset, read length, write length, data).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.data.len());
        out.extend_from_slice(&self.index_group.to_le_bytes());
        out.extend_from_slice(&self.index_offset.to_le_bytes());
        out.extend_from_slice(&self.read_length.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(self.data);
        out
    }
}

/// Command for reading the ADS state. Carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadStateCommand;

impl ReadStateCommand {
    /// Returns the ADS command id.
    pub fn command_id(&self) -> AdsCommand {
        AdsCommand::ReadState
    }

    /// Serializes the command data (empty).
    pub fn to_bytes(&self) -> Vec<u8> {
        Vec::new()
    }
}

/// Command for reading the device name and version. Carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadDeviceInfoCommand;

impl ReadDeviceInfoCommand {
    /// Returns the ADS command id.
    pub fn command_id(&self) -> AdsCommand {
        AdsCommand::ReadDeviceInfo
    }

    /// Serializes the command data (empty).
    pub fn to_bytes(&self) -> Vec<u8> {
        Vec::new()
    }
}
