//! # Beckhoff ADS Protocol Library
//!
//! A Rust library for reading and writing TwinCAT PLC variables with the
//! ADS (Automation Device Specification) protocol over AMS/TCP.
//!
//! This is a **protocol-only** library: open a session, resolve a symbol,
//! read or write a scalar, close. No polling, notifications, retries,
//! caching, or reconnection.
//!
//! ## Features
//!
//! - **Synchronous**: each call blocks until its round trip completes or times out
//! - **Typed**: a closed set of scalar types ([`AdsType`] / [`AdsValue`])
//! - **Explicit errors**: every failure is an [`AdsError`] variant callers can branch on
//! - **No panics**: all errors returned as `Result<T, AdsError>`
//! - **Router aware**: negotiates a local AMS address, or uses a fixed one
//!
//! ## Quick Start
//!
//! ```no_run
//! use beckhoff_ads::{Client, ClientConfig};
//!
//! fn main() -> beckhoff_ads::Result<()> {
//!     // PLC runtime 1 behind the local AMS router (127.0.0.1:48898)
//!     let config = ClientConfig::new("172.18.236.210.1.1:851".parse()?);
//!     let mut client = Client::new(config);
//!     client.open()?;
//!
//!     let value = client.read_tag("MAIN.Temperature")?;
//!     println!("MAIN.Temperature = {}", value);
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Addressing
//!
//! | Concept | Type | Example |
//! |---------|------|---------|
//! | AMS Net ID | [`AmsNetId`] | `172.18.236.210.1.1` |
//! | Endpoint | [`AmsAddr`] | `172.18.236.210.1.1:851` |
//! | Variable address | [`TagAddress`] | index group `0x4020`, offset `0x10` |
//!
//! ## Error Handling
//!
//! ```no_run
//! use beckhoff_ads::{AdsError, Client, ClientConfig};
//!
//! let mut client = Client::new(ClientConfig::new("5.1.2.3.1.1:851".parse()?));
//! client.open()?;
//!
//! match client.read_tag("MAIN.Temperature") {
//!     Ok(value) => println!("{}", value),
//!     Err(AdsError::Timeout) => println!("device slow, try again"),
//!     Err(AdsError::SymbolNotFound { name }) => println!("no such tag: {}", name),
//!     Err(AdsError::Protocol { code }) => println!("device error 0x{:X}", code),
//!     Err(e) => println!("Error: {}", e),
//! }
//! # Ok::<(), AdsError>(())
//! ```
//!
//! ## Local router address
//!
//! ```no_run
//! use beckhoff_ads::{router_address, ADS_TCP_PORT, DEFAULT_TIMEOUT};
//! use std::net::{Ipv4Addr, SocketAddr};
//!
//! let router = SocketAddr::from((Ipv4Addr::LOCALHOST, ADS_TCP_PORT));
//! let local = router_address(router, DEFAULT_TIMEOUT)?;
//! println!("NET_ID:{}", local.net_id());
//! # Ok::<(), beckhoff_ads::AdsError>(())
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod address;
mod client;
mod command;
mod error;
mod header;
mod response;
mod session;
mod symbol;
mod transport;
mod value;

// Public re-exports
pub use address::{
    AmsAddr, AmsNetId, AMS_ADDR_SIZE, AMS_NET_ID_SIZE, PORT_SYSTEM_SERVICE, PORT_TC2PLC1,
    PORT_TC3PLC1,
};
pub use client::{Client, ClientConfig};
pub use command::{
    AdsCommand, ReadCommand, ReadDeviceInfoCommand, ReadStateCommand, ReadWriteCommand,
    WriteCommand, ADSIGRP_SYM_INFOBYNAMEEX, MAX_DATA_LENGTH,
};
pub use error::{ads_error_description, AdsError, Result, ADSERR_DEVICE_SYMBOLNOTFOUND};
pub use header::{AmsHeader, AmsTcpHeader, AMS_HEADER_SIZE, AMS_TCP_HEADER_SIZE};
pub use response::{
    check_result, parse_device_info_response, parse_read_response, parse_read_state_response,
    parse_write_response, AdsState, DeviceInfo,
};
pub use session::{router_address, Session};
pub use symbol::{resolve, SymbolEntry, TagAddress, SYMBOL_ENTRY_HEADER_SIZE};
pub use transport::{
    parse_router_addr, AmsTcpFrame, TcpTransport, ADS_TCP_PORT, DEFAULT_TIMEOUT, MAX_FRAME_SIZE,
};
pub use value::{decode_f32, encode_f32, AdsType, AdsValue};
