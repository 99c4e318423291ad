//! A simulated AMS router with one PLC behind it.
//!
//! Answers port connect, symbol lookup by name, Read, Write, ReadState and
//! ReadDeviceInfo over an in-memory variable table. Every accepted
//! connection is served on its own thread.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use beckhoff_ads::{
    AdsCommand, AdsType, AmsAddr, AmsHeader, AmsNetId, AmsTcpFrame, AmsTcpHeader, SymbolEntry,
    ADSERR_DEVICE_SYMBOLNOTFOUND, ADSIGRP_SYM_INFOBYNAMEEX, AMS_HEADER_SIZE, AMS_TCP_HEADER_SIZE,
};

/// Net ID the simulated router reports for itself.
pub const ROUTER_NET_ID: [u8; 6] = [10, 0, 0, 5, 1, 1];

/// Port the simulated router hands out on port connect.
pub const ASSIGNED_PORT: u16 = 32905;

/// ADS error for an unknown index offset.
pub const ADSERR_DEVICE_INVALIDOFFSET: u32 = 0x703;

/// AMS error for an unsupported command.
pub const ADSERR_DEVICE_SRVNOTSUPP: u32 = 0x701;

const PORT_CONNECT: u16 = 0x1000;
const PORT_CLOSE: u16 = 0x0001;
const AMS_CMD: u16 = 0x0000;

/// How the simulated device answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Answer every request.
    Normal,
    /// Send a response with a foreign invoke id before each real answer.
    StaleFirst,
    /// Accept ADS requests but never answer them.
    Silent,
}

#[derive(Debug, Default)]
struct Device {
    symbols: HashMap<String, SymbolEntry>,
    memory: HashMap<(u32, u32), Vec<u8>>,
    port_closes: Vec<u16>,
}

/// A running simulator.
pub struct Simulator {
    addr: SocketAddr,
    device: Arc<Mutex<Device>>,
}

impl Simulator {
    /// Starts a simulator on an ephemeral localhost port.
    pub fn start(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let device = Arc::new(Mutex::new(Device::default()));

        let shared = device.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let device = shared.clone();
                thread::spawn(move || serve(stream, device, behaviour));
            }
        });

        Self { addr, device }
    }

    /// Starts a simulator holding `Temperature` (REAL 23.5 at 0x4020:0x10).
    pub fn with_temperature(behaviour: Behaviour) -> Self {
        let sim = Self::start(behaviour);
        sim.add_symbol("Temperature", 0x4020, 0x10, AdsType::Real, &23.5f32.to_le_bytes());
        sim
    }

    /// Router address to connect to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// PLC endpoint behind the router.
    pub fn target(&self) -> AmsAddr {
        AmsAddr::new(AmsNetId::new(ROUTER_NET_ID), 851)
    }

    /// Declares a variable and its initial contents.
    pub fn add_symbol(&self, name: &str, group: u32, offset: u32, ty: AdsType, value: &[u8]) {
        let entry = SymbolEntry {
            index_group: group,
            index_offset: offset,
            size: value.len() as u32,
            data_type: ty.data_type_id(),
            flags: 0x8,
            name: name.to_string(),
            type_name: ty.name().to_string(),
            comment: String::new(),
        };
        let mut device = self.device.lock().unwrap();
        device.symbols.insert(name.to_string(), entry);
        device.memory.insert((group, offset), value.to_vec());
    }

    /// Current contents of a variable.
    pub fn memory(&self, group: u32, offset: u32) -> Option<Vec<u8>> {
        self.device.lock().unwrap().memory.get(&(group, offset)).cloned()
    }

    /// Router ports released by clients so far.
    pub fn port_closes(&self) -> Vec<u16> {
        self.device.lock().unwrap().port_closes.clone()
    }
}

fn read_frame(stream: &mut TcpStream) -> Option<AmsTcpFrame> {
    let mut prefix = [0u8; AMS_TCP_HEADER_SIZE];
    // EOF or reset: the client hung up.
    stream.read_exact(&mut prefix).ok()?;
    let header = AmsTcpHeader::from_bytes(&prefix);
    let mut payload = vec![0u8; header.length as usize];
    stream.read_exact(&mut payload).ok()?;
    Some(AmsTcpFrame::new(header.command, payload))
}

fn send_frame(stream: &mut TcpStream, frame: AmsTcpFrame) {
    // The client may already have given up on this request.
    let _ = stream.write_all(&frame.to_bytes().unwrap());
}

fn response(request: &AmsHeader, error_code: u32, data: &[u8]) -> AmsTcpFrame {
    let header = AmsHeader::response_to(request, data.len() as u32, error_code);
    let mut payload = header.to_bytes().to_vec();
    payload.extend_from_slice(data);
    AmsTcpFrame::new(AMS_CMD, payload)
}

fn serve(mut stream: TcpStream, device: Arc<Mutex<Device>>, behaviour: Behaviour) {
    while let Some(frame) = read_frame(&mut stream) {
        match frame.command {
            PORT_CONNECT => {
                let addr = AmsAddr::new(AmsNetId::new(ROUTER_NET_ID), ASSIGNED_PORT);
                send_frame(&mut stream, AmsTcpFrame::new(PORT_CONNECT, addr.to_bytes().to_vec()));
            }
            PORT_CLOSE => {
                let port = u16::from_le_bytes([frame.payload[0], frame.payload[1]]);
                device.lock().unwrap().port_closes.push(port);
            }
            AMS_CMD => {
                let request = AmsHeader::from_bytes(&frame.payload).unwrap();
                let data = &frame.payload[AMS_HEADER_SIZE..];
                match behaviour {
                    Behaviour::Silent => continue,
                    Behaviour::StaleFirst => {
                        let mut stale = request;
                        stale.invoke_id = request.invoke_id.wrapping_add(1000);
                        send_frame(&mut stream, response(&stale, 0, &0u32.to_le_bytes()));
                    }
                    Behaviour::Normal => {}
                }
                let reply = handle(&request, data, &device);
                send_frame(&mut stream, reply);
            }
            other => panic!("simulator got unknown AMS/TCP command 0x{other:04X}"),
        }
    }
}

fn u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

fn read_reply(result: u32, data: &[u8]) -> Vec<u8> {
    let mut out = result.to_le_bytes().to_vec();
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

fn handle(request: &AmsHeader, data: &[u8], device: &Mutex<Device>) -> AmsTcpFrame {
    let mut device = device.lock().unwrap();
    match AdsCommand::from_id(request.command_id) {
        Some(AdsCommand::ReadWrite) if u32_at(data, 0) == ADSIGRP_SYM_INFOBYNAMEEX => {
            let write_len = u32_at(data, 12) as usize;
            let name = &data[16..16 + write_len];
            let name = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));
            let body = match device.symbols.get(&*name) {
                Some(entry) => read_reply(0, &entry.to_bytes()),
                None => read_reply(ADSERR_DEVICE_SYMBOLNOTFOUND, &[]),
            };
            response(request, 0, &body)
        }
        Some(AdsCommand::Read) => {
            let key = (u32_at(data, 0), u32_at(data, 4));
            let length = u32_at(data, 8) as usize;
            let body = match device.memory.get(&key) {
                Some(value) if value.len() >= length => read_reply(0, &value[..length]),
                _ => read_reply(ADSERR_DEVICE_INVALIDOFFSET, &[]),
            };
            response(request, 0, &body)
        }
        Some(AdsCommand::Write) => {
            let key = (u32_at(data, 0), u32_at(data, 4));
            let length = u32_at(data, 8) as usize;
            let result = match device.memory.get_mut(&key) {
                Some(value) if value.len() == length => {
                    value.copy_from_slice(&data[12..12 + length]);
                    0
                }
                _ => ADSERR_DEVICE_INVALIDOFFSET,
            };
            response(request, 0, &result.to_le_bytes())
        }
        Some(AdsCommand::ReadState) => {
            let mut body = 0u32.to_le_bytes().to_vec();
            body.extend_from_slice(&5u16.to_le_bytes());
            body.extend_from_slice(&0u16.to_le_bytes());
            response(request, 0, &body)
        }
        Some(AdsCommand::ReadDeviceInfo) => {
            let mut body = 0u32.to_le_bytes().to_vec();
            body.extend_from_slice(&[3, 1]);
            body.extend_from_slice(&4024u16.to_le_bytes());
            let mut name = [0u8; 16];
            name[..9].copy_from_slice(b"Plc30 App");
            body.extend_from_slice(&name);
            response(request, 0, &body)
        }
        _ => response(request, ADSERR_DEVICE_SRVNOTSUPP, &[]),
    }
}
