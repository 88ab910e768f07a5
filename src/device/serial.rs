//! Serial line framing and per-jack line dispatch.
//!
//! Lines travel as `*<payload>\r`. The payload is `<tag>[:<field>]*`;
//! the pairing core understands two tags, `smac` (address announcement)
//! and `hb` (heartbeat). Other subsystems may use any other tag on the
//! same jack.

use super::drivers::SerialDriver;
use super::jack::{Jack, MacAddress};
use bytes::{BufMut, BytesMut};
use std::fmt;
use tracing::{trace, warn};

pub const LINE_START: u8 = b'*';
pub const LINE_END: u8 = b'\r';

/// Longest payload kept; longer lines are discarded.
pub const MAX_LINE_LEN: usize = 128;

pub const MAC_ANNOUNCEMENT_TAG: &str = "smac";
pub const HEARTBEAT_TAG: &str = "hb";

/// A decoded line payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialMessage {
    /// `smac:<AA:BB:CC:DD:EE:FF>`
    MacAnnouncement(MacAddress),
    /// `hb`
    Heartbeat,
    /// Any other payload, kept verbatim.
    Other(String),
}

impl SerialMessage {
    pub fn parse(line: &str) -> Self {
        let (tag, rest) = match line.split_once(':') {
            Some((tag, rest)) => (tag, Some(rest)),
            None => (line, None),
        };

        match (tag, rest) {
            (HEARTBEAT_TAG, _) => SerialMessage::Heartbeat,
            (MAC_ANNOUNCEMENT_TAG, Some(field)) => match field.parse() {
                Ok(mac) => SerialMessage::MacAnnouncement(mac),
                Err(_) => SerialMessage::Other(line.to_string()),
            },
            _ => SerialMessage::Other(line.to_string()),
        }
    }
}

impl fmt::Display for SerialMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialMessage::MacAnnouncement(mac) => write!(f, "{MAC_ANNOUNCEMENT_TAG}:{mac}"),
            SerialMessage::Heartbeat => f.write_str(HEARTBEAT_TAG),
            SerialMessage::Other(line) => f.write_str(line),
        }
    }
}

/// Frame a payload for the wire.
pub fn encode_line(payload: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 2);
    bytes.push(LINE_START);
    bytes.extend_from_slice(payload.as_bytes());
    bytes.push(LINE_END);
    bytes
}

/// Receives each complete line read on a jack.
pub type LineCallback = Box<dyn FnMut(&str)>;

struct JackPort {
    driver: Box<dyn SerialDriver>,
    buffer: BytesMut,
    in_line: bool,
    callback: Option<LineCallback>,
}

impl JackPort {
    fn new(driver: Box<dyn SerialDriver>) -> Self {
        Self {
            driver,
            buffer: BytesMut::with_capacity(MAX_LINE_LEN),
            in_line: false,
            callback: None,
        }
    }

    fn pump(&mut self, jack: Jack) {
        for byte in self.driver.read_bytes() {
            match byte {
                LINE_START => {
                    self.buffer.clear();
                    self.in_line = true;
                }
                LINE_END if self.in_line => {
                    self.in_line = false;
                    let raw = self.buffer.split();
                    let line = String::from_utf8_lossy(&raw).into_owned();
                    match self.callback.as_mut() {
                        Some(callback) => callback(&line),
                        None => trace!(%jack, line = %line, "no listener, line dropped"),
                    }
                }
                _ if self.in_line => {
                    if self.buffer.len() >= MAX_LINE_LEN {
                        warn!(%jack, "serial line too long, discarding");
                        self.buffer.clear();
                        self.in_line = false;
                    } else {
                        self.buffer.put_u8(byte);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Owns both jacks and routes received lines to one callback per jack.
pub struct SerialManager {
    ports: [JackPort; 2],
}

impl SerialManager {
    pub fn new(output: Box<dyn SerialDriver>, input: Box<dyn SerialDriver>) -> Self {
        Self {
            ports: [JackPort::new(output), JackPort::new(input)],
        }
    }

    pub fn write_line(&mut self, jack: Jack, payload: &str) {
        trace!(%jack, payload, "serial write");
        self.ports[jack.slot()].driver.write_bytes(&encode_line(payload));
    }

    pub fn write_message(&mut self, jack: Jack, message: &SerialMessage) {
        self.write_line(jack, &message.to_string());
    }

    /// Register the single line listener for `jack`, replacing any other.
    pub fn set_line_callback(&mut self, jack: Jack, callback: LineCallback) {
        self.ports[jack.slot()].callback = Some(callback);
    }

    pub fn clear_callback(&mut self, jack: Jack) {
        self.ports[jack.slot()].callback = None;
    }

    pub fn has_callback(&self, jack: Jack) -> bool {
        self.ports[jack.slot()].callback.is_some()
    }

    /// Read both jacks and dispatch complete lines, OUTPUT first.
    pub fn pump(&mut self) {
        for jack in Jack::ALL {
            self.ports[jack.slot()].pump(jack);
        }
    }
}
