//! Application-layer frames exchanged with the remote device
//!
//! Layout: `[type][serial x3][op][payload...][crc8]`. The CRC covers every
//! preceding byte and the whole frame is 4b6b encoded by the bridge channel.

use crate::core::constants::{OP_ACK, OP_POWER_ON, OP_READ_MODEL, PACKET_TYPE_DEVICE};
use crate::core::Serial;
use crate::processing::checksum;

/// Header bytes before the payload: type, serial, op
const HEADER_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: u8,
    pub serial: Serial,
    pub op: u8,
    pub payload: Vec<u8>,
    /// Whether the received checksum matched; always true for built packets
    pub valid: bool,
}

impl Packet {
    pub fn new(serial: Serial, op: u8, payload: Vec<u8>) -> Self {
        Self {
            kind: PACKET_TYPE_DEVICE,
            serial,
            op,
            payload,
            valid: true,
        }
    }

    /// Identify probe (read model), used for wake-up and tuning
    pub fn probe(serial: Serial) -> Self {
        Self::new(serial, OP_READ_MODEL, vec![0x00])
    }

    /// Wake-up command sent as a long burst to a sleeping device
    pub fn wake(serial: Serial) -> Self {
        Self::new(serial, OP_POWER_ON, vec![0x00])
    }

    pub fn ack(serial: Serial) -> Self {
        Self::new(serial, OP_ACK, vec![0x00])
    }

    pub fn is_ack(&self) -> bool {
        self.op == OP_ACK
    }

    /// Serialize with the trailing checksum
    pub fn assemble(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len() + 1);
        buf.push(self.kind);
        buf.extend_from_slice(self.serial.as_bytes());
        buf.push(self.op);
        buf.extend_from_slice(&self.payload);
        buf.push(checksum::compute(&buf));
        buf
    }

    /// Parse a decoded radio frame. Returns None when the buffer is too short
    /// to hold a header and checksum; a checksum mismatch only clears `valid`.
    pub fn from_buffer(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN + 1 {
            return None;
        }

        let (body, crc) = buf.split_at(buf.len() - 1);
        Some(Self {
            kind: body[0],
            serial: Serial([body[1], body[2], body[3]]),
            op: body[4],
            payload: body[HEADER_LEN..].to_vec(),
            valid: checksum::compute(body) == crc[0],
        })
    }

    /// True when this frame is intact and addressed to `serial`
    pub fn responds_to(&self, serial: Serial) -> bool {
        self.valid && self.serial == serial
    }
}
