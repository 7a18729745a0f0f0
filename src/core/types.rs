//! Core data types shared by the bridge, executor and tuner

use crate::core::constants::RSSI_OFFSET;
use crate::hardware::{LinkError, LinkResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 3-byte remote device serial number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Serial(pub [u8; 3]);

impl Serial {
    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }
}

impl FromStr for Serial {
    type Err = LinkError;

    /// Parse six hex characters, e.g. "208850"
    fn from_str(s: &str) -> LinkResult<Self> {
        let s = s.trim();
        if s.len() != 6 || !s.is_ascii() {
            return Err(LinkError::invalid_configuration("serial", s));
        }
        let mut bytes = [0u8; 3];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| LinkError::invalid_configuration("serial", s))?;
        }
        Ok(Serial(bytes))
    }
}

impl TryFrom<String> for Serial {
    type Error = LinkError;

    fn try_from(value: String) -> LinkResult<Self> {
        value.parse()
    }
}

impl From<Serial> for String {
    fn from(serial: Serial) -> Self {
        serial.to_string()
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

/// Decoded packet as reported by the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    /// Signal strength in dBm
    pub rssi: i16,
    /// Bridge packet sequence counter
    pub sequence: u8,
    /// Line-decoded radio payload
    pub payload: Vec<u8>,
}

impl ResponseRecord {
    pub fn new(rssi_raw: u8, sequence: u8, payload: Vec<u8>) -> Self {
        Self {
            rssi: decode_rssi(rssi_raw),
            sequence,
            payload,
        }
    }
}

/// Convert the raw RSSI byte into dBm.
///
/// Values >= 128 are two's complement; halving floors toward negative infinity.
pub fn decode_rssi(raw: u8) -> i16 {
    let value = if raw >= 128 {
        (raw as i16 - 256) >> 1
    } else {
        (raw as i16) >> 1
    };
    value - RSSI_OFFSET
}

/// Lowercase hex rendering used in log output
pub fn hexify(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse a hex string such as "8d00" into bytes
pub fn parse_hex(s: &str) -> LinkResult<Vec<u8>> {
    let s = s.trim();
    if s.len() % 2 != 0 || !s.is_ascii() {
        return Err(LinkError::invalid_configuration("hex", s));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| LinkError::invalid_configuration("hex", s))
        })
        .collect()
}
