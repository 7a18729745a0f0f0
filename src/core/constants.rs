//! Wire-level constants for the subg_rfspy bridge and the remote device

/// Bridge firmware opcodes
pub const CMD_GET_STATE: u8 = 0x01;
pub const CMD_GET_VERSION: u8 = 0x02;
pub const CMD_GET_PACKET: u8 = 0x03;
pub const CMD_SEND_PACKET: u8 = 0x04;
pub const CMD_SEND_AND_LISTEN: u8 = 0x05;
pub const CMD_UPDATE_REGISTER: u8 = 0x06;
pub const CMD_RESET: u8 = 0x07;

/// Sentinel byte terminating every bridge response
pub const RESPONSE_TERMINATOR: u8 = 0x00;

/// Error codes reported in short (<= 2 byte) bridge responses
pub const RFSPY_ERROR_TIMEOUT: u8 = 0xAA;
pub const RFSPY_ERROR_INTERRUPTED: u8 = 0xBB;
pub const RFSPY_ERROR_ZERO_DATA: u8 = 0xCC;

/// Maximum repetitions the firmware accepts in one send-packet command
pub const MAX_REPETITION_BATCHSIZE: usize = 250;

/// Air time allowance per repeated transmission (milliseconds)
pub const TRANSMISSION_TIME_MS: u64 = 50;

/// Offset applied when converting the raw RSSI byte to dBm
pub const RSSI_OFFSET: i16 = 73;

/// Crystal frequency of the CC111x radio (Hz)
pub const FREQ_XTAL: f64 = 24_000_000.0;

/// Packet type byte for frames addressed to the remote device
pub const PACKET_TYPE_DEVICE: u8 = 0xA7;

/// Remote device operation codes used by the link itself
pub const OP_ACK: u8 = 0x06;
pub const OP_POWER_ON: u8 = 0x5D;
pub const OP_READ_MODEL: u8 = 0x8D;

/// Fixed payload length of a frame on the remote device link
pub const FRAME_PAYLOAD_SIZE: usize = 64;

/// RSSI recorded for a failed tuning sample
pub const FAILED_SAMPLE_RSSI: f64 = -99.0;

/// Firmware versions this link can drive
pub const SUPPORTED_VERSIONS: [&str; 7] = ["0.6", "0.7", "0.8", "0.9", "1.0", "2.0", "2.2"];

/// Firmware versions that take a 16-bit listen timeout
pub const UINT16_TIMEOUT_VERSIONS: [&str; 1] = ["0.6"];
