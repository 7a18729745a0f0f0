//! Sub-GHz radio bridge link
//!
//! Drives a radio dongle running subg_rfspy firmware to exchange framed
//! packets with a battery-powered remote device, and finds the frequency
//! that device is actually listening on.
//!
//! Layers, bottom up:
//! - `processing`: 4b6b line code, CRC-8 checksum and the device packet
//! - `radio`: register map and the in-memory radio configuration
//! - `hardware`: transports and the bridge command protocol
//! - `api`: command delivery to the remote device
//! - `tuning`: wake-up and frequency scan

pub mod core;
pub mod processing;
pub mod radio;
pub mod hardware;
pub mod api;
pub mod tuning;
pub mod utils;

pub use core::{ResponseRecord, Serial};
pub use processing::Packet;
pub use radio::{Locale, RadioConfig};
pub use hardware::{
    BridgeChannel, BridgeConfig, LinkError, LinkResult, MockTransport, RecoveryStrategy, SerialTransport, Transport,
    TransportConfig,
};
pub use api::{Command, ExecutorConfig, GenericCommand, RemoteDevice, Repeater, Sender};
pub use tuning::{FrequencyTuner, TunerConfig, TuningReport, TuningTrial};
pub use utils::LinkConfig;
