//! Byte-level transport trait and configuration

use crate::hardware::{LinkError, LinkResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Duplex byte channel to the bridge dongle
pub trait Transport {
    /// Open the underlying device. Opening an open transport is a no-op.
    fn open(&mut self) -> LinkResult<()>;

    /// Close the device, dropping any buffered input
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Write all of `data`; fails with `LinkError::Transport` on disconnect
    fn write(&mut self, data: &[u8]) -> LinkResult<()>;

    /// Return whatever arrives within `timeout`.
    /// An empty result means the window elapsed with nothing received.
    fn read(&mut self, timeout: Duration) -> LinkResult<Vec<u8>>;

    /// Device name for log and error messages
    fn name(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> LinkResult<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write(&mut self, data: &[u8]) -> LinkResult<()> {
        (**self).write(data)
    }

    fn read(&mut self, timeout: Duration) -> LinkResult<Vec<u8>> {
        (**self).read(timeout)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Communication interface types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    /// USB-serial bridge
    #[default]
    Serial,
    /// In-memory transport for testing
    Mock,
}

/// Transport parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub interface: InterfaceType,
    /// Serial device path, e.g. /dev/ttyACM0
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    19200
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            interface: InterfaceType::Serial,
            port: "/dev/ttyACM0".to_string(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl TransportConfig {
    pub fn serial(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            interface: InterfaceType::Serial,
            port: port.into(),
            baud_rate,
        }
    }

    pub fn mock() -> Self {
        Self {
            interface: InterfaceType::Mock,
            port: "mock".to_string(),
            baud_rate: default_baud_rate(),
        }
    }

    pub fn validate(&self) -> LinkResult<()> {
        if self.interface == InterfaceType::Serial {
            if self.port.is_empty() {
                return Err(LinkError::invalid_configuration("port", "<empty>"));
            }
            if self.baud_rate == 0 {
                return Err(LinkError::invalid_configuration("baud_rate", self.baud_rate));
            }
        }
        Ok(())
    }
}
