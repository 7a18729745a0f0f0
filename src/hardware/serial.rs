//! USB-serial transport for the bridge dongle

use crate::hardware::{LinkError, LinkResult, Transport, TransportConfig};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Largest chunk pulled from the port per read call
const READ_CHUNK: usize = 256;

pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Create an unopened serial transport
    pub fn new(config: &TransportConfig) -> LinkResult<Self> {
        config.validate()?;
        Ok(Self {
            port_name: config.port.clone(),
            baud_rate: config.baud_rate,
            port: None,
        })
    }

    fn port(&mut self) -> LinkResult<&mut Box<dyn SerialPort>> {
        let name = &self.port_name;
        self.port.as_mut().ok_or_else(|| LinkError::Transport {
            port: name.clone(),
            details: "port is not open".to_string(),
        })
    }

    fn io_error(&self, err: std::io::Error) -> LinkError {
        LinkError::Transport {
            port: self.port_name.clone(),
            details: err.to_string(),
        }
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> LinkResult<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(&self.port_name, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()?;

        log::info!("Opened serial port: {} at {} baud", self.port_name, self.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::info!("Closed serial port: {}", self.port_name);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, data: &[u8]) -> LinkResult<()> {
        let result = {
            let port = self.port()?;
            port.write_all(data).and_then(|_| port.flush())
        };
        result.map_err(|e| self.io_error(e))
    }

    fn read(&mut self, timeout: Duration) -> LinkResult<Vec<u8>> {
        let mut buffer = [0u8; READ_CHUNK];
        let result = {
            let port = self.port()?;
            port.set_timeout(timeout)?;
            port.read(&mut buffer)
        };

        match result {
            Ok(n) => Ok(buffer[..n].to_vec()),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}
