//! Session with one remote device behind the bridge

use crate::api::command::Command;
use crate::api::executor::{ExecutorConfig, Repeater, Sender};
use crate::core::Serial;
use crate::hardware::{BridgeChannel, LinkResult, Transport};
use crate::processing::Packet;
use std::thread;
use std::time::Duration;

/// Commands addressed to a single serial over an open bridge
pub struct RemoteDevice<T: Transport> {
    link: BridgeChannel<T>,
    serial: Serial,
    config: ExecutorConfig,
}

impl<T: Transport> RemoteDevice<T> {
    pub fn new(link: BridgeChannel<T>, serial: Serial, config: ExecutorConfig) -> Self {
        Self { link, serial, config }
    }

    pub fn serial(&self) -> Serial {
        self.serial
    }

    pub fn link(&self) -> &BridgeChannel<T> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut BridgeChannel<T> {
        &mut self.link
    }

    pub fn into_link(self) -> BridgeChannel<T> {
        self.link
    }

    /// Address `command` to this device and run it once
    pub fn execute<C: Command>(&mut self, mut command: C) -> LinkResult<C> {
        command.set_serial(self.serial);
        Sender::new(&mut self.link, command, self.config.clone()).run()
    }

    /// Re-run the whole exchange on retryable failures, pausing between tries
    pub fn execute_with_retry<C: Command + Clone>(&mut self, command: C) -> LinkResult<C> {
        let attempts = self.config.retry_count.max(1);
        let mut attempt = 1;
        loop {
            match self.execute(command.clone()) {
                Ok(done) => return Ok(done),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    log::warn!(
                        "{} failed (attempt {}/{}): {}",
                        command.description(),
                        attempt,
                        attempts,
                        e
                    );
                    thread::sleep(self.config.retry_backoff());
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Repeat a parameterless command and wait for the device's ack
    pub fn broadcast<C: Command>(
        &mut self,
        mut command: C,
        repetitions: usize,
        ack_wait: Duration,
    ) -> LinkResult<Packet> {
        command.set_serial(self.serial);
        Repeater::new(&mut self.link).send(&command, repetitions, ack_wait)
    }
}
