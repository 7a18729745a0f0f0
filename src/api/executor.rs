//! Command delivery to the remote device
//!
//! `Sender` walks one command through prelude, optional parameter upload and
//! response reassembly. `Repeater` blasts a parameterless command many times
//! and waits once for an acknowledgement.

use crate::api::command::Command;
use crate::core::constants::{FRAME_PAYLOAD_SIZE, OP_ACK};
use crate::core::hexify;
use crate::hardware::{BridgeChannel, LinkError, LinkResult, Transport};
use crate::processing::Packet;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Attempts a caller should make around a failed exchange
pub const STANDARD_RETRY_COUNT: u32 = 3;

/// Pause between those attempts
pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Executor timing and retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Listen window for each packet read
    pub read_timeout_ms: u64,
    /// Give up on a command when nothing completes it within this time
    pub response_timeout_ms: u64,
    /// Outer retry attempts applied by `RemoteDevice::execute_with_retry`
    pub retry_count: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 500,
            response_timeout_ms: 15_000,
            retry_count: STANDARD_RETRY_COUNT,
            retry_backoff_ms: RETRY_BACKOFF.as_millis() as u64,
        }
    }
}

impl ExecutorConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn validate(&self) -> LinkResult<()> {
        if self.read_timeout_ms == 0 {
            return Err(LinkError::invalid_configuration("executor.read_timeout_ms", 0));
        }
        if self.response_timeout_ms == 0 {
            return Err(LinkError::invalid_configuration("executor.response_timeout_ms", 0));
        }
        if self.retry_count == 0 {
            return Err(LinkError::invalid_configuration("executor.retry_count", 0));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Init,
    PreludeSent,
    AwaitingAck,
    ParamsSent,
    AwaitingResponse,
    Done,
}

/// Drives a single command to completion
pub struct Sender<'a, T: Transport, C: Command> {
    link: &'a mut BridgeChannel<T>,
    command: C,
    config: ExecutorConfig,
    state: ExecutorState,
    sent_params: bool,
    expected: usize,
    frames: Vec<(u8, Vec<u8>)>,
    deadline: Option<Instant>,
}

impl<'a, T: Transport, C: Command> Sender<'a, T, C> {
    pub fn new(link: &'a mut BridgeChannel<T>, command: C, config: ExecutorConfig) -> Self {
        let expected = command.bytes_per_record() * command.max_records();
        Self {
            link,
            command,
            config,
            state: ExecutorState::Init,
            sent_params: false,
            expected,
            frames: Vec::new(),
            deadline: None,
        }
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn command(&self) -> &C {
        &self.command
    }

    /// Frames received so far as (frame number, data)
    pub fn frames(&self) -> &[(u8, Vec<u8>)] {
        &self.frames
    }

    fn needs_params(&self) -> bool {
        !self.command.params().is_empty()
    }

    fn is_multi_frame(&self) -> bool {
        self.expected > FRAME_PAYLOAD_SIZE
    }

    /// False while parameters are owed to the device, otherwise the
    /// command's own verdict
    pub fn done(&self) -> bool {
        if self.needs_params() && !self.sent_params {
            return false;
        }
        self.command.done()
    }

    /// Run the exchange and hand the completed command back
    pub fn run(mut self) -> LinkResult<C> {
        self.config.validate()?;
        log::debug!(
            "starting {} for {}",
            self.command.description(),
            self.command.serial()
        );
        self.deadline = Some(Instant::now() + self.config.response_timeout());

        self.prelude()?;
        self.upload()?;

        self.state = ExecutorState::AwaitingResponse;
        while !self.done() {
            if let Some(packet) = self.next_packet()? {
                if self.respond(packet)? {
                    break;
                }
            }
        }

        self.state = ExecutorState::Done;
        log::debug!("{} complete", self.command.description());
        Ok(self.command)
    }

    fn send(&mut self, packet: &Packet) -> LinkResult<()> {
        self.link.write(&packet.assemble(), 1, 0, None)
    }

    /// Announce the command with a single zero byte payload
    fn prelude(&mut self) -> LinkResult<()> {
        let packet = Packet::new(self.command.serial(), self.command.code(), vec![0x00]);
        self.send(&packet)?;
        self.state = ExecutorState::PreludeSent;
        Ok(())
    }

    fn upload(&mut self) -> LinkResult<()> {
        if !self.needs_params() {
            return Ok(());
        }

        self.state = ExecutorState::AwaitingAck;
        self.wait_for_ack()?;
        self.send_params()?;
        self.state = ExecutorState::ParamsSent;
        Ok(())
    }

    /// Length byte, parameters, then zero padding to a full frame
    fn send_params(&mut self) -> LinkResult<()> {
        let params = self.command.params();
        if params.len() > FRAME_PAYLOAD_SIZE {
            return Err(LinkError::invalid_configuration("params length", params.len()));
        }

        let mut payload = Vec::with_capacity(FRAME_PAYLOAD_SIZE + 1);
        payload.push(params.len() as u8);
        payload.extend_from_slice(params);
        payload.resize(FRAME_PAYLOAD_SIZE + 1, 0x00);

        log::debug!("uploading params {}", hexify(params));
        let packet = Packet::new(self.command.serial(), self.command.code(), payload);
        self.send(&packet)?;
        self.sent_params = true;
        Ok(())
    }

    fn ack(&mut self) -> LinkResult<()> {
        let packet = Packet::ack(self.command.serial());
        self.send(&packet)
    }

    fn wait_for_ack(&mut self) -> LinkResult<Packet> {
        loop {
            if let Some(packet) = self.next_packet()? {
                if packet.op == OP_ACK {
                    return Ok(packet);
                }
            }
        }
    }

    /// Read one frame addressed to our device. A quiet window or a garbled
    /// frame yields None; hitting the response deadline is a timeout.
    fn next_packet(&mut self) -> LinkResult<Option<Packet>> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(LinkError::timeout(format!(
                    "no completion for {} within {}ms",
                    self.command.description(),
                    self.config.response_timeout_ms
                )));
            }
        }

        let buf = match self.link.read(Some(self.config.read_timeout())) {
            Ok(buf) => buf,
            Err(e) if e.is_retryable() => {
                log::debug!("no frame yet: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        log::debug!("packet: {}", hexify(&buf));
        let serial = self.command.serial();
        Ok(Packet::from_buffer(&buf).filter(|p| p.responds_to(serial)))
    }

    /// Dispatch one frame; returns true when the exchange is finished
    fn respond(&mut self, packet: Packet) -> LinkResult<bool> {
        if packet.op == OP_ACK {
            if self.needs_params() && !self.sent_params {
                return Ok(false);
            }
            log::debug!("ack received, {} complete", self.command.description());
            return Ok(true);
        }

        if packet.op == self.command.code() {
            self.unframe(packet)?;
            return Ok(self.done());
        }

        Ok(false)
    }

    /// Strip per-frame numbering from multi-frame responses and ask for the
    /// next frame; single-frame payloads pass straight through
    fn unframe(&mut self, packet: Packet) -> LinkResult<()> {
        if self.is_multi_frame() {
            let (num, data) = match packet.payload.split_first() {
                Some((num, data)) => (*num, data.to_vec()),
                None => (0, Vec::new()),
            };
            log::debug!("frame {} ({} bytes)", num, data.len());
            self.frames.push((num, data.clone()));
            self.ack()?;
            self.command.respond(&data);
        } else {
            self.command.respond(&packet.payload);
        }
        Ok(())
    }
}

/// Fire-and-forget repeated transmission
pub struct Repeater<'a, T: Transport> {
    link: &'a mut BridgeChannel<T>,
}

impl<'a, T: Transport> Repeater<'a, T> {
    pub fn new(link: &'a mut BridgeChannel<T>) -> Self {
        Self { link }
    }

    /// Send `command` `repetitions` times in one write, then listen once for
    /// an acknowledgement
    pub fn send<C: Command>(&mut self, command: &C, repetitions: usize, ack_wait: Duration) -> LinkResult<Packet> {
        let payload = if command.params().is_empty() {
            vec![0x00]
        } else {
            command.params().to_vec()
        };
        let packet = Packet::new(command.serial(), command.code(), payload);
        let buf = packet.assemble();
        log::info!("Sending repeated message {} x{}", hexify(&buf), repetitions);

        self.link.write(&buf, repetitions, 0, None)?;

        let record = self.link.get_packet(ack_wait)?;
        match Packet::from_buffer(&record.payload) {
            Some(reply) if reply.responds_to(command.serial()) && reply.op == OP_ACK => Ok(reply),
            _ => Err(LinkError::comms(format!(
                "expected ack from {}, got {}",
                command.serial(),
                hexify(&record.payload)
            ))),
        }
    }
}
