//! subg_rfspy bridge firmware protocol
//!
//! Requests are `[len][opcode][params...]` where `len` counts the opcode and
//! params. Responses are raw bytes terminated by 0x00. Packet responses are
//! `[rssi][sequence][4b6b payload...]`; anything of two bytes or fewer is an
//! error code.

use crate::core::constants::*;
use crate::core::{hexify, ResponseRecord};
use crate::hardware::{LinkError, LinkResult, Transport};
use crate::processing::line_code;
use crate::radio::{registers, RadioConfig};
use std::thread;
use std::time::{Duration, Instant};

/// Registers written when only the carrier frequency changes
const FREQUENCY_REGISTERS: [&str; 3] = ["freq0", "freq1", "freq2"];

/// Grace period added to the firmware's own listen timeout
const RESPONSE_GRACE: Duration = Duration::from_secs(1);

/// Timeout used for the state and version handshake
const SYNC_TIMEOUT: Duration = Duration::from_secs(1);

/// How long to wait for more bytes once a response holds a terminator that
/// is not its last byte
const TRAILING_WINDOW: Duration = Duration::from_millis(20);

/// Width of the listen timeout field in get-packet / send-and-listen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutWidth {
    U16,
    U32,
}

impl TimeoutWidth {
    /// Big-endian millisecond timeout field
    pub fn encode(&self, timeout: Duration) -> Vec<u8> {
        let ms = timeout.as_millis();
        match self {
            TimeoutWidth::U16 => (ms.min(u16::MAX as u128) as u16).to_be_bytes().to_vec(),
            TimeoutWidth::U32 => (ms.min(u32::MAX as u128) as u32).to_be_bytes().to_vec(),
        }
    }
}

/// Session parameters for the bridge
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Default window for command responses and packet reads
    pub default_timeout: Duration,
    /// Pause between frequency register writes while the synthesizer settles
    pub settle_delay: Duration,
    pub supported_versions: Vec<String>,
    pub uint16_timeout_versions: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
            supported_versions: SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect(),
            uint16_timeout_versions: UINT16_TIMEOUT_VERSIONS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Command channel to the bridge firmware
pub struct BridgeChannel<T: Transport> {
    transport: T,
    radio: RadioConfig,
    config: BridgeConfig,
    firmware_version: Option<String>,
    timeout_width: TimeoutWidth,
    /// Bytes read past the end of the previous response
    pending: Vec<u8>,
}

impl<T: Transport> BridgeChannel<T> {
    /// Wrap a transport without performing any I/O
    pub fn new(transport: T, radio: RadioConfig, config: BridgeConfig) -> Self {
        Self {
            transport,
            radio,
            config,
            firmware_version: None,
            timeout_width: TimeoutWidth::U32,
            pending: Vec::new(),
        }
    }

    /// Open the transport, verify the firmware and push the full register set
    pub fn open(transport: T, radio: RadioConfig, config: BridgeConfig) -> LinkResult<Self> {
        let mut link = Self::new(transport, radio, config);
        link.transport.open()?;
        link.check_setup()?;
        link.apply_full_config()?;
        Ok(link)
    }

    pub fn close(&mut self) {
        self.transport.close();
    }

    pub fn radio(&self) -> &RadioConfig {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut RadioConfig {
        &mut self.radio
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    pub fn timeout_width(&self) -> TimeoutWidth {
        self.timeout_width
    }

    /// Probe state and version, then pick the timeout width for this firmware
    pub fn check_setup(&mut self) -> LinkResult<()> {
        let version_reply = self.sync()?;
        let version = version_reply
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| LinkError::comms(format!("Malformed version reply: {:?}", version_reply)))?
            .to_string();

        log::debug!("subg_rfspy firmware version: {}", version);

        if !self.config.supported_versions.iter().any(|v| *v == version) {
            return Err(LinkError::UnsupportedFirmware {
                version,
                supported: self.config.supported_versions.join(", "),
            });
        }

        self.timeout_width = if self.config.uint16_timeout_versions.iter().any(|v| *v == version) {
            TimeoutWidth::U16
        } else {
            TimeoutWidth::U32
        };
        log::info!("Connected to subg_rfspy {} on {}", version, self.transport.name());
        self.firmware_version = Some(version);
        Ok(())
    }

    /// Fetch state ("OK") and the raw version string
    pub fn sync(&mut self) -> LinkResult<String> {
        let status = self.do_command(CMD_GET_STATE, &[], SYNC_TIMEOUT)?;
        if status == b"OK" {
            log::debug!("subg_rfspy status: OK");
        }

        let version = self.do_command(CMD_GET_VERSION, &[], SYNC_TIMEOUT)?;

        if status.is_empty() || version.is_empty() {
            return Err(LinkError::comms(
                "Could not get subg_rfspy state or version. Check the port and radio type",
            ));
        }

        Ok(String::from_utf8_lossy(&version).trim().to_string())
    }

    /// Write one request frame
    pub fn send_command(&mut self, opcode: u8, params: &[u8]) -> LinkResult<()> {
        let len = params.len() + 1;
        if len > u8::MAX as usize {
            return Err(LinkError::invalid_configuration("command length", len));
        }

        let mut frame = Vec::with_capacity(len + 1);
        frame.push(len as u8);
        frame.push(opcode);
        frame.extend_from_slice(params);

        log::debug!("command {} params {}", opcode, hexify(params));
        self.transport.write(&frame)
    }

    /// Send a command and wait for its response
    pub fn do_command(&mut self, opcode: u8, params: &[u8], timeout: Duration) -> LinkResult<Vec<u8>> {
        self.send_command(opcode, params)?;
        self.get_response(timeout)
    }

    /// Collect bytes until the terminator or the timeout. The terminator is
    /// stripped; an elapsed timeout yields an empty response.
    ///
    /// A response normally ends where a chunk ends with 0x00. Packet headers
    /// may contain zero bytes, so a terminator followed by more data is only
    /// taken as the end once the line goes quiet; the bytes after it are
    /// kept for the next call.
    pub fn get_response(&mut self, timeout: Duration) -> LinkResult<Vec<u8>> {
        if timeout.is_zero() {
            return Err(LinkError::invalid_configuration("timeout", "0ms"));
        }

        let deadline = Instant::now() + timeout;
        let mut response = std::mem::take(&mut self.pending);

        loop {
            if response.last() == Some(&RESPONSE_TERMINATOR) {
                response.pop();
                log::debug!("response {}", hexify(&response));
                return Ok(response);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            let chunk = if remaining.is_zero() {
                Vec::new()
            } else if response.contains(&RESPONSE_TERMINATOR) {
                self.transport.read(remaining.min(TRAILING_WINDOW))?
            } else {
                self.transport.read(remaining)?
            };

            if chunk.is_empty() {
                return Ok(self.split_at_terminator(response));
            }
            response.extend_from_slice(&chunk);
        }
    }

    /// End of a quiet read: cut at the last terminator and keep the tail
    fn split_at_terminator(&mut self, mut response: Vec<u8>) -> Vec<u8> {
        match response.iter().rposition(|&b| b == RESPONSE_TERMINATOR) {
            Some(end) => {
                self.pending = response.split_off(end + 1);
                response.pop();
                log::debug!(
                    "response {} ({} trailing bytes kept)",
                    hexify(&response),
                    self.pending.len()
                );
                response
            }
            None => {
                log::debug!("gave up waiting for response from subg_rfspy");
                Vec::new()
            }
        }
    }

    /// Turn a raw packet response into a record, classifying error codes
    pub fn handle_response(&self, raw: &[u8]) -> LinkResult<ResponseRecord> {
        parse_response(raw)
    }

    /// Listen for one packet on the receive channel
    pub fn get_packet(&mut self, timeout: Duration) -> LinkResult<ResponseRecord> {
        if timeout.is_zero() {
            return Err(LinkError::invalid_configuration("timeout", "0ms"));
        }
        let mut params = vec![self.radio.rx_channel];
        params.extend(self.timeout_width.encode(timeout));

        let raw = self.do_command(CMD_GET_PACKET, &params, timeout + RESPONSE_GRACE)?;
        parse_response(&raw)
    }

    /// Payload of the next received packet
    pub fn read(&mut self, timeout: Option<Duration>) -> LinkResult<Vec<u8>> {
        let timeout = timeout.unwrap_or(self.config.default_timeout);
        Ok(self.get_packet(timeout)?.payload)
    }

    /// Transmit `payload` `repetitions` times, batching at the firmware limit
    pub fn write(
        &mut self,
        payload: &[u8],
        repetitions: usize,
        repetition_delay_ms: u8,
        timeout: Option<Duration>,
    ) -> LinkResult<()> {
        let mut timeout = timeout.unwrap_or(self.config.default_timeout);
        let encoded = line_code::encode(payload);
        let mut remaining = repetitions;

        while remaining > 0 {
            let transmissions = remaining.min(MAX_REPETITION_BATCHSIZE);
            remaining -= transmissions;

            let min_wait = minimum_write_timeout(transmissions, repetition_delay_ms);
            if timeout < min_wait {
                timeout = min_wait;
            }

            let mut params = vec![
                self.radio.tx_channel,
                (transmissions - 1) as u8,
                repetition_delay_ms,
            ];
            params.extend_from_slice(&encoded);

            log::debug!(
                "write: channel {} x{} delay {}ms: {}",
                self.radio.tx_channel,
                transmissions,
                repetition_delay_ms,
                hexify(payload)
            );
            self.do_command(CMD_SEND_PACKET, &params, timeout)?;
        }
        Ok(())
    }

    /// Transmit and listen for the reply in a single firmware command
    pub fn send_and_listen(
        &mut self,
        payload: &[u8],
        repetitions: usize,
        repetition_delay_ms: u8,
        timeout: Duration,
    ) -> LinkResult<ResponseRecord> {
        if timeout.is_zero() {
            return Err(LinkError::invalid_configuration("timeout", "0ms"));
        }
        let repetitions = repetitions.clamp(1, MAX_REPETITION_BATCHSIZE);
        let retry_count = 0u8;

        let mut params = vec![
            self.radio.tx_channel,
            (repetitions - 1) as u8,
            repetition_delay_ms,
            self.radio.rx_channel,
        ];
        params.extend(self.timeout_width.encode(timeout));
        params.push(retry_count);
        params.extend(line_code::encode(payload));

        log::debug!("send_and_listen: {}", hexify(payload));
        let raw = self.do_command(CMD_SEND_AND_LISTEN, &params, timeout + RESPONSE_GRACE)?;
        parse_response(&raw)
    }

    /// Write one register on the radio; the bridge acknowledges with 0x01
    pub fn update_register(&mut self, register: &str, value: u8) -> LinkResult<()> {
        let def = registers::lookup(register)
            .ok_or_else(|| LinkError::UnknownRegister(register.to_string()))?;

        let timeout = self.config.default_timeout;
        let resp = self.do_command(CMD_UPDATE_REGISTER, &[def.address, value], timeout)?;
        match resp.as_slice() {
            [1] => Ok(()),
            [] => Err(LinkError::comms(format!(
                "Cannot set register {} to 0x{:02x} - received no response",
                register, value
            ))),
            other => Err(LinkError::comms(format!(
                "Cannot set register {} to 0x{:02x} - received response {}",
                register,
                value,
                hexify(other)
            ))),
        }
    }

    /// Set a register in the model and push it to the radio
    pub fn set_register(&mut self, register: &str, value: u8) -> LinkResult<()> {
        self.radio.set(register, value)?;
        self.update_register(register, value)
    }

    /// Retune the radio, writing only the three frequency registers
    pub fn apply_base_freq(&mut self, freq_mhz: f64) -> LinkResult<()> {
        log::info!("Setting frequency {:.3} MHz", freq_mhz);
        self.radio.set_base_freq(freq_mhz);

        for (i, register) in FREQUENCY_REGISTERS.iter().enumerate() {
            if i > 0 && !self.config.settle_delay.is_zero() {
                thread::sleep(self.config.settle_delay);
            }
            let value = self.radio.get(register)?;
            self.update_register(register, value)?;
        }
        Ok(())
    }

    /// Push every register in the model to the radio
    pub fn apply_full_config(&mut self) -> LinkResult<()> {
        for register in RadioConfig::available_registers() {
            let value = self.radio.get(register)?;
            self.update_register(register, value)?;
        }
        log::debug!("Applied {} radio registers", registers::REGISTERS.len());
        Ok(())
    }
}

/// Lower bound on the send-packet timeout for a batch of transmissions
pub fn minimum_write_timeout(transmissions: usize, repetition_delay_ms: u8) -> Duration {
    let per_transmission = TRANSMISSION_TIME_MS + repetition_delay_ms as u64;
    Duration::from_millis(transmissions as u64 * per_transmission) + RESPONSE_GRACE
}

/// Classify and decode a terminator-stripped packet response
pub fn parse_response(raw: &[u8]) -> LinkResult<ResponseRecord> {
    if raw.is_empty() {
        return Err(LinkError::comms("Did not get a response, or response is too short: 0"));
    }

    if raw.len() <= 2 {
        if raw == b"OK" {
            return Err(LinkError::comms("Received null/OK response"));
        }
        return Err(match raw[0] {
            RFSPY_ERROR_TIMEOUT => LinkError::timeout("Timed out receiving data from radio"),
            RFSPY_ERROR_INTERRUPTED => LinkError::comms("Received an error response: Command Interrupted"),
            RFSPY_ERROR_ZERO_DATA => LinkError::comms("Received an error response: Zero Data"),
            code => LinkError::comms(format!("Received an unknown error response 0x{:02x}", code)),
        });
    }

    let payload = line_code::decode(&raw[2..])?;
    Ok(ResponseRecord::new(raw[0], raw[1], payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::{packet_reply, raw_reply, text_reply};
    use crate::hardware::MockTransport;

    fn fast_config() -> BridgeConfig {
        BridgeConfig {
            settle_delay: Duration::ZERO,
            ..BridgeConfig::default()
        }
    }

    fn bridge_firmware(version: &'static str) -> MockTransport {
        MockTransport::with_responder(move |frame| match frame[1] {
            CMD_GET_STATE => vec![text_reply("OK")],
            CMD_GET_VERSION => vec![text_reply(&format!("subg_rfspy {}", version))],
            CMD_UPDATE_REGISTER => vec![raw_reply(&[1])],
            _ => vec![],
        })
    }

    #[test]
    fn test_open_pushes_full_config() {
        let mock = bridge_firmware("0.6");
        let link = BridgeChannel::open(mock.clone(), RadioConfig::default(), fast_config()).unwrap();

        assert_eq!(link.firmware_version(), Some("0.6"));
        assert_eq!(link.timeout_width(), TimeoutWidth::U16);
        assert_eq!(mock.written_with_opcode(CMD_UPDATE_REGISTER).len(), 29);
        assert!(mock.is_open());
    }

    #[test]
    fn test_newer_firmware_uses_wide_timeouts() {
        let mock = bridge_firmware("2.2");
        let link = BridgeChannel::open(mock, RadioConfig::default(), fast_config()).unwrap();
        assert_eq!(link.timeout_width(), TimeoutWidth::U32);
    }

    #[test]
    fn test_unsupported_firmware_is_fatal() {
        let mock = bridge_firmware("0.5");
        let result = BridgeChannel::open(mock.clone(), RadioConfig::default(), fast_config());
        let err = result.err().unwrap();
        assert!(matches!(err, LinkError::UnsupportedFirmware { .. }));
        assert!(!err.is_retryable());
        assert!(mock.written_with_opcode(CMD_UPDATE_REGISTER).is_empty());
    }

    #[test]
    fn test_silent_bridge_fails_sync() {
        let result = BridgeChannel::open(MockTransport::new(), RadioConfig::default(), fast_config());
        assert!(matches!(result, Err(LinkError::Comms { .. })));
    }

    #[test]
    fn test_command_framing() {
        let mock = MockTransport::new();
        let mut link = BridgeChannel::new(mock.clone(), RadioConfig::default(), fast_config());
        link.send_command(CMD_UPDATE_REGISTER, &[0x09, 0x26]).unwrap();
        assert_eq!(mock.written(), vec![vec![3, CMD_UPDATE_REGISTER, 0x09, 0x26]]);
    }

    #[test]
    fn test_get_response_strips_terminator_across_chunks() {
        let mock = MockTransport::new();
        mock.push_reply(b"subg_".to_vec());
        mock.push_reply(text_reply("rfspy 0.6"));
        let mut link = BridgeChannel::new(mock, RadioConfig::default(), fast_config());

        let resp = link.get_response(Duration::from_secs(1)).unwrap();
        assert_eq!(resp, b"subg_rfspy 0.6".to_vec());
        assert!(link.get_response(Duration::from_millis(50)).unwrap().is_empty());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mock = MockTransport::new();
        let mut link = BridgeChannel::new(mock.clone(), RadioConfig::default(), fast_config());
        assert!(matches!(
            link.get_response(Duration::ZERO),
            Err(LinkError::InvalidConfiguration { .. })
        ));
        assert_eq!(mock.read_count(), 0);
    }

    #[test]
    fn test_zero_listen_timeout_never_reaches_bridge() {
        let mock = MockTransport::new();
        let mut link = BridgeChannel::new(mock.clone(), RadioConfig::default(), fast_config());

        assert!(matches!(
            link.get_packet(Duration::ZERO),
            Err(LinkError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            link.send_and_listen(&[0xa7], 1, 0, Duration::ZERO),
            Err(LinkError::InvalidConfiguration { .. })
        ));
        assert!(matches!(link.read(Some(Duration::ZERO)), Err(LinkError::InvalidConfiguration { .. })));
        assert!(mock.written().is_empty());
        assert_eq!(mock.read_count(), 0);
    }

    #[test]
    fn test_get_response_stops_at_inner_terminator() {
        let mock = MockTransport::new();
        mock.push_reply(vec![b'O', b'K', 0x00, 0x55]);
        let mut link = BridgeChannel::new(mock.clone(), RadioConfig::default(), fast_config());

        assert_eq!(link.get_response(Duration::from_millis(200)).unwrap(), b"OK".to_vec());

        // trailing byte is the start of the next response
        mock.push_reply(raw_reply(&[0x01]));
        assert_eq!(link.get_response(Duration::from_millis(200)).unwrap(), vec![0x55, 0x01]);
    }

    #[test]
    fn test_zero_header_bytes_stay_in_packet() {
        let mock = MockTransport::new();
        let reply = packet_reply(0, 0, &[0xa7, 0x20]);
        mock.push_reply(reply[..3].to_vec());
        mock.push_reply(reply[3..].to_vec());
        let mut link = BridgeChannel::new(mock, RadioConfig::default(), fast_config());

        let record = link.get_packet(Duration::from_millis(100)).unwrap();
        assert_eq!(record.rssi, -73);
        assert_eq!(record.sequence, 0);
        assert_eq!(record.payload, vec![0xa7, 0x20]);
    }

    #[test]
    fn test_error_table_classification() {
        assert!(matches!(parse_response(&[]), Err(LinkError::Comms { .. })));
        assert!(matches!(parse_response(&[0xAA]), Err(LinkError::Timeout { .. })));
        assert!(matches!(parse_response(&[0xBB, 0x01]), Err(LinkError::Comms { .. })));
        assert!(matches!(parse_response(&[0xCC]), Err(LinkError::Comms { .. })));
        assert!(matches!(parse_response(&[0x42, 0x42]), Err(LinkError::Comms { .. })));
        assert!(matches!(parse_response(b"OK"), Err(LinkError::Comms { .. })));
    }

    #[test]
    fn test_parse_packet_response() {
        let reply = packet_reply(130, 9, &[0xa7, 0x20, 0x88, 0x50]);
        let record = parse_response(&reply[..reply.len() - 1]).unwrap();
        assert_eq!(record.rssi, -136);
        assert_eq!(record.sequence, 9);
        assert_eq!(record.payload, vec![0xa7, 0x20, 0x88, 0x50]);
    }

    #[test]
    fn test_rssi_byte_matching_error_code_is_not_an_error() {
        let reply = packet_reply(RFSPY_ERROR_TIMEOUT, 1, &[0xa7, 0x01]);
        let record = parse_response(&reply[..reply.len() - 1]).unwrap();
        assert_eq!(record.rssi, -116);
    }

    #[test]
    fn test_get_packet_timeout_encoding() {
        let mock = MockTransport::new();
        mock.push_reply(packet_reply(50, 1, &[0x01, 0x02]));
        let mut radio = RadioConfig::default();
        radio.rx_channel = 2;
        let mut link = BridgeChannel::new(mock.clone(), radio, fast_config());
        link.timeout_width = TimeoutWidth::U16;

        let record = link.get_packet(Duration::from_millis(1000)).unwrap();
        assert_eq!(record.rssi, -48);
        assert_eq!(record.payload, vec![0x01, 0x02]);
        assert_eq!(mock.written()[0], vec![4, CMD_GET_PACKET, 2, 0x03, 0xE8]);

        link.timeout_width = TimeoutWidth::U32;
        mock.push_reply(raw_reply(&[RFSPY_ERROR_TIMEOUT]));
        let err = link.get_packet(Duration::from_millis(80)).unwrap_err();
        assert!(matches!(err, LinkError::Timeout { .. }));
        assert_eq!(mock.written()[1], vec![6, CMD_GET_PACKET, 2, 0, 0, 0, 80]);
    }

    #[test]
    fn test_write_batches_repetitions() {
        let mock = MockTransport::new();
        let mut link = BridgeChannel::new(mock.clone(), RadioConfig::default(), fast_config());

        link.write(&[0xa7, 0x01], 600, 0, None).unwrap();
        let sends = mock.written_with_opcode(CMD_SEND_PACKET);
        let counts: Vec<u8> = sends.iter().map(|f| f[3]).collect();
        assert_eq!(counts, vec![249, 249, 99]);
        assert_eq!(&sends[0][5..], line_code::encode(&[0xa7, 0x01]).as_slice());
    }

    #[test]
    fn test_minimum_write_timeout() {
        assert_eq!(minimum_write_timeout(1, 0), Duration::from_millis(1050));
        assert_eq!(minimum_write_timeout(200, 10), Duration::from_millis(13_000));
    }

    #[test]
    fn test_send_and_listen_layout() {
        let mock = MockTransport::new();
        mock.push_reply(packet_reply(60, 3, &[0x07]));
        let mut link = BridgeChannel::new(mock.clone(), RadioConfig::default(), fast_config());

        let record = link.send_and_listen(&[0xa7], 1, 0, Duration::from_millis(500)).unwrap();
        assert_eq!(record.payload, vec![0x07]);
        let frame = &mock.written()[0];
        assert_eq!(&frame[1..10], &[CMD_SEND_AND_LISTEN, 0, 0, 0, 0, 0, 0, 0x01, 0xF4]);
        assert_eq!(frame[10], 0);
    }

    #[test]
    fn test_update_register_requires_ack() {
        let mock = MockTransport::new();
        let mut link = BridgeChannel::new(mock.clone(), RadioConfig::default(), fast_config());

        mock.push_reply(raw_reply(&[1]));
        assert!(link.update_register("mdmcfg4", 0x99).is_ok());
        assert_eq!(mock.written()[0], vec![3, CMD_UPDATE_REGISTER, 0x0C, 0x99]);

        mock.push_reply(raw_reply(&[2]));
        assert!(matches!(link.update_register("mdmcfg4", 0x99), Err(LinkError::Comms { .. })));
        assert!(matches!(link.update_register("pktlen", 1), Err(LinkError::UnknownRegister(_))));
    }

    #[test]
    fn test_apply_base_freq_writes_three_registers() {
        let mock = bridge_firmware("0.6");
        let mut link = BridgeChannel::new(mock.clone(), RadioConfig::default(), fast_config());

        link.apply_base_freq(916.630).unwrap();
        let writes: Vec<Vec<u8>> = mock.written_with_opcode(CMD_UPDATE_REGISTER);
        let pairs: Vec<(u8, u8)> = writes.iter().map(|f| (f[2], f[3])).collect();
        assert_eq!(pairs, vec![(0x0B, 0x63), (0x0A, 0x31), (0x09, 0x26)]);
        assert_eq!(link.radio().get("freq1").unwrap(), 0x31);
    }

    #[test]
    fn test_settle_delay_between_frequency_writes() {
        let mock = bridge_firmware("0.6");
        let delay = Duration::from_millis(25);
        let config = BridgeConfig {
            settle_delay: delay,
            ..BridgeConfig::default()
        };
        let mut link = BridgeChannel::new(mock.clone(), RadioConfig::default(), config);

        let start = Instant::now();
        link.apply_base_freq(916.630).unwrap();
        let elapsed = start.elapsed();

        assert_eq!(mock.written_with_opcode(CMD_UPDATE_REGISTER).len(), 3);
        assert!(elapsed >= delay * 2, "elapsed {:?}", elapsed);
        assert!(elapsed < delay * 3, "elapsed {:?}", elapsed);
    }
}
