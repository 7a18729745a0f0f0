//! Mock transport for testing and development
//!
//! Replies are queued chunks handed out one per `read`; an empty queue reads
//! as an elapsed window so tests never block. A responder closure can
//! inspect each written frame and queue replies, which lets tests play the
//! part of the bridge firmware.

use crate::core::constants::*;
use crate::hardware::{LinkError, LinkResult, Transport};
use crate::processing::{line_code, Packet};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send>;

/// Cloneable handle; clones share state so a test can keep one while the
/// link owns another
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    replies: VecDeque<Vec<u8>>,
    written: Vec<Vec<u8>>,
    responder: Option<Responder>,
    connected: bool,
    open: bool,
    reads: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                replies: VecDeque::new(),
                written: Vec::new(),
                responder: None,
                connected: true,
                open: false,
                reads: 0,
            })),
        }
    }

    /// Answer each written frame through `responder`
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static,
    {
        let mock = Self::new();
        mock.inner().responder = Some(Box::new(responder));
        mock
    }

    fn inner(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a chunk to be returned by a later read
    pub fn push_reply(&self, data: Vec<u8>) {
        self.inner().replies.push_back(data);
    }

    /// All frames written so far
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.inner().written.clone()
    }

    /// Written frames carrying `opcode` (byte after the length prefix)
    pub fn written_with_opcode(&self, opcode: u8) -> Vec<Vec<u8>> {
        self.inner()
            .written
            .iter()
            .filter(|frame| frame.get(1) == Some(&opcode))
            .cloned()
            .collect()
    }

    pub fn clear_written(&self) {
        self.inner().written.clear();
    }

    pub fn queued_reply_count(&self) -> usize {
        self.inner().replies.len()
    }

    pub fn read_count(&self) -> usize {
        self.inner().reads
    }

    /// Emulate bridge firmware `version` with a remote device behind it.
    ///
    /// `device` sees every packet the link transmits together with the
    /// carrier frequency (MHz) the radio registers are tuned to, and returns
    /// `(raw rssi, frame)` pairs that later get-packet commands hand back one
    /// at a time. An empty queue answers get-packet with the timeout code.
    pub fn simulated_bridge<F>(version: &str, mut device: F) -> Self
    where
        F: FnMut(&Packet, f64) -> Vec<(u8, Packet)> + Send + 'static,
    {
        let version = version.to_string();
        let mut registers: HashMap<u8, u8> = HashMap::from([(0x09, 0x26), (0x0A, 0x30), (0x0B, 0x70)]);
        let mut pending: VecDeque<Vec<u8>> = VecDeque::new();
        let mut sequence = 0u8;

        Self::with_responder(move |frame| {
            let (opcode, params) = match frame {
                [_, opcode, params @ ..] => (*opcode, params),
                _ => return Vec::new(),
            };

            match opcode {
                CMD_GET_STATE => vec![text_reply("OK")],
                CMD_GET_VERSION => vec![text_reply(&format!("subg_rfspy {}", version))],
                CMD_UPDATE_REGISTER => {
                    if let [address, value] = params {
                        registers.insert(*address, *value);
                    }
                    vec![raw_reply(&[1])]
                }
                CMD_SEND_PACKET => {
                    let word = (registers[&0x09] as u32) << 16
                        | (registers[&0x0A] as u32) << 8
                        | registers[&0x0B] as u32;
                    let freq_mhz = word as f64 * (FREQ_XTAL / 65536.0) / 1_000_000.0;

                    let packet = params
                        .get(3..)
                        .and_then(|encoded| line_code::decode(encoded).ok())
                        .and_then(|decoded| Packet::from_buffer(&decoded));
                    if let Some(packet) = packet {
                        for (rssi_raw, reply) in device(&packet, freq_mhz) {
                            sequence = sequence.wrapping_add(1);
                            pending.push_back(packet_reply(rssi_raw, sequence, &reply.assemble()));
                        }
                    }
                    vec![raw_reply(&[])]
                }
                CMD_GET_PACKET => {
                    vec![pending.pop_front().unwrap_or_else(|| raw_reply(&[RFSPY_ERROR_TIMEOUT]))]
                }
                _ => Vec::new(),
            }
        })
    }

    /// Simulate the dongle being unplugged
    pub fn disconnect(&self) {
        self.inner().connected = false;
    }

    pub fn reconnect(&self) {
        self.inner().connected = true;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> LinkResult<()> {
        let mut inner = self.inner();
        if !inner.connected {
            return Err(LinkError::Transport {
                port: "mock".to_string(),
                details: "device not present".to_string(),
            });
        }
        inner.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.inner().open = false;
    }

    fn is_open(&self) -> bool {
        self.inner().open
    }

    fn write(&mut self, data: &[u8]) -> LinkResult<()> {
        let mut guard = self.inner();
        let inner = &mut *guard;
        if !inner.connected {
            return Err(LinkError::Transport {
                port: "mock".to_string(),
                details: "disconnected".to_string(),
            });
        }

        inner.written.push(data.to_vec());
        if let Some(responder) = inner.responder.as_mut() {
            let replies = responder(data);
            inner.replies.extend(replies);
        }
        Ok(())
    }

    fn read(&mut self, _timeout: Duration) -> LinkResult<Vec<u8>> {
        let mut inner = self.inner();
        if !inner.connected {
            return Err(LinkError::Transport {
                port: "mock".to_string(),
                details: "disconnected".to_string(),
            });
        }
        inner.reads += 1;
        Ok(inner.replies.pop_front().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Terminated text reply, e.g. the "OK" state response
pub fn text_reply(text: &str) -> Vec<u8> {
    let mut reply = text.as_bytes().to_vec();
    reply.push(RESPONSE_TERMINATOR);
    reply
}

/// Terminated reply made of raw bytes
pub fn raw_reply(bytes: &[u8]) -> Vec<u8> {
    let mut reply = bytes.to_vec();
    reply.push(RESPONSE_TERMINATOR);
    reply
}

/// Terminated get-packet reply carrying a line-encoded radio frame
pub fn packet_reply(rssi_raw: u8, sequence: u8, radio_frame: &[u8]) -> Vec<u8> {
    let mut reply = vec![rssi_raw, sequence];
    reply.extend(line_code::encode(radio_frame));
    reply.push(RESPONSE_TERMINATOR);
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_creation() {
        let transport = MockTransport::new();
        assert!(!transport.is_open());
        assert_eq!(transport.queued_reply_count(), 0);
        assert_eq!(transport.name(), "mock");
    }

    #[test]
    fn test_reply_queue() {
        let mut transport = MockTransport::new();
        transport.push_reply(vec![1, 2, 3]);

        assert_eq!(transport.read(Duration::from_millis(10)).unwrap(), vec![1, 2, 3]);
        assert!(transport.read(Duration::from_millis(10)).unwrap().is_empty());
        assert_eq!(transport.read_count(), 2);
    }

    #[test]
    fn test_responder_and_shared_state() {
        let mut transport = MockTransport::with_responder(|frame| vec![frame.to_vec()]);
        let observer = transport.clone();

        transport.write(&[0x01, 0x02]).unwrap();
        assert_eq!(observer.written(), vec![vec![0x01, 0x02]]);
        assert_eq!(observer.written_with_opcode(0x02).len(), 1);
        assert_eq!(transport.read(Duration::from_millis(10)).unwrap(), vec![0x01, 0x02]);
    }

    #[test]
    fn test_connection_simulation() {
        let mut transport = MockTransport::new();
        transport.disconnect();

        assert!(matches!(transport.write(&[1]), Err(LinkError::Transport { .. })));
        assert!(matches!(transport.open(), Err(LinkError::Transport { .. })));

        transport.reconnect();
        assert!(transport.open().is_ok());
        assert!(transport.read(Duration::from_millis(10)).unwrap().is_empty());
    }

    #[test]
    fn test_simulated_bridge_answers_probe() {
        use crate::core::Serial;

        let serial = Serial([0x20, 0x88, 0x50]);
        let mut transport = MockTransport::simulated_bridge("0.6", move |packet, freq| {
            assert!((freq - 916.541).abs() < 0.01);
            vec![(100, Packet::new(packet.serial, packet.op, vec![0x03]))]
        });

        let probe = line_code::encode(&Packet::probe(serial).assemble());
        let mut frame = vec![(probe.len() + 4) as u8, CMD_SEND_PACKET, 0, 0, 0];
        frame.extend(probe);
        transport.write(&frame).unwrap();
        assert_eq!(transport.read(Duration::from_millis(10)).unwrap(), vec![0]);

        transport.write(&[4, CMD_GET_PACKET, 0, 0, 80]).unwrap();
        let reply = transport.read(Duration::from_millis(10)).unwrap();
        assert_eq!(reply[0], 100);

        transport.write(&[4, CMD_GET_PACKET, 0, 0, 80]).unwrap();
        assert_eq!(transport.read(Duration::from_millis(10)).unwrap(), vec![RFSPY_ERROR_TIMEOUT, 0]);
    }

    #[test]
    fn test_reply_builders() {
        assert_eq!(text_reply("OK"), vec![b'O', b'K', 0]);
        let reply = packet_reply(50, 7, &[0xa7]);
        assert_eq!(reply, vec![50, 7, 0xa9, 0x60, 0]);
    }
}
