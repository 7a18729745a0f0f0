//! Remote device command contract

use crate::core::Serial;

/// A logical command the executor can deliver to the remote device.
///
/// The command catalog lives outside this crate; anything implementing this
/// trait can be executed. The executor takes the command by value, writes
/// the target serial into it and hands it back once complete.
pub trait Command {
    /// Operation code on the radio link
    fn code(&self) -> u8;

    fn serial(&self) -> Serial;

    fn set_serial(&mut self, serial: Serial);

    /// Parameter bytes uploaded after the device acknowledges the prelude
    fn params(&self) -> &[u8];

    fn bytes_per_record(&self) -> usize;

    fn max_records(&self) -> usize;

    /// Accumulate response data
    fn respond(&mut self, payload: &[u8]);

    /// Whether enough data has been accumulated
    fn done(&self) -> bool;

    fn description(&self) -> String {
        format!("command 0x{:02x}", self.code())
    }
}

/// Catalog-free command that collects raw response bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericCommand {
    pub code: u8,
    pub serial: Serial,
    pub params: Vec<u8>,
    pub bytes_per_record: usize,
    pub max_records: usize,
    pub data: Vec<u8>,
    pub responses: usize,
}

impl GenericCommand {
    pub fn new(code: u8) -> Self {
        Self {
            code,
            serial: Serial::default(),
            params: Vec::new(),
            bytes_per_record: 64,
            max_records: 1,
            data: Vec::new(),
            responses: 0,
        }
    }

    pub fn with_params(mut self, params: Vec<u8>) -> Self {
        self.params = params;
        self
    }

    pub fn with_records(mut self, bytes_per_record: usize, max_records: usize) -> Self {
        self.bytes_per_record = bytes_per_record;
        self.max_records = max_records;
        self
    }

    pub fn expected_len(&self) -> usize {
        self.bytes_per_record * self.max_records
    }
}

impl Command for GenericCommand {
    fn code(&self) -> u8 {
        self.code
    }

    fn serial(&self) -> Serial {
        self.serial
    }

    fn set_serial(&mut self, serial: Serial) {
        self.serial = serial;
    }

    fn params(&self) -> &[u8] {
        &self.params
    }

    fn bytes_per_record(&self) -> usize {
        self.bytes_per_record
    }

    fn max_records(&self) -> usize {
        self.max_records
    }

    fn respond(&mut self, payload: &[u8]) {
        self.responses += 1;
        self.data.extend_from_slice(payload);
    }

    fn done(&self) -> bool {
        self.responses > 0 && self.data.len() >= self.expected_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_command_completion() {
        let mut cmd = GenericCommand::new(0x8d).with_records(4, 2);
        assert_eq!(cmd.expected_len(), 8);
        assert!(!cmd.done());

        cmd.respond(&[1, 2, 3, 4]);
        assert!(!cmd.done());
        cmd.respond(&[5, 6, 7, 8]);
        assert!(cmd.done());
        assert_eq!(cmd.data.len(), 8);
    }

    #[test]
    fn test_zero_length_command_needs_one_response() {
        let mut cmd = GenericCommand::new(0x5d).with_records(0, 0);
        assert!(!cmd.done());
        cmd.respond(&[]);
        assert!(cmd.done());
    }

    #[test]
    fn test_description() {
        assert_eq!(GenericCommand::new(0x8d).description(), "command 0x8d");
    }
}
