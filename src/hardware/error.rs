//! Link error types and recovery handling

use thiserror::Error;

/// Errors raised while talking to the bridge firmware or the remote device
#[derive(Debug, Error)]
pub enum LinkError {
    /// Link disconnected or the underlying I/O failed
    #[error("Transport error on {port}: {details}")]
    Transport { port: String, details: String },

    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// No response heard within the listen window
    #[error("Timed out: {details}")]
    Timeout { details: String },

    /// Empty, short or error-coded response from the bridge
    #[error("Comms error: {details}")]
    Comms { details: String },

    /// Radio packet failed line decoding or checksum validation
    #[error("Invalid packet: {details}")]
    InvalidPacket { details: String },

    /// Bridge reported a firmware version we cannot drive
    #[error("unsupported firmware version {version} (supported: {supported})")]
    UnsupportedFirmware { version: String, supported: String },

    /// Register name not present in the register map
    #[error("Unknown radio register: {0}")]
    UnknownRegister(String),

    /// Caller or configuration supplied an unusable value
    #[error("Configuration error: invalid {parameter} = {value}")]
    InvalidConfiguration { parameter: String, value: String },

    /// Configuration file could not be read or parsed
    #[error("Config file error: {0}")]
    Config(String),
}

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Recovery strategy for link failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Retry the operation immediately
    Retry,
    /// Wait and then retry
    RetryWithDelay { delay_ms: u32 },
    /// Skip this sample and continue
    Skip,
    /// Fail permanently
    Fail,
}

impl LinkError {
    pub fn comms(details: impl Into<String>) -> Self {
        LinkError::Comms { details: details.into() }
    }

    pub fn timeout(details: impl Into<String>) -> Self {
        LinkError::Timeout { details: details.into() }
    }

    pub fn invalid_packet(details: impl Into<String>) -> Self {
        LinkError::InvalidPacket { details: details.into() }
    }

    pub fn invalid_configuration(parameter: impl Into<String>, value: impl ToString) -> Self {
        LinkError::InvalidConfiguration {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Get the recommended recovery strategy for this error
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            LinkError::Timeout { .. } => RecoveryStrategy::RetryWithDelay { delay_ms: 100 },
            LinkError::Comms { .. } => RecoveryStrategy::Retry,
            LinkError::InvalidPacket { .. } => RecoveryStrategy::Skip,
            LinkError::Transport { .. }
            | LinkError::Serial(_)
            | LinkError::UnsupportedFirmware { .. }
            | LinkError::UnknownRegister(_)
            | LinkError::InvalidConfiguration { .. }
            | LinkError::Config(_) => RecoveryStrategy::Fail,
        }
    }

    /// Check whether a caller may re-run the failed exchange
    pub fn is_retryable(&self) -> bool {
        !matches!(self.recovery_strategy(), RecoveryStrategy::Fail)
    }
}

impl From<serde_json::Error> for LinkError {
    fn from(err: serde_json::Error) -> Self {
        LinkError::Config(err.to_string())
    }
}
