//! Hardware layer: transports and the bridge firmware protocol
//!
//! `Transport` moves bytes; `BridgeChannel` speaks the subg_rfspy command
//! set on top of it and owns the session's `RadioConfig`.

pub mod transport;
pub mod serial;
pub mod mock;
pub mod error;
pub mod bridge;

pub use transport::{InterfaceType, Transport, TransportConfig};
pub use serial::SerialTransport;
pub use mock::MockTransport;
pub use error::{LinkError, LinkResult, RecoveryStrategy};
pub use bridge::{BridgeChannel, BridgeConfig, TimeoutWidth};

/// Build (but do not open) the transport described by `config`
pub fn create_transport(config: &TransportConfig) -> LinkResult<Box<dyn Transport>> {
    match config.interface {
        InterfaceType::Serial => Ok(Box::new(SerialTransport::new(config)?)),
        InterfaceType::Mock => Ok(Box::new(MockTransport::new())),
    }
}
