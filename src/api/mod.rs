//! Remote device command API
//!
//! Blocking, single-owner interface: every call runs to completion on the
//! caller's thread and talks to the bridge strictly request-then-response.

pub mod command;
pub mod executor;
pub mod device;

pub use command::{Command, GenericCommand};
pub use executor::{ExecutorConfig, ExecutorState, Repeater, Sender, RETRY_BACKOFF, STANDARD_RETRY_COUNT};
pub use device::RemoteDevice;
