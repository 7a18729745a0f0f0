//! Core types and constants for the radio link

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
