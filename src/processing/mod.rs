//! Radio payload processing: line code, checksum and packet framing

pub mod line_code;
pub mod checksum;
pub mod packet;

pub use packet::Packet;
