//! Radio register model and locale frequency bands

pub mod registers;
pub mod config;

pub use config::{frequency_word, FreqRange, Locale, RadioConfig};
pub use registers::RegisterDef;
