//! In-memory model of the radio's register state
//!
//! Nothing here touches hardware. `BridgeChannel` pushes values to the
//! radio explicitly, so the software model only changes the chip when a
//! caller asks it to.

use crate::core::constants::FREQ_XTAL;
use crate::hardware::{LinkError, LinkResult};
use crate::radio::registers::{self, REGISTERS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Regulatory profile selecting the scan band and default frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Usa,
    Worldwide,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Usa, Locale::Worldwide];

    pub fn name(&self) -> &'static str {
        match self {
            Locale::Usa => "usa",
            Locale::Worldwide => "worldwide",
        }
    }

    /// Scan band for this locale
    pub fn scan_range(&self) -> FreqRange {
        match self {
            Locale::Usa => FreqRange {
                start_mhz: 916.5,
                end_mhz: 916.9,
                default_mhz: 916.630,
            },
            Locale::Worldwide => FreqRange {
                start_mhz: 867.5,
                end_mhz: 868.4,
                default_mhz: 868.328,
            },
        }
    }

    /// Register values that differ from the chip reset defaults
    fn register_presets(&self) -> [(&'static str, u8); 4] {
        match self {
            // 916.541MHz: midpoint between a device in free space and one worn on the body
            Locale::Usa => [
                ("freq2", 0x26),
                ("freq1", 0x30),
                ("freq0", 0x70),
                ("pa_table1", 0xC0),
            ],
            // 0xC2 is the highest usable PA setting at 868MHz
            Locale::Worldwide => [
                ("freq2", 0x24),
                ("freq1", 0x2E),
                ("freq0", 0x38),
                ("pa_table1", 0xC2),
            ],
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Locale {
    type Err = LinkError;

    fn from_str(s: &str) -> LinkResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "usa" | "us" => Ok(Locale::Usa),
            "worldwide" | "ww" => Ok(Locale::Worldwide),
            _ => Err(LinkError::invalid_configuration("locale", s)),
        }
    }
}

/// Frequency band in MHz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreqRange {
    pub start_mhz: f64,
    pub end_mhz: f64,
    pub default_mhz: f64,
}

/// Current register values plus channel selection for one link session
#[derive(Debug, Clone, PartialEq)]
pub struct RadioConfig {
    registers: BTreeMap<&'static str, u8>,
    locale: Locale,
    pub tx_channel: u8,
    pub rx_channel: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl RadioConfig {
    pub fn new(locale: Locale) -> Self {
        let registers = REGISTERS.iter().map(|r| (r.name, r.default)).collect();
        let mut config = Self {
            registers,
            locale,
            tx_channel: 0,
            rx_channel: 0,
        };
        config.set_locale(locale);
        config
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Switch locale and load its frequency and power presets
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
        for (name, value) in locale.register_presets() {
            self.registers.insert(name, value);
        }
    }

    pub fn get(&self, register: &str) -> LinkResult<u8> {
        self.registers
            .get(register)
            .copied()
            .ok_or_else(|| LinkError::UnknownRegister(register.to_string()))
    }

    pub fn set(&mut self, register: &str, value: u8) -> LinkResult<()> {
        let def = registers::lookup(register)
            .ok_or_else(|| LinkError::UnknownRegister(register.to_string()))?;
        log::debug!("Setting radio register: {}=0x{:02x}", def.name, value);
        self.registers.insert(def.name, value);
        Ok(())
    }

    /// Recompute freq2/freq1/freq0 from a carrier frequency in MHz
    pub fn set_base_freq(&mut self, freq_mhz: f64) {
        let word = frequency_word(freq_mhz);
        self.registers.insert("freq0", (word & 0xFF) as u8);
        self.registers.insert("freq1", ((word >> 8) & 0xFF) as u8);
        self.registers.insert("freq2", ((word >> 16) & 0xFF) as u8);
    }

    /// Carrier frequency currently described by the frequency registers
    pub fn base_freq(&self) -> f64 {
        let word = (self.registers["freq2"] as u32) << 16
            | (self.registers["freq1"] as u32) << 8
            | self.registers["freq0"] as u32;
        word as f64 * (FREQ_XTAL / 65536.0) / 1_000_000.0
    }

    pub fn scan_range(&self) -> FreqRange {
        self.locale.scan_range()
    }

    /// Register names in sorted order
    pub fn available_registers() -> Vec<&'static str> {
        registers::names().collect()
    }

    pub fn available_locales() -> Vec<&'static str> {
        let mut names: Vec<_> = Locale::ALL.iter().map(|l| l.name()).collect();
        names.sort_unstable();
        names
    }
}

/// 24-bit tuning word for the synthesizer
pub fn frequency_word(freq_mhz: f64) -> u32 {
    ((freq_mhz * 1_000_000.0) / (FREQ_XTAL / 65536.0)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_locale_presets() {
        let config = RadioConfig::new(Locale::Usa);
        assert_eq!(config.get("mdmcfg4").unwrap(), 0x99);
        assert_eq!(config.get("pa_table1").unwrap(), 0xC0);
        assert_eq!(config.get("freq1").unwrap(), 0x30);

        let config = RadioConfig::new(Locale::Worldwide);
        assert_eq!(config.get("freq2").unwrap(), 0x24);
        assert_eq!(config.get("pa_table1").unwrap(), 0xC2);
    }

    #[test]
    fn test_unknown_register() {
        let mut config = RadioConfig::default();
        assert!(matches!(config.get("channr"), Err(LinkError::UnknownRegister(_))));
        assert!(matches!(config.set("pktlen", 1), Err(LinkError::UnknownRegister(_))));
    }

    #[test]
    fn test_set_register() {
        let mut config = RadioConfig::default();
        config.set("deviatn", 0x25).unwrap();
        assert_eq!(config.get("deviatn").unwrap(), 0x25);
    }

    #[test]
    fn test_set_base_freq_registers() {
        let mut config = RadioConfig::default();
        config.set_base_freq(916.630);
        // round(916.63e6 / 366.2109375) = 2503011 = 0x263163
        assert_eq!(config.get("freq2").unwrap(), 0x26);
        assert_eq!(config.get("freq1").unwrap(), 0x31);
        assert_eq!(config.get("freq0").unwrap(), 0x63);
        assert!((config.base_freq() - 916.630).abs() < 0.001);
    }

    #[test]
    fn test_scan_range_by_locale() {
        let mut config = RadioConfig::default();
        assert_eq!(config.scan_range().default_mhz, 916.630);
        config.set_locale(Locale::Worldwide);
        let range = config.scan_range();
        assert_eq!((range.start_mhz, range.end_mhz), (867.5, 868.4));
    }

    #[test]
    fn test_available_lists_sorted() {
        let names = RadioConfig::available_registers();
        assert_eq!(names.len(), 29);
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(RadioConfig::available_locales(), vec!["usa", "worldwide"]);
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!("USA".parse::<Locale>().unwrap(), Locale::Usa);
        assert!("mars".parse::<Locale>().is_err());
    }
}
