//! JSON configuration for a link session

use crate::api::ExecutorConfig;
use crate::core::constants::{SUPPORTED_VERSIONS, UINT16_TIMEOUT_VERSIONS};
use crate::core::Serial;
use crate::hardware::{BridgeConfig, LinkError, LinkResult, TransportConfig};
use crate::radio::{registers, Locale, RadioConfig};
use crate::tuning::TunerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Everything needed to open a bridge and talk to one remote device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial device of the bridge
    pub port: String,
    pub baud_rate: u32,
    pub locale: Locale,
    /// Remote device serial; required by commands that address the device
    pub serial: Option<Serial>,
    pub tx_channel: u8,
    pub rx_channel: u8,
    pub default_timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub supported_versions: Vec<String>,
    pub uint16_timeout_versions: Vec<String>,
    /// Applied on top of the locale's register presets
    pub register_overrides: BTreeMap<String, u8>,
    pub tuner: TunerConfig,
    pub executor: ExecutorConfig,
    pub logging: LoggingConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 19200,
            locale: Locale::default(),
            serial: None,
            tx_channel: 0,
            rx_channel: 0,
            default_timeout_ms: 1000,
            settle_delay_ms: 1000,
            supported_versions: SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect(),
            uint16_timeout_versions: UINT16_TIMEOUT_VERSIONS.iter().map(|v| v.to_string()).collect(),
            register_overrides: BTreeMap::new(),
            tuner: TunerConfig::default(),
            executor: ExecutorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> LinkResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| LinkError::Config(format!("Failed to read config file '{}': {}", path.display(), e)))?;

        let config: LinkConfig = serde_json::from_str(&content)
            .map_err(|e| LinkError::Config(format!("Failed to parse config file '{}': {}", path.display(), e)))?;
        config.validate()?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> LinkResult<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|e| LinkError::Config(format!("Failed to write config file '{}': {}", path.display(), e)))
    }

    pub fn validate(&self) -> LinkResult<()> {
        if self.port.is_empty() {
            return Err(LinkError::invalid_configuration("port", "<empty>"));
        }
        if self.baud_rate == 0 {
            return Err(LinkError::invalid_configuration("baud_rate", 0));
        }
        if self.default_timeout_ms == 0 {
            return Err(LinkError::invalid_configuration("default_timeout_ms", 0));
        }
        if self.supported_versions.is_empty() {
            return Err(LinkError::invalid_configuration("supported_versions", "[]"));
        }
        for name in self.register_overrides.keys() {
            if registers::lookup(name).is_none() {
                return Err(LinkError::UnknownRegister(name.clone()));
            }
        }
        self.tuner.validate()?;
        self.executor.validate()
    }

    /// Serial of the remote device, failing when none is configured
    pub fn device_serial(&self) -> LinkResult<Serial> {
        self.serial
            .ok_or_else(|| LinkError::invalid_configuration("serial", "<missing>"))
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::serial(self.port.clone(), self.baud_rate)
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            default_timeout: Duration::from_millis(self.default_timeout_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            supported_versions: self.supported_versions.clone(),
            uint16_timeout_versions: self.uint16_timeout_versions.clone(),
        }
    }

    /// Locale presets, channels, then register overrides
    pub fn radio_config(&self) -> LinkResult<RadioConfig> {
        let mut radio = RadioConfig::new(self.locale);
        radio.tx_channel = self.tx_channel;
        radio.rx_channel = self.rx_channel;
        for (name, value) in &self.register_overrides {
            radio.set(name, *value)?;
        }
        Ok(radio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.tuner.scan_steps, 20);
        assert_eq!(config.executor.retry_count, 3);
        assert_eq!(config.bridge_config(), BridgeConfig::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "port": "/dev/ttyUSB1",
            "locale": "worldwide",
            "serial": "208850",
            "rx_channel": 2,
            "register_overrides": { "pa_table1": 192 },
            "tuner": { "scan_steps": 10 }
        }"#;
        let config: LinkConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.serial, Some(Serial([0x20, 0x88, 0x50])));
        assert_eq!(config.tuner.scan_steps, 10);
        assert_eq!(config.tuner.sample_size, 5);
        assert_eq!(config.executor.read_timeout_ms, 500);

        let radio = config.radio_config().unwrap();
        assert_eq!(radio.locale(), Locale::Worldwide);
        assert_eq!(radio.rx_channel, 2);
        assert_eq!(radio.get("pa_table1").unwrap(), 0xC0);
        assert_eq!(radio.get("freq2").unwrap(), 0x24);
    }

    #[test]
    fn test_malformed_serial_rejected() {
        let result: Result<LinkConfig, _> = serde_json::from_str(r#"{ "serial": "20885" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = LinkConfig::default();
        config.register_overrides.insert("sync1".to_string(), 0xFF);
        assert!(matches!(config.validate(), Err(LinkError::UnknownRegister(_))));

        let mut config = LinkConfig::default();
        config.tuner.scan_steps = 0;
        assert!(matches!(config.validate(), Err(LinkError::InvalidConfiguration { .. })));

        let mut config = LinkConfig::default();
        config.executor.response_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(LinkError::InvalidConfiguration { .. })));

        assert!(LinkConfig::default().device_serial().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("subg-link-config-{}.json", std::process::id()));
        let mut config = LinkConfig::default();
        config.serial = Some(Serial([0xAB, 0xCD, 0xEF]));
        config.logging.level = "debug".to_string();

        config.to_file(&path).unwrap();
        let loaded = LinkConfig::from_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let err = LinkConfig::from_file("/nonexistent/subg-link.json").unwrap_err();
        assert!(matches!(err, LinkError::Config(_)));
    }
}
