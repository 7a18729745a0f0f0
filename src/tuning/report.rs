//! Tuning results as handed to callers and printed by the CLI

use serde::{Deserialize, Serialize};

/// Outcome of probing one frequency.
///
/// Serializes as `[label, success_count, average_rssi]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningTrial(pub String, pub u32, pub f64);

impl TuningTrial {
    pub fn new(freq_mhz: f64, success_count: u32, average_rssi: f64) -> Self {
        TuningTrial(format!("{:.3}", freq_mhz), success_count, average_rssi)
    }

    /// Frequency formatted to three decimals
    pub fn label(&self) -> &str {
        &self.0
    }

    pub fn success_count(&self) -> u32 {
        self.1
    }

    pub fn average_rssi(&self) -> f64 {
        self.2
    }

    pub fn frequency(&self) -> Option<f64> {
        self.0.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningReport {
    /// Every trial in scan order
    pub scan_details: Vec<TuningTrial>,
    pub set_freq: f64,
    pub used_default: bool,
}

impl TuningReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
