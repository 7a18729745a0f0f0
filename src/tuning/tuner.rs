//! Frequency acquisition for a remote device whose carrier has drifted
//!
//! The tuner wakes the device, steps the radio across the locale's band,
//! probes the device at every step and settles on the frequency with the
//! most replies (ties go to the stronger signal).

use crate::core::constants::FAILED_SAMPLE_RSSI;
use crate::core::Serial;
use crate::hardware::{BridgeChannel, LinkError, LinkResult, Transport};
use crate::processing::Packet;
use crate::tuning::report::{TuningReport, TuningTrial};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Probes sent per frequency
    pub sample_size: u32,
    pub probe_timeout_ms: u64,
    /// Short probes tried before falling back to the wake burst
    pub wake_probes: u32,
    pub wake_repetitions: usize,
    pub wake_ack_timeout_ms: u64,
    pub scan_steps: u32,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            sample_size: 5,
            probe_timeout_ms: 80,
            wake_probes: 3,
            wake_repetitions: 200,
            wake_ack_timeout_ms: 9_000,
            scan_steps: 20,
        }
    }
}

impl TunerConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn wake_ack_timeout(&self) -> Duration {
        Duration::from_millis(self.wake_ack_timeout_ms)
    }

    pub fn validate(&self) -> LinkResult<()> {
        if self.sample_size == 0 {
            return Err(LinkError::invalid_configuration("tuner.sample_size", 0));
        }
        if self.scan_steps == 0 {
            return Err(LinkError::invalid_configuration("tuner.scan_steps", 0));
        }
        if self.probe_timeout_ms == 0 {
            return Err(LinkError::invalid_configuration("tuner.probe_timeout_ms", 0));
        }
        if self.wake_ack_timeout_ms == 0 {
            return Err(LinkError::invalid_configuration("tuner.wake_ack_timeout_ms", 0));
        }
        Ok(())
    }
}

pub struct FrequencyTuner<'a, T: Transport> {
    link: &'a mut BridgeChannel<T>,
    serial: Serial,
    config: TunerConfig,
}

impl<'a, T: Transport> FrequencyTuner<'a, T> {
    pub fn new(link: &'a mut BridgeChannel<T>, serial: Serial, config: TunerConfig) -> Self {
        Self { link, serial, config }
    }

    /// Wake the device, scan the locale's band and apply the best frequency
    pub fn run(&mut self) -> LinkResult<TuningReport> {
        self.wakeup();

        let range = self.link.radio().scan_range();
        let trials = self.scan_over_freq(range.start_mhz, range.end_mhz, self.config.scan_steps)?;

        let (set_freq, used_default) = select_best(&trials, range.default_mhz);
        if used_default {
            log::warn!(
                "No response from {} on any frequency, using default {:.3} MHz",
                self.serial,
                set_freq
            );
        } else {
            log::info!("Best frequency for {}: {:.3} MHz", self.serial, set_freq);
        }
        self.link.apply_base_freq(set_freq)?;

        Ok(TuningReport {
            scan_details: trials,
            set_freq,
            used_default,
        })
    }

    /// Try a few quick probes; if the device stays quiet, retune to the
    /// default frequency and send a long wake burst. Never fails.
    pub fn wakeup(&mut self) -> bool {
        for attempt in 1..=self.config.wake_probes {
            match self.probe() {
                Ok(_) => {
                    log::debug!("{} answered probe {}", self.serial, attempt);
                    return true;
                }
                Err(e) => log::debug!("probe {} unanswered: {}", attempt, e),
            }
        }

        match self.wake_burst() {
            Ok(()) => {
                log::info!("{} acknowledged wake-up", self.serial);
                true
            }
            Err(e) => {
                log::warn!("Wake-up of {} failed: {}", self.serial, e);
                false
            }
        }
    }

    fn wake_burst(&mut self) -> LinkResult<()> {
        let default_mhz = self.link.radio().scan_range().default_mhz;
        self.link.apply_base_freq(default_mhz)?;

        let wake = Packet::wake(self.serial).assemble();
        self.link.write(&wake, self.config.wake_repetitions, 0, None)?;
        self.link.get_packet(self.config.wake_ack_timeout())?;
        Ok(())
    }

    /// Send one identify probe and listen briefly for any reply
    fn probe(&mut self) -> LinkResult<i16> {
        let probe = Packet::probe(self.serial).assemble();
        self.link.write(&probe, 1, 0, None)?;
        Ok(self.link.get_packet(self.config.probe_timeout())?.rssi)
    }

    /// One trial per step over `[start, end)`; the end is never sampled
    pub fn scan_over_freq(&mut self, start_mhz: f64, end_mhz: f64, steps: u32) -> LinkResult<Vec<TuningTrial>> {
        let step = (end_mhz - start_mhz) / steps as f64;
        let mut trials = Vec::with_capacity(steps as usize);

        for i in 0..steps {
            let freq = start_mhz + i as f64 * step;
            if freq >= end_mhz {
                break;
            }
            self.link.apply_base_freq(freq)?;
            trials.push(self.run_trial(freq)?);
        }
        Ok(trials)
    }

    /// Probe the device `sample_size` times at the current frequency.
    /// Unanswered probes count as -99 dBm in the average.
    pub fn run_trial(&mut self, freq_mhz: f64) -> LinkResult<TuningTrial> {
        let mut success_count = 0;
        let mut readings = Vec::with_capacity(self.config.sample_size as usize);

        for _ in 0..self.config.sample_size {
            match self.probe() {
                Ok(rssi) => {
                    success_count += 1;
                    readings.push(rssi as f64);
                }
                Err(e @ (LinkError::Comms { .. } | LinkError::Timeout { .. } | LinkError::InvalidPacket { .. })) => {
                    log::debug!("no reply at {:.3} MHz: {}", freq_mhz, e);
                    readings.push(FAILED_SAMPLE_RSSI);
                }
                Err(e) => return Err(e),
            }
        }

        let average_rssi = readings.iter().sum::<f64>() / readings.len().max(1) as f64;
        let trial = TuningTrial::new(freq_mhz, success_count, average_rssi);
        log::info!("{}, {}, rssi:{:.1}", trial.label(), success_count, average_rssi);
        Ok(trial)
    }
}

/// Pick the trial with the most successes, then the highest average rssi.
/// Returns `(frequency, used_default)`; with no successes anywhere the
/// default frequency is used.
pub fn select_best(trials: &[TuningTrial], default_mhz: f64) -> (f64, bool) {
    let best = trials.iter().max_by(|a, b| {
        a.success_count()
            .cmp(&b.success_count())
            .then(a.average_rssi().partial_cmp(&b.average_rssi()).unwrap_or(Ordering::Equal))
    });

    match best {
        Some(trial) if trial.success_count() > 0 => match trial.frequency() {
            Some(freq) => (freq, false),
            None => (default_mhz, true),
        },
        _ => (default_mhz, true),
    }
}
