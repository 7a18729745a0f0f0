//! Frequency tuning

pub mod report;
pub mod tuner;

pub use report::{TuningReport, TuningTrial};
pub use tuner::{select_best, FrequencyTuner, TunerConfig};
