//! Driver configuration.

use crate::hx711::{GainMode, Timing, DEFAULT_POLL_INTERVAL_US};

/// Pins and protocol settings for one HX711.
///
/// Pin numbers are line offsets on the GPIO controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// DOUT, read as input.
    pub data_pin: u32,
    /// PD_SCK, driven as output.
    pub clock_pin: u32,
    pub gain: GainMode,
    pub timing: Timing,
    /// Sleep between readiness polls in microseconds.
    pub poll_interval_us: u32,
}

impl Config {
    pub fn new(data_pin: u32, clock_pin: u32) -> Self {
        Self {
            data_pin,
            clock_pin,
            ..Self::default()
        }
    }

    pub fn with_gain(mut self, gain: GainMode) -> Self {
        self.gain = gain;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_pin: 5,
            clock_pin: 6,
            gain: GainMode::A128,
            timing: Timing::default(),
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
        }
    }
}
