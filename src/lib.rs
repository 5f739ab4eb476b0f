#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod config;
pub mod error;
pub mod gpio;
pub mod hx711;
pub mod scale;
pub mod shared;
pub mod wait;

pub use config::Config;
pub use error::Error;
pub use hx711::{GainMode, PowerState, Timing, HX711};

pub trait LoadCell {
    type Offset;
    type Scale;
    type Error;

    /// Read the raw value from the load cell
    fn read(&mut self) -> Result<i32, Self::Error>;

    /// Read the value after removing the offset and applying scaling.
    fn read_scaled(&mut self) -> Result<Self::Scale, Self::Error>;

    /// Zero the load cell offset by averaging `num_samples` readings.
    /// Returns the new offset.
    fn tare(&mut self, num_samples: usize) -> Result<Self::Offset, Self::Error>;

    /// Get the load cell offset.
    fn get_offset(&self) -> Self::Offset;

    /// Set the scale (AKA calibrate the scale).
    /// Use this to ensure that 1kg ~ 1kg
    fn set_scale(&mut self, scale: Self::Scale);

    /// Get the scale.
    fn get_scale(&self) -> Self::Scale;
}
