//! GPIO controller seam and a driver that owns its controller and lines.
//!
//! A [`GpioChip`] hands out line handles implementing the `embedded-hal`
//! digital traits. Dropping a handle releases the line and dropping the chip
//! closes the controller, so teardown happens exactly once on every path,
//! including a partially failed [`Hx711Lines::initialize`].

use core::fmt;
use core::ops::{Deref, DerefMut};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};
use log::{debug, error};

use crate::config::Config;
use crate::error::Error;
use crate::hx711::HX711;

#[cfg(feature = "rppal")]
pub mod linux;

/// Consumer label attached to the data line where the controller supports it.
pub const DATA_CONSUMER: &str = "hx711_dout";
/// Consumer label attached to the clock line.
pub const CLOCK_CONSUMER: &str = "hx711_pd_sck";

/// Which of the two HX711 lines an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    /// DOUT, input.
    Data,
    /// PD_SCK, output.
    Clock,
}

impl fmt::Display for LineRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRole::Data => f.write_str("data"),
            LineRole::Clock => f.write_str("clock"),
        }
    }
}

/// A GPIO controller able to claim lines exclusively.
pub trait GpioChip {
    type Error: fmt::Debug;
    type Input: InputPin;
    type Output: OutputPin;

    /// Claim `pin` as an input.
    fn request_input(
        &mut self,
        pin: u32,
        consumer: &'static str,
    ) -> Result<Self::Input, Self::Error>;

    /// Claim `pin` as an output driven to `initial`.
    fn request_output(
        &mut self,
        pin: u32,
        consumer: &'static str,
        initial: PinState,
    ) -> Result<Self::Output, Self::Error>;
}

/// HX711 driver owning its GPIO controller and both lines.
///
/// Derefs to [`HX711`] for all protocol operations.
pub struct Hx711Lines<C: GpioChip, D> {
    // fields drop in declaration order: lines before the controller
    hx711: HX711<C::Output, C::Input, D>,
    chip: C,
    config: Config,
}

impl<C, D, E> Hx711Lines<C, D>
where
    C: GpioChip,
    C::Input: InputPin<Error = E>,
    C::Output: OutputPin<Error = E>,
    D: DelayNs,
{
    /// Open the controller with `open`, claim the data line as input and the
    /// clock line as output driven low, then apply `config`.
    pub fn initialize<F>(open: F, config: &Config, delay: D) -> Result<Self, Error<E>>
    where
        F: FnOnce() -> Result<C, C::Error>,
    {
        if config.data_pin == config.clock_pin {
            error!(
                "hx711 data and clock share line {}, refusing to claim",
                config.clock_pin
            );
            return Err(Error::LineUnavailable {
                role: LineRole::Clock,
                pin: config.clock_pin,
            });
        }

        let mut chip = open().map_err(|err| {
            error!("failed to open GPIO controller: {:?}", err);
            Error::HardwareUnavailable
        })?;
        let dt_pin = chip
            .request_input(config.data_pin, DATA_CONSUMER)
            .map_err(|err| line_unavailable(LineRole::Data, config.data_pin, err))?;
        let sck_pin = chip
            .request_output(config.clock_pin, CLOCK_CONSUMER, PinState::Low)
            .map_err(|err| line_unavailable(LineRole::Clock, config.clock_pin, err))?;
        debug!(
            "hx711 claimed data line {} and clock line {}",
            config.data_pin, config.clock_pin
        );

        let mut hx711 = HX711::new(sck_pin, dt_pin, delay)?;
        hx711.configure(config);
        Ok(Self {
            hx711,
            chip,
            config: *config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_pin(&self) -> u32 {
        self.config.data_pin
    }

    pub fn clock_pin(&self) -> u32 {
        self.config.clock_pin
    }

    /// Release both lines, then the controller.
    pub fn close(self) {
        let Self {
            hx711,
            chip,
            config,
        } = self;
        drop(hx711);
        debug!(
            "hx711 released data line {} and clock line {}",
            config.data_pin, config.clock_pin
        );
        drop(chip);
    }
}

impl<C: GpioChip, D> Deref for Hx711Lines<C, D> {
    type Target = HX711<C::Output, C::Input, D>;

    fn deref(&self) -> &Self::Target {
        &self.hx711
    }
}

impl<C: GpioChip, D> DerefMut for Hx711Lines<C, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.hx711
    }
}

fn line_unavailable<E>(role: LineRole, pin: u32, err: impl fmt::Debug) -> Error<E> {
    error!("failed to claim hx711 {} line {}: {:?}", role, pin, err);
    Error::LineUnavailable { role, pin }
}
