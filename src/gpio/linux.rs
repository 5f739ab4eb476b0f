//! Raspberry Pi GPIO controller backed by `rppal`.
//!
//! ```no_run
//! use hx711_gpio::gpio::linux::RppalChip;
//! use hx711_gpio::gpio::Hx711Lines;
//! use hx711_gpio::Config;
//!
//! let delay = rppal::hal::Delay::new();
//! let mut scale = Hx711Lines::initialize(RppalChip::open, &Config::new(5, 6), delay)?;
//! let raw = scale.read()?;
//! # Ok::<(), hx711_gpio::Error<core::convert::Infallible>>(())
//! ```

use embedded_hal::digital::PinState;
use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::gpio::GpioChip;

#[derive(Debug, thiserror::Error)]
pub enum RppalError {
    #[error(transparent)]
    Gpio(#[from] rppal::gpio::Error),

    #[error("pin {0} is out of range")]
    PinOutOfRange(u32),
}

/// The BCM GPIO controller. Lines stay claimed until their handle drops.
pub struct RppalChip {
    gpio: Gpio,
}

impl RppalChip {
    pub fn open() -> Result<Self, RppalError> {
        Ok(Self { gpio: Gpio::new()? })
    }

    fn pin(&self, pin: u32) -> Result<rppal::gpio::Pin, RppalError> {
        let bcm = u8::try_from(pin).map_err(|_| RppalError::PinOutOfRange(pin))?;
        Ok(self.gpio.get(bcm)?)
    }
}

impl GpioChip for RppalChip {
    type Error = RppalError;
    type Input = InputPin;
    type Output = OutputPin;

    fn request_input(
        &mut self,
        pin: u32,
        _consumer: &'static str,
    ) -> Result<Self::Input, Self::Error> {
        Ok(self.pin(pin)?.into_input())
    }

    fn request_output(
        &mut self,
        pin: u32,
        _consumer: &'static str,
        initial: PinState,
    ) -> Result<Self::Output, Self::Error> {
        let pin = self.pin(pin)?;
        Ok(match initial {
            PinState::Low => pin.into_output_low(),
            PinState::High => pin.into_output_high(),
        })
    }
}
