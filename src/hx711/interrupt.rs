//! Interrupt driven ready wait.
//!
//! Instead of polling the data line, await its falling edge through
//! `embedded-hal-async`. HALs back `Wait` with a pin change interrupt, so the
//! task sleeps until the chip finishes a conversion.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::digital::Wait;

use crate::error::Error;
use crate::hx711::HX711;

impl<SckPin, DTPin, Delay, E> HX711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin<Error = E>,
    DTPin: InputPin<Error = E> + Wait,
    Delay: DelayNs,
{
    /// Wait for the data line to go low without polling.
    pub async fn wait_ready_async(&mut self) -> Result<(), Error<E>> {
        self.ensure_active()?;
        self.dt_pin.wait_for_low().await.map_err(Error::Gpio)
    }

    /// Await readiness, then shift in the sample like [`HX711::read`].
    /// The bit loop itself stays blocking.
    pub async fn read_async(&mut self) -> Result<i32, Error<E>> {
        self.wait_ready_async().await?;
        self.shift_sample()
    }
}
