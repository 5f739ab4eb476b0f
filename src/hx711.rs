use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, trace};

use crate::config::Config;
use crate::error::Error;
use crate::wait::{Deadline, Unbounded};

#[cfg(feature = "async")]
pub mod interrupt;

pub const HX711_MINIMUM: i32 = -(1 << (DATA_BITS - 1));
pub const HX711_MAXIMUM: i32 = (1 << (DATA_BITS - 1)) - 1;

/// Bits shifted out per conversion.
pub const DATA_BITS: u32 = 24;
/// Clock high hold that latches power down (the chip needs more than 60us).
pub const POWER_DOWN_HOLD_US: u32 = 70;
/// Settling time after `power_up` at 10 SPS. Not enforced by the driver.
pub const POWER_UP_SETTLING_MS: u32 = 400;
pub const DEFAULT_POLL_INTERVAL_US: u32 = 1_000;

const SIGN_BIT: u32 = 1 << (DATA_BITS - 1);
const SIGN_SPAN: i32 = 1 << DATA_BITS;
const DATA_MASK: u32 = (1 << DATA_BITS) - 1;

/// Gain and channel for the next conversion. The discriminant is the number
/// of extra clock pulses sent after the 24 data bits.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GainMode {
    #[default]
    A128 = 1, // extra pulses
    B32 = 2,
    A64 = 3,
}

impl GainMode {
    /// Extra clock pulses that select this mode.
    pub const fn pulses(self) -> u8 {
        self as u8
    }

    /// Amplifier gain of this mode.
    pub const fn gain(self) -> u8 {
        match self {
            GainMode::A128 => 128,
            GainMode::A64 => 64,
            GainMode::B32 => 32,
        }
    }
}

impl TryFrom<u8> for GainMode {
    /// The rejected gain.
    type Error = u8;

    fn try_from(gain: u8) -> Result<Self, Self::Error> {
        match gain {
            128 => Ok(GainMode::A128),
            64 => Ok(GainMode::A64),
            32 => Ok(GainMode::B32),
            other => Err(other),
        }
    }
}

/// Minimum clock high and low durations of every pulse.
///
/// These are floors: a slow host may stretch them, which the chip tolerates
/// up to the power down threshold on the high phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timing {
    pub high_ns: u32,
    pub low_ns: u32,
}

impl Timing {
    /// Datasheet minimum for both phases.
    pub const MIN_PULSE_NS: u32 = 200;
    /// Datasheet maximum for the high phase, below the power down latch.
    pub const MAX_HIGH_NS: u32 = 50_000;

    pub const fn new(high_ns: u32, low_ns: u32) -> Self {
        let high_ns = if high_ns < Self::MIN_PULSE_NS {
            Self::MIN_PULSE_NS
        } else if high_ns > Self::MAX_HIGH_NS {
            Self::MAX_HIGH_NS
        } else {
            high_ns
        };
        let low_ns = if low_ns < Self::MIN_PULSE_NS {
            Self::MIN_PULSE_NS
        } else {
            low_ns
        };
        Self { high_ns, low_ns }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(1_000, 1_000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Active,
    PoweredDown,
}

/// Sign extend a 24 bit two's complement value.
///
/// Bits above bit 23 of `raw` are ignored.
pub const fn sign_extend_24(raw: u32) -> i32 {
    let raw = raw & DATA_MASK;
    if raw >= SIGN_BIT {
        raw as i32 - SIGN_SPAN
    } else {
        raw as i32
    }
}

/// Assemble the three bytes of a conversion, most significant byte first.
pub const fn raw_to_i32(bytes: [u8; 3]) -> i32 {
    sign_extend_24(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
}

pub struct HX711<SckPin, DTPin, Delay> {
    sck_pin: SckPin,
    dt_pin: DTPin,
    delay: Delay,
    last_reading: i32,
    gain_mode: GainMode,
    // what the chip latched for the conversion the next read returns
    sample_gain: GainMode,
    power_state: PowerState,
    timing: Timing,
    poll_interval_us: u32,
}

impl<SckPin, DTPin, Delay, E> HX711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin<Error = E>,
    DTPin: InputPin<Error = E>,
    Delay: DelayNs,
{
    /// Take ownership of the pins and drive the clock low, which keeps the
    /// chip powered up.
    pub fn new(mut sck_pin: SckPin, dt_pin: DTPin, delay: Delay) -> Result<Self, Error<E>> {
        sck_pin.set_low().map_err(Error::Gpio)?;
        Ok(Self {
            sck_pin,
            dt_pin,
            delay,
            last_reading: 0,
            gain_mode: GainMode::A128,
            sample_gain: GainMode::A128,
            power_state: PowerState::Active,
            timing: Timing::default(),
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
        })
    }

    /// Apply gain, timing and poll interval from `config`. Pins are ignored.
    pub fn configure(&mut self, config: &Config) {
        self.set_gain_mode(config.gain);
        self.set_timing(config.timing);
        self.poll_interval_us = config.poll_interval_us;
    }

    /// The data line is low when a conversion is available.
    pub fn is_ready(&mut self) -> Result<bool, Error<E>> {
        self.dt_pin.is_low().map_err(Error::Gpio)
    }

    /// Poll until ready, sleeping `poll_interval_us` between polls. Blocks
    /// forever if the chip never becomes ready.
    pub fn wait_ready(&mut self, poll_interval_us: u32) -> Result<(), Error<E>> {
        self.wait_ready_until(poll_interval_us, Unbounded)
    }

    /// Poll until ready or until `deadline` expires. Fails with
    /// [`Error::PoweredDown`] without touching the data line when the chip
    /// is powered down, since it would never become ready.
    pub fn wait_ready_until<D: Deadline>(
        &mut self,
        poll_interval_us: u32,
        mut deadline: D,
    ) -> Result<(), Error<E>> {
        self.ensure_active()?;
        loop {
            if self.is_ready()? {
                return Ok(());
            }
            if deadline.expired() {
                log::warn!("hx711 not ready before deadline");
                return Err(Error::Timeout);
            }
            self.delay.delay_us(poll_interval_us);
        }
    }

    /// Block until a conversion is ready and read it.
    pub fn read(&mut self) -> Result<i32, Error<E>> {
        self.read_until(Unbounded)
    }

    /// Like [`read`](Self::read) but gives up with [`Error::Timeout`] once
    /// `deadline` expires. No clock pulses are sent in that case.
    pub fn read_until<D: Deadline>(&mut self, deadline: D) -> Result<i32, Error<E>> {
        self.wait_ready_until(self.poll_interval_us, deadline)?;
        self.shift_sample()
    }

    /// Read only if a conversion is available right now.
    pub fn try_read(&mut self) -> Result<i32, Error<E>> {
        self.ensure_active()?;
        if !self.is_ready()? {
            return Err(Error::NotReady);
        }
        self.shift_sample()
    }

    pub fn get_last_raw(&self) -> i32 {
        self.last_reading
    }

    pub fn get_gain_mode(&self) -> GainMode {
        self.gain_mode
    }

    /// Gain the chip applied to the conversion the next read returns.
    ///
    /// Gain pulses are sent after each sample, so a new gain shows up in the
    /// data one read after it was set.
    pub fn sample_gain(&self) -> GainMode {
        self.sample_gain
    }

    pub fn set_gain_mode(&mut self, new_mode: GainMode) {
        if new_mode != self.gain_mode {
            debug!(
                "hx711 gain {} -> {}",
                self.gain_mode.gain(),
                new_mode.gain()
            );
        }
        self.gain_mode = new_mode;
    }

    /// Set the gain from its numeric value (128, 64 or 32).
    pub fn set_gain(&mut self, gain: u8) -> Result<(), Error<E>> {
        let mode = GainMode::try_from(gain).map_err(Error::InvalidGain)?;
        self.set_gain_mode(mode);
        Ok(())
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = Timing::new(timing.high_ns, timing.low_ns);
    }

    pub fn poll_interval_us(&self) -> u32 {
        self.poll_interval_us
    }

    pub fn set_poll_interval_us(&mut self, poll_interval_us: u32) {
        self.poll_interval_us = poll_interval_us;
    }

    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    /// Hold the clock high long enough for the chip to enter power down.
    pub fn power_down(&mut self) -> Result<(), Error<E>> {
        self.sck_pin.set_low().map_err(Error::Gpio)?;
        self.sck_pin.set_high().map_err(Error::Gpio)?;
        self.delay.delay_us(POWER_DOWN_HOLD_US);
        self.power_state = PowerState::PoweredDown;
        debug!("hx711 powered down");
        Ok(())
    }

    /// Release the clock. The chip resets to channel A, gain 128 and needs
    /// [`POWER_UP_SETTLING_MS`] before its data is valid.
    pub fn power_up(&mut self) -> Result<(), Error<E>> {
        self.sck_pin.set_low().map_err(Error::Gpio)?;
        self.power_state = PowerState::Active;
        self.sample_gain = GainMode::A128;
        debug!("hx711 powered up");
        Ok(())
    }

    /// Give the pins and delay back.
    pub fn release(self) -> (SckPin, DTPin, Delay) {
        (self.sck_pin, self.dt_pin, self.delay)
    }

    fn ensure_active(&self) -> Result<(), Error<E>> {
        match self.power_state {
            PowerState::Active => Ok(()),
            PowerState::PoweredDown => Err(Error::PoweredDown),
        }
    }

    /// Shift in 24 bits then send the gain pulses for the next conversion.
    /// Only call once the data line is low.
    fn shift_sample(&mut self) -> Result<i32, Error<E>> {
        let mut bytes = [0u8; 3];
        for byte in bytes.iter_mut() {
            *byte = self.shift_in()?;
        }
        // send gain mode for next reading
        for _ in 0..self.gain_mode.pulses() {
            self.toggle_sck_bit()?;
        }

        let value = raw_to_i32(bytes);
        trace!(
            "hx711 raw {:02x}{:02x}{:02x} = {}",
            bytes[0],
            bytes[1],
            bytes[2],
            value
        );
        self.last_reading = value;
        self.sample_gain = self.gain_mode;
        Ok(value)
    }

    fn shift_in(&mut self) -> Result<u8, Error<E>> {
        let mut value = 0u8;
        for _ in 0..8 {
            // bits arrive MSB first
            value = (value << 1) | u8::from(self.read_hx711_bit()?);
        }
        Ok(value)
    }

    fn read_hx711_bit(&mut self) -> Result<bool, Error<E>> {
        self.sck_pin.set_high().map_err(Error::Gpio)?;
        self.delay.delay_ns(self.timing.high_ns);
        let bit = self.dt_pin.is_high().map_err(Error::Gpio)?;
        self.sck_pin.set_low().map_err(Error::Gpio)?;
        self.delay.delay_ns(self.timing.low_ns);
        Ok(bit)
    }

    fn toggle_sck_bit(&mut self) -> Result<(), Error<E>> {
        self.sck_pin.set_high().map_err(Error::Gpio)?;
        self.delay.delay_ns(self.timing.high_ns);
        self.sck_pin.set_low().map_err(Error::Gpio)?;
        self.delay.delay_ns(self.timing.low_ns);
        Ok(())
    }
}
