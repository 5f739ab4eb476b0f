//! Tare and calibration on top of the raw driver.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::error::Error;
use crate::gpio::{GpioChip, Hx711Lines};
use crate::hx711::HX711;
use crate::LoadCell;

/// Anything that yields raw 24 bit samples.
pub trait Sampler {
    type Error;

    fn sample(&mut self) -> Result<i32, Self::Error>;
}

impl<SckPin, DTPin, Delay, E> Sampler for HX711<SckPin, DTPin, Delay>
where
    SckPin: OutputPin<Error = E>,
    DTPin: InputPin<Error = E>,
    Delay: DelayNs,
{
    type Error = Error<E>;

    fn sample(&mut self) -> Result<i32, Self::Error> {
        self.read()
    }
}

impl<C, D, E> Sampler for Hx711Lines<C, D>
where
    C: GpioChip,
    C::Input: InputPin<Error = E>,
    C::Output: OutputPin<Error = E>,
    D: DelayNs,
{
    type Error = Error<E>;

    fn sample(&mut self) -> Result<i32, Self::Error> {
        self.read()
    }
}

impl<T: Sampler + ?Sized> Sampler for &mut T {
    type Error = T::Error;

    fn sample(&mut self) -> Result<i32, Self::Error> {
        (**self).sample()
    }
}

/// A sample source with an offset (tare) and a scale factor (counts per unit).
pub struct WeighScale<S> {
    source: S,
    offset: i32,
    scale: f32,
}

impl<S> WeighScale<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            offset: 0,
            scale: 1.0,
        }
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.offset = offset;
    }

    pub fn source(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: Sampler> LoadCell for WeighScale<S> {
    type Offset = i32;
    type Scale = f32;
    type Error = S::Error;

    fn read(&mut self) -> Result<i32, Self::Error> {
        self.source.sample()
    }

    fn read_scaled(&mut self) -> Result<f32, Self::Error> {
        let raw = self.source.sample()?;
        Ok(raw.saturating_sub(self.offset) as f32 / self.scale)
    }

    /// Truncating mean of `num_samples` reads. Zero samples keeps the offset.
    fn tare(&mut self, num_samples: usize) -> Result<i32, Self::Error> {
        if num_samples == 0 {
            return Ok(self.offset);
        }
        let mut sum: i64 = 0;
        for _ in 0..num_samples {
            sum += i64::from(self.source.sample()?);
        }
        // the mean of 24 bit samples always fits
        self.offset = (sum / num_samples as i64) as i32;
        debug!("tare offset {} from {} samples", self.offset, num_samples);
        Ok(self.offset)
    }

    fn get_offset(&self) -> i32 {
        self.offset
    }

    fn set_scale(&mut self, scale: f32) {
        if scale == 0.0 || !scale.is_finite() {
            warn!("ignoring scale {}, keeping {}", scale, self.scale);
            return;
        }
        self.scale = scale;
    }

    fn get_scale(&self) -> f32 {
        self.scale
    }
}
