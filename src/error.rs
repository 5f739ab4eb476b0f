//! Driver error type.

use crate::gpio::LineRole;

/// Errors reported by the HX711 driver.
///
/// `E` is the error type of the underlying GPIO pins. Controller specific
/// errors raised while opening the chip or claiming lines are logged and
/// mapped to [`Error::HardwareUnavailable`] or [`Error::LineUnavailable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error<E> {
    /// The GPIO controller could not be opened.
    #[error("GPIO controller unavailable")]
    HardwareUnavailable,

    /// A line could not be claimed: already owned elsewhere, invalid, or
    /// shared with the other role.
    #[error("{role} line {pin} unavailable")]
    LineUnavailable { role: LineRole, pin: u32 },

    /// Gain code outside of 128, 64 and 32. The previous gain is kept.
    #[error("invalid gain {0}, expected 128, 64 or 32")]
    InvalidGain(u8),

    /// The data line is high, no conversion is available yet.
    #[error("conversion not ready")]
    NotReady,

    /// The chip is powered down; call `power_up` first.
    #[error("chip is powered down")]
    PoweredDown,

    /// The wait deadline expired before the chip signalled ready.
    #[error("timed out waiting for conversion")]
    Timeout,

    /// A pin operation failed.
    #[error("gpio error: {0:?}")]
    Gpio(E),
}
