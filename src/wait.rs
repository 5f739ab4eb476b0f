//! Deadlines for the ready-wait loop.
//!
//! The HX711 has no timeout of its own: a disconnected chip simply holds the
//! data line high forever. [`Deadline`] lets callers bound
//! [`HX711::wait_ready_until`](crate::hx711::HX711::wait_ready_until) and
//! [`HX711::read_until`](crate::hx711::HX711::read_until) without touching
//! the bit timing. The deadline is checked once per poll.

use core::sync::atomic::{AtomicBool, Ordering};

/// A condition checked before each poll of the data line.
pub trait Deadline {
    /// Returns true once waiting must stop.
    fn expired(&mut self) -> bool;
}

impl<T: Deadline + ?Sized> Deadline for &mut T {
    fn expired(&mut self) -> bool {
        (**self).expired()
    }
}

/// Never expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn expired(&mut self) -> bool {
        false
    }
}

/// Expires after a fixed number of polls. Usable without a clock.
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    remaining: u32,
}

impl PollBudget {
    pub const fn new(polls: u32) -> Self {
        Self { remaining: polls }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Deadline for PollBudget {
    fn expired(&mut self) -> bool {
        match self.remaining.checked_sub(1) {
            Some(left) => {
                self.remaining = left;
                false
            }
            None => true,
        }
    }
}

/// Expires as soon as the flag is set, e.g. by another thread or an ISR.
#[derive(Debug, Clone, Copy)]
pub struct CancelFlag<'a>(pub &'a AtomicBool);

impl Deadline for CancelFlag<'_> {
    fn expired(&mut self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Wall clock deadline.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct Until(pub std::time::Instant);

#[cfg(feature = "std")]
impl Until {
    /// Deadline `timeout` from now.
    pub fn after(timeout: std::time::Duration) -> Self {
        Self(std::time::Instant::now() + timeout)
    }
}

#[cfg(feature = "std")]
impl Deadline for Until {
    fn expired(&mut self) -> bool {
        std::time::Instant::now() >= self.0
    }
}
