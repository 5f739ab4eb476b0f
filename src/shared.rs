//! A driver slot shared between several consumers.
//!
//! Reads must never interleave on the wire, so every access goes through one
//! critical section. Holding it for a whole read blocks other users for the
//! duration of the bit loop; prefer [`HX711::try_read`](crate::hx711::HX711::try_read)
//! or a bounded read inside [`Shared::with`].

use core::cell::RefCell;

use critical_section::Mutex;

pub struct Shared<T> {
    slot: Mutex<RefCell<Option<T>>>,
}

impl<T> Shared<T> {
    /// An empty slot. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Put `driver` in the slot, returning the previous one.
    pub fn install(&self, driver: T) -> Option<T> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).replace(driver))
    }

    /// Remove the driver, e.g. to tear it down.
    pub fn take(&self) -> Option<T> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).take())
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow_ref(cs).is_some())
    }

    /// Run `f` with exclusive access to the driver. `None` when the slot is empty.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}
