//! Controller and line ownership over init/teardown cycles.
//!
//! A fake controller keeps a ledger shared across "processes" (chip handles)
//! so leaked or double released lines show up as count mismatches.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};
use embedded_hal_mock::eh1::delay::NoopDelay;
use hx711_gpio::gpio::{GpioChip, Hx711Lines, LineRole};
use hx711_gpio::scale::WeighScale;
use hx711_gpio::wait::PollBudget;
use hx711_gpio::{Config, Error, GainMode, LoadCell};

#[derive(Default)]
struct Ledger {
    opened: Cell<u32>,
    closed: Cell<u32>,
    claimed: Cell<u32>,
    released: Cell<u32>,
    owned: RefCell<BTreeSet<u32>>,
    rising_edges: Cell<u32>,
    refuse_open: Cell<bool>,
    data_level: Cell<bool>,
}

impl Ledger {
    fn claim(&self, pin: u32) -> Result<(), FakeError> {
        if !self.owned.borrow_mut().insert(pin) {
            return Err(FakeError::Busy(pin));
        }
        self.claimed.set(self.claimed.get() + 1);
        Ok(())
    }

    fn release(&self, pin: u32) {
        assert!(
            self.owned.borrow_mut().remove(&pin),
            "line {pin} released twice"
        );
        self.released.set(self.released.get() + 1);
    }

    fn balanced(&self) -> bool {
        self.opened.get() == self.closed.get()
            && self.claimed.get() == self.released.get()
            && self.owned.borrow().is_empty()
    }
}

#[derive(Debug)]
enum FakeError {
    Busy(#[allow(dead_code)] u32),
    NoController,
}

struct FakeChip {
    ledger: Rc<Ledger>,
    // lines handed out by this handle and not yet released
    alive: Rc<Cell<u32>>,
}

impl FakeChip {
    fn open(ledger: &Rc<Ledger>) -> Result<Self, FakeError> {
        if ledger.refuse_open.get() {
            return Err(FakeError::NoController);
        }
        ledger.opened.set(ledger.opened.get() + 1);
        Ok(Self {
            ledger: Rc::clone(ledger),
            alive: Rc::new(Cell::new(0)),
        })
    }

    fn line(&self, pin: u32, level: bool) -> FakeLine {
        self.alive.set(self.alive.get() + 1);
        FakeLine {
            pin,
            level,
            ledger: Rc::clone(&self.ledger),
            alive: Rc::clone(&self.alive),
        }
    }
}

impl Drop for FakeChip {
    fn drop(&mut self) {
        assert_eq!(self.alive.get(), 0, "controller closed before its lines");
        self.ledger.closed.set(self.ledger.closed.get() + 1);
    }
}

struct FakeLine {
    pin: u32,
    level: bool,
    ledger: Rc<Ledger>,
    alive: Rc<Cell<u32>>,
}

impl Drop for FakeLine {
    fn drop(&mut self) {
        self.ledger.release(self.pin);
        self.alive.set(self.alive.get() - 1);
    }
}

impl ErrorType for FakeLine {
    type Error = Infallible;
}

impl InputPin for FakeLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.ledger.data_level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.ledger.data_level.get())
    }
}

impl OutputPin for FakeLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.level {
            self.ledger.rising_edges.set(self.ledger.rising_edges.get() + 1);
        }
        self.level = true;
        Ok(())
    }
}

impl GpioChip for FakeChip {
    type Error = FakeError;
    type Input = FakeLine;
    type Output = FakeLine;

    fn request_input(
        &mut self,
        pin: u32,
        _consumer: &'static str,
    ) -> Result<FakeLine, FakeError> {
        self.ledger.claim(pin)?;
        Ok(self.line(pin, false))
    }

    fn request_output(
        &mut self,
        pin: u32,
        _consumer: &'static str,
        initial: PinState,
    ) -> Result<FakeLine, FakeError> {
        self.ledger.claim(pin)?;
        Ok(self.line(pin, initial == PinState::High))
    }
}

type Lines = Hx711Lines<FakeChip, NoopDelay>;

fn initialize(ledger: &Rc<Ledger>, config: &Config) -> Result<Lines, Error<Infallible>> {
    Hx711Lines::initialize(|| FakeChip::open(ledger), config, NoopDelay::new())
}

#[test]
fn repeated_init_and_close_balance() {
    let ledger = Rc::new(Ledger::default());
    let config = Config::new(5, 6);

    for _ in 0..5 {
        let lines = initialize(&ledger, &config).unwrap();
        assert_eq!(lines.data_pin(), 5);
        assert_eq!(lines.clock_pin(), 6);
        lines.close();
    }
    for _ in 0..5 {
        // plain drop tears down the same way
        drop(initialize(&ledger, &config).unwrap());
    }

    assert_eq!(ledger.opened.get(), 10);
    assert_eq!(ledger.claimed.get(), 20);
    assert!(ledger.balanced());
}

#[test]
fn lines_are_exclusive_while_owned() {
    let ledger = Rc::new(Ledger::default());
    let config = Config::new(5, 6);

    let first = initialize(&ledger, &config).unwrap();
    let second = initialize(&ledger, &config);
    assert_eq!(
        second.err(),
        Some(Error::LineUnavailable {
            role: LineRole::Data,
            pin: 5,
        })
    );

    first.close();
    assert!(ledger.balanced());
    initialize(&ledger, &config).unwrap().close();
    assert!(ledger.balanced());
}

#[test]
fn busy_clock_line_releases_data_line() {
    let ledger = Rc::new(Ledger::default());
    ledger.owned.borrow_mut().insert(6);

    let result = initialize(&ledger, &Config::new(5, 6));
    assert_eq!(
        result.err(),
        Some(Error::LineUnavailable {
            role: LineRole::Clock,
            pin: 6,
        })
    );

    // the data line was claimed and released once, the controller closed once
    assert_eq!(ledger.claimed.get(), 1);
    assert_eq!(ledger.released.get(), 1);
    assert_eq!(ledger.opened.get(), 1);
    assert_eq!(ledger.closed.get(), 1);
    assert_eq!(*ledger.owned.borrow(), BTreeSet::from([6]));
}

#[test]
fn missing_controller_is_reported() {
    let ledger = Rc::new(Ledger::default());
    ledger.refuse_open.set(true);

    let result = initialize(&ledger, &Config::new(5, 6));
    assert_eq!(result.err(), Some(Error::HardwareUnavailable));
    assert!(ledger.balanced());
    assert_eq!(ledger.opened.get(), 0);
}

#[test]
fn shared_pin_is_refused_before_opening() {
    let ledger = Rc::new(Ledger::default());

    let result = initialize(&ledger, &Config::new(7, 7));
    assert_eq!(
        result.err(),
        Some(Error::LineUnavailable {
            role: LineRole::Clock,
            pin: 7,
        })
    );
    assert_eq!(ledger.opened.get(), 0);
}

#[test]
fn each_read_clocks_data_and_gain_pulses() {
    let ledger = Rc::new(Ledger::default());
    let config = Config::new(5, 6).with_gain(GainMode::A64);
    let mut lines = initialize(&ledger, &config).unwrap();
    assert_eq!(lines.get_gain_mode(), GainMode::A64);

    // data line held low: ready, and every bit reads zero
    assert_eq!(lines.read(), Ok(0));
    assert_eq!(ledger.rising_edges.get(), 24 + 3);

    lines.set_gain(128).unwrap();
    assert_eq!(lines.read(), Ok(0));
    assert_eq!(ledger.rising_edges.get(), 27 + 24 + 1);

    lines.close();
    assert!(ledger.balanced());
}

#[test]
fn stuck_data_line_times_out_without_clocking() {
    let ledger = Rc::new(Ledger::default());
    let mut lines = initialize(&ledger, &Config::new(5, 6)).unwrap();

    // a disconnected chip leaves the data line high: never ready
    ledger.data_level.set(true);
    assert_eq!(lines.try_read(), Err(Error::NotReady));
    assert_eq!(lines.read_until(PollBudget::new(3)), Err(Error::Timeout));
    assert_eq!(ledger.rising_edges.get(), 0);

    lines.close();
    assert!(ledger.balanced());
}

#[test]
fn tare_through_owned_lines() {
    let ledger = Rc::new(Ledger::default());
    let mut lines = initialize(&ledger, &Config::new(5, 6)).unwrap();
    let mut scale = WeighScale::new(&mut lines);

    assert_eq!(scale.tare(4), Ok(0));
    assert_eq!(ledger.rising_edges.get(), 4 * 25);

    lines.close();
    assert!(ledger.balanced());
}
