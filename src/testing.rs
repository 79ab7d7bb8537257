//! Host-side fakes for the hardware ports.

use core::cell::Cell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::clock::{Clock, Millis};

#[derive(Default)]
struct PinState {
    high: Cell<bool>,
    writes: Cell<usize>,
}

/// `OutputPin` that records its level for a paired [`PinProbe`].
pub struct ProbePin(Rc<PinState>);

/// Read side of a [`ProbePin`].
#[derive(Clone)]
pub struct PinProbe(Rc<PinState>);

impl ProbePin {
    pub fn new() -> (Self, PinProbe) {
        let state = Rc::new(PinState::default());
        (Self(state.clone()), PinProbe(state))
    }
}

impl PinProbe {
    pub fn is_high(&self) -> bool {
        self.0.high.get()
    }

    pub fn writes(&self) -> usize {
        self.0.writes.get()
    }
}

impl ErrorType for ProbePin {
    type Error = Infallible;
}

impl OutputPin for ProbePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.high.set(false);
        self.0.writes.set(self.0.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.high.set(true);
        self.0.writes.set(self.0.writes.get() + 1);
        Ok(())
    }
}

/// Clock advanced by hand.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<Millis>>);

impl ManualClock {
    pub fn set(&self, now: Millis) {
        self.0.set(now);
    }

    pub fn advance(&self, ms: Millis) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.0.get()
    }
}
