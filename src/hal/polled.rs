//! Polled edge detection for any `embedded-hal` input pin.
//!
//! Platforms without a usable edge interrupt can still feed the decode
//! engine: [`EdgePoller::poll`] samples every attached pin and fires the
//! pin's handler for each level change it sees, in line order. Call it as
//! often as the fastest expected edge rate requires.
//!
//! On an RTOS the sampling task must still block now and then. Sub-tick
//! sleeps usually spin, so [`EdgePoller::poll_burst`] samples several times
//! with a short busy delay in between, and the caller yields once per burst.
//!
//! [`PolledLines`] wraps a pool of already-configured input pins in the
//! [`EdgeLines`] interface so it can be handed to [`EncoderService`].
//!
//! [`EncoderService`]: crate::EncoderService

use alloc::vec::Vec;

use embedded_hal::digital::InputPin;

use crate::engine::EdgeHandler;
use crate::table::Level;
use crate::traits::EdgeLines;

struct Polled<P> {
    pin: P,
    handler: EdgeHandler,
    last: Level,
}

/// Samples attached pins and turns level changes into edges.
pub struct EdgePoller<P> {
    slots: Vec<Option<Polled<P>>>,
}

impl<P> Default for EdgePoller<P> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<P: InputPin> EdgePoller<P> {
    /// Creates an empty poller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `pin`. Its current level primes the handler's line.
    ///
    /// Returns the slot to pass to [`detach`](Self::detach).
    pub fn attach(&mut self, mut pin: P, handler: EdgeHandler) -> Result<usize, P::Error> {
        let last = Level::from(pin.is_high()?);
        handler.prime(last);
        let polled = Some(Polled { pin, handler, last });

        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = polled;
                Ok(slot)
            }
            None => {
                self.slots.push(polled);
                Ok(self.slots.len() - 1)
            }
        }
    }

    /// Stops watching a slot and hands the pin back.
    pub fn detach(&mut self, slot: usize) -> Option<P> {
        self.slots.get_mut(slot)?.take().map(|polled| polled.pin)
    }

    /// Samples every pin once. Returns the number of edges delivered.
    ///
    /// Pins that fail to read are skipped for this round.
    pub fn poll(&mut self) -> usize {
        let mut edges = 0;
        for polled in self.slots.iter_mut().flatten() {
            let Ok(high) = polled.pin.is_high() else {
                continue;
            };
            let level = Level::from(high);
            if level != polled.last {
                polled.last = level;
                polled.handler.fire(level);
                edges += 1;
            }
        }
        edges
    }

    /// Samples `rounds` times, calling `between` after every round but the
    /// last. Returns the number of edges delivered.
    pub fn poll_burst(&mut self, rounds: usize, mut between: impl FnMut()) -> usize {
        let mut edges = 0;
        for round in 0..rounds {
            if round > 0 {
                between();
            }
            edges += self.poll();
        }
        edges
    }

    /// Number of attached pins.
    pub fn active(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

/// Errors from [`PolledLines`].
#[derive(Debug, thiserror::Error)]
pub enum PolledError<E: core::fmt::Debug> {
    /// The pin is not in the pool or is already reserved.
    #[error("pin {0} is not available")]
    Unavailable(u32),
    /// The line was not in the expected state.
    #[error("line for pin {0} is not reserved")]
    NotReserved(u32),
    /// Reading the pin failed.
    #[error("pin read failed: {0:?}")]
    Pin(E),
}

/// Reserved line of a [`PolledLines`] pool.
pub struct PolledLine<P> {
    number: u32,
    pin: Option<P>,
    slot: Option<usize>,
}

impl<P> PolledLine<P> {
    /// Physical pin number.
    pub fn pin(&self) -> u32 {
        self.number
    }
}

/// Pool of numbered input pins served through a shared [`EdgePoller`].
///
/// Pins are expected to be configured as inputs when added to the pool.
pub struct PolledLines<P> {
    pool: Vec<(u32, P)>,
    poller: EdgePoller<P>,
}

impl<P: InputPin> PolledLines<P> {
    /// Creates a pool from `(pin number, input pin)` pairs.
    pub fn new(pins: impl IntoIterator<Item = (u32, P)>) -> Self {
        Self {
            pool: pins.into_iter().collect(),
            poller: EdgePoller::new(),
        }
    }

    /// Samples all bound lines once, see [`EdgePoller::poll`].
    pub fn poll(&mut self) -> usize {
        self.poller.poll()
    }

    /// Samples all bound lines `rounds` times, see [`EdgePoller::poll_burst`].
    pub fn poll_burst(&mut self, rounds: usize, between: impl FnMut()) -> usize {
        self.poller.poll_burst(rounds, between)
    }

    /// Pins still free in the pool.
    pub fn available(&self) -> impl Iterator<Item = u32> + '_ {
        self.pool.iter().map(|(number, _)| *number)
    }
}

impl<P: InputPin> EdgeLines for PolledLines<P> {
    type Line = PolledLine<P>;
    type Error = PolledError<P::Error>;

    fn reserve(&mut self, pin: u32) -> Result<Self::Line, Self::Error> {
        let index = self
            .pool
            .iter()
            .position(|(number, _)| *number == pin)
            .ok_or(PolledError::Unavailable(pin))?;
        let (number, input) = self.pool.swap_remove(index);
        Ok(PolledLine {
            number,
            pin: Some(input),
            slot: None,
        })
    }

    fn configure_input(&mut self, line: &mut Self::Line) -> Result<(), Self::Error> {
        match line.pin {
            Some(_) => Ok(()),
            None => Err(PolledError::NotReserved(line.number)),
        }
    }

    fn bind_edges(&mut self, line: &mut Self::Line, handler: EdgeHandler) -> Result<(), Self::Error> {
        let input = line.pin.take().ok_or(PolledError::NotReserved(line.number))?;
        let slot = self.poller.attach(input, handler).map_err(PolledError::Pin)?;
        line.slot = Some(slot);
        Ok(())
    }

    fn release(&mut self, line: Self::Line) {
        let input = match line.slot {
            Some(slot) => self.poller.detach(slot),
            None => line.pin,
        };
        if let Some(input) = input {
            self.pool.push((line.number, input));
        }
    }
}
