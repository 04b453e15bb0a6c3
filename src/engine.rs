//! Edge-triggered quadrature decode engine.
//!
//! [`DecodeEngine::on_edge`] is the hot path. It is called from whatever
//! context the digital-IO backend delivers edges in (an interrupt thread, an
//! ISR, a polling loop) and never blocks:
//!
//! 1. the diagnostic edge counter is bumped unconditionally,
//! 2. nothing else happens unless the engine is running,
//! 3. the line is resolved to its encoder and channel,
//! 4. only the bit of the line that fired is folded into that encoder's
//!    2-bit state (the other channel is never re-sampled),
//! 5. the transition table step for `prev -> next` is added to the counter.
//!
//! Each encoder has its own state word. The fold is a compare-and-swap loop,
//! so two edges for the same encoder always see distinct consecutive states
//! and edges for different encoders never touch the same word.
//!
//! # Example
//!
//! ```rust
//! use rs_encoders::{CounterConfig, DecodeEngine, Level};
//!
//! let engine = DecodeEngine::new(&CounterConfig::default()).unwrap();
//! engine.start();
//!
//! // Encoder 0: lines 0 (A) and 1 (B)
//! engine.on_edge(1, Level::High); // 00 -> 10
//! engine.on_edge(0, Level::High); // 10 -> 11
//! assert_eq!(engine.snapshot().counts, vec![2, 0]);
//! ```

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::{ConfigError, CounterConfig, Mode};
use crate::store::{CountStore, Snapshot};
use crate::table::{increment, Channel, Level};

/// Where a registered line sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineInfo {
    /// Owning encoder.
    pub encoder: usize,
    /// Channel within the encoder.
    pub channel: Channel,
    /// Physical pin number.
    pub pin: u32,
}

/// Immutable line index -> (encoder, channel, pin) mapping.
///
/// Line ids are assigned in configuration order: encoder 0 A, encoder 0 B,
/// encoder 1 A, and so on (one line per encoder in simple mode).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineMap {
    lines: Vec<LineInfo>,
}

impl LineMap {
    /// Builds the mapping from a configuration. The configuration is not
    /// validated here.
    pub fn from_config(config: &CounterConfig) -> Self {
        let lines = config
            .encoders
            .iter()
            .enumerate()
            .flat_map(|(encoder, lines)| {
                lines.pins().map(move |(channel, pin)| LineInfo {
                    encoder,
                    channel,
                    pin,
                })
            })
            .collect();
        Self { lines }
    }

    /// Looks up a line id.
    #[inline]
    pub fn get(&self, line: usize) -> Option<&LineInfo> {
        self.lines.get(line)
    }

    /// Finds the line id bound to a physical pin.
    pub fn line_for_pin(&self, pin: u32) -> Option<usize> {
        self.lines.iter().position(|info| info.pin == pin)
    }

    /// Number of lines.
    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if no lines are mapped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates `(line id, info)` in line order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &LineInfo)> {
        self.lines.iter().enumerate()
    }
}

/// Decode state machine and count store for a fixed set of encoders.
#[derive(Debug)]
pub struct DecodeEngine {
    mode: Mode,
    lines: LineMap,
    states: Box<[AtomicU8]>,
    store: CountStore,
    running: AtomicBool,
}

impl DecodeEngine {
    /// Creates an engine for a validated configuration.
    ///
    /// The engine starts stopped: edges are counted by the diagnostic
    /// counter but do not move any position until [`start`](Self::start).
    pub fn new(config: &CounterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let encoders = config.encoder_count();
        Ok(Self {
            mode: config.mode,
            lines: LineMap::from_config(config),
            states: (0..encoders).map(|_| AtomicU8::new(0)).collect(),
            store: CountStore::new(encoders),
            running: AtomicBool::new(false),
        })
    }

    /// Processes one edge on `line`; `level` is the line's new level.
    ///
    /// Unknown lines only bump the diagnostic counter.
    #[inline]
    pub fn on_edge(&self, line: usize, level: Level) {
        self.store.record_edge();
        if !self.is_running() {
            return;
        }
        let Some(info) = self.lines.get(line) else {
            return;
        };

        match self.mode {
            Mode::Quadrature => {
                let (prev, next) = self.fold(info, level);
                self.store.add(info.encoder, increment(prev, next));
            }
            Mode::Simple => self.store.add(info.encoder, 1),
        }
    }

    /// Same as [`on_edge`](Self::on_edge) for backends that only know the
    /// physical pin.
    pub fn on_pin_edge(&self, pin: u32, level: Level) {
        match self.lines.line_for_pin(pin) {
            Some(line) => self.on_edge(line, level),
            None => self.store.record_edge(),
        }
    }

    /// Records the current level of a line without counting anything.
    ///
    /// Backends call this when a line is bound so the first real edge is
    /// decoded against the actual resting state instead of `00`.
    pub fn prime(&self, line: usize, level: Level) {
        if let Some(info) = self.lines.get(line) {
            self.fold(info, level);
        }
    }

    // Sets the line's bit in its encoder's state word, returns (prev, next).
    fn fold(&self, info: &LineInfo, level: Level) -> (u8, u8) {
        let bit = info.channel.bit();
        let mask = 1u8 << bit;
        let set = level.bit() << bit;
        let apply = |state: u8| (state & !mask) | set;

        let Some(state) = self.states.get(info.encoder) else {
            return (0, 0);
        };
        let prev = state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| Some(apply(s)))
            .unwrap_or_else(|s| s);
        (prev, apply(prev))
    }

    /// Enters the running state.
    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
    }

    /// Leaves the running state; later edges only bump the edge counter.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Returns true while edges move positions.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Decode mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The line mapping fixed at construction.
    #[inline]
    pub fn lines(&self) -> &LineMap {
        &self.lines
    }

    /// Number of encoders.
    #[inline]
    pub fn encoder_count(&self) -> usize {
        self.store.len()
    }

    /// Last recorded 2-bit state of an encoder (`B << 1 | A`).
    pub fn state(&self, encoder: usize) -> Option<u8> {
        self.states.get(encoder).map(|s| s.load(Ordering::Acquire))
    }

    /// The underlying counters.
    #[inline]
    pub fn store(&self) -> &CountStore {
        &self.store
    }

    /// Copies all counters and the edge count.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Zeroes all position counters.
    pub fn reset(&self) {
        self.store.reset();
    }
}

/// Edge callback bound to one line of a shared [`DecodeEngine`].
///
/// Backends receive one handler per line when the line is bound and call
/// [`fire`](Self::fire) from their notification context. Handlers are
/// cheap to clone and `Send + Sync`.
#[derive(Clone, Debug)]
pub struct EdgeHandler {
    engine: Arc<DecodeEngine>,
    line: usize,
}

impl EdgeHandler {
    /// Creates a handler for `line`.
    pub fn new(engine: Arc<DecodeEngine>, line: usize) -> Self {
        Self { engine, line }
    }

    /// Line id this handler feeds.
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Mapping entry for this handler's line.
    pub fn info(&self) -> Option<&LineInfo> {
        self.engine.lines().get(self.line)
    }

    /// Delivers one edge.
    #[inline]
    pub fn fire(&self, level: Level) {
        self.engine.on_edge(self.line, level);
    }

    /// Records the resting level of the line, see [`DecodeEngine::prime`].
    pub fn prime(&self, level: Level) {
        self.engine.prime(self.line, level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncoderLines;

    fn running(config: &CounterConfig) -> DecodeEngine {
        let engine = DecodeEngine::new(config).unwrap();
        engine.start();
        engine
    }

    #[test]
    fn line_map_follows_config_order() {
        let map = LineMap::from_config(&CounterConfig::default());
        assert_eq!(map.len(), 4);
        assert_eq!(
            map.get(3),
            Some(&LineInfo {
                encoder: 1,
                channel: Channel::B,
                pin: 24
            })
        );
        assert_eq!(map.line_for_pin(23), Some(2));
        assert_eq!(map.line_for_pin(99), None);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = CounterConfig::new(Mode::Quadrature);
        assert_eq!(
            DecodeEngine::new(&config).unwrap_err(),
            ConfigError::NoEncoders
        );
    }

    #[test]
    fn stopped_engine_only_counts_edges() {
        let engine = DecodeEngine::new(&CounterConfig::default()).unwrap();
        assert!(!engine.is_running());

        engine.on_edge(0, Level::High);
        engine.on_edge(1, Level::High);

        let snap = engine.snapshot();
        assert_eq!(snap.edges, 2);
        assert_eq!(snap.counts, alloc::vec![0, 0]);
        assert_eq!(engine.state(0), Some(0));
    }

    #[test]
    fn only_fired_bit_changes() {
        let engine = running(&CounterConfig::default());
        engine.on_edge(1, Level::High);
        assert_eq!(engine.state(0), Some(0b10));
        engine.on_edge(0, Level::High);
        assert_eq!(engine.state(0), Some(0b11));
        engine.on_edge(1, Level::Low);
        assert_eq!(engine.state(0), Some(0b01));
        assert_eq!(engine.state(1), Some(0));
    }

    #[test]
    fn repeated_level_is_a_no_op_step() {
        let engine = running(&CounterConfig::default());
        engine.on_edge(0, Level::High);
        engine.on_edge(0, Level::High);
        let snap = engine.snapshot();
        assert_eq!(snap.counts[0], -1);
        assert_eq!(snap.edges, 2);
    }

    #[test]
    fn unknown_line_is_counted_and_ignored() {
        let engine = running(&CounterConfig::default());
        engine.on_edge(42, Level::High);
        engine.on_pin_edge(99, Level::High);
        let snap = engine.snapshot();
        assert_eq!(snap.edges, 2);
        assert_eq!(snap.counts, alloc::vec![0, 0]);
    }

    #[test]
    fn pin_edge_resolves_line() {
        let engine = running(&CounterConfig::default());
        engine.on_pin_edge(24, Level::High); // encoder 1, B
        assert_eq!(engine.snapshot().counts, alloc::vec![0, 1]);
    }

    #[test]
    fn simple_mode_counts_every_edge() {
        let config = CounterConfig::new(Mode::Simple)
            .with_encoder(EncoderLines::Simple { pin: 5 })
            .with_encoder(EncoderLines::Simple { pin: 6 });
        let engine = running(&config);
        for i in 0..6 {
            let level = if i % 2 == 0 { Level::High } else { Level::Low };
            engine.on_edge(1, level);
        }
        assert_eq!(engine.snapshot().counts, alloc::vec![0, 6]);
    }

    #[test]
    fn prime_sets_state_without_counting() {
        let engine = running(&CounterConfig::default());
        engine.prime(0, Level::High);
        engine.prime(1, Level::High);
        assert_eq!(engine.state(0), Some(0b11));
        assert_eq!(engine.snapshot().edges, 0);

        // 11 -> 01 is +1
        engine.on_edge(1, Level::Low);
        assert_eq!(engine.snapshot().counts[0], 1);
    }

    #[test]
    fn handler_feeds_its_line() {
        let engine = Arc::new(running(&CounterConfig::default()));
        let handler = EdgeHandler::new(Arc::clone(&engine), 2);
        assert_eq!(handler.line(), 2);
        assert_eq!(handler.info().map(|i| i.pin), Some(23));

        handler.fire(Level::High); // encoder 1: 00 -> 01
        assert_eq!(engine.snapshot().counts, alloc::vec![0, -1]);
    }

    #[test]
    fn stop_freezes_counts() {
        let engine = running(&CounterConfig::default());
        engine.on_edge(1, Level::High);
        engine.stop();
        engine.on_edge(0, Level::High);
        let snap = engine.snapshot();
        assert_eq!(snap.counts[0], 1);
        assert_eq!(snap.edges, 2);
    }
}
