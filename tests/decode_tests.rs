//! Decode properties and end-to-end counting scenarios

use std::sync::Arc;
use std::thread;

use rs_encoders::{
    increment, CountDevice, CounterConfig, DecodeEngine, EncoderLines, Level, Mode,
    TRANSITION_TABLE,
};

fn running(config: &CounterConfig) -> Arc<DecodeEngine> {
    let engine = Arc::new(DecodeEngine::new(config).unwrap());
    engine.start();
    engine
}

fn two_quadrature() -> CounterConfig {
    CounterConfig::default()
}

// Tiny deterministic generator so the sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

// ============================================================================
// Table Properties
// ============================================================================

#[test]
fn counter_equals_sum_of_table_lookups() {
    let engine = running(&two_quadrature());
    let mut rng = Lcg(7);
    let mut state = 0u8;
    let mut expected = 0i32;

    for _ in 0..2000 {
        let bit = (rng.next() % 2) as u8;
        let level = if rng.next() % 2 == 0 { Level::Low } else { Level::High };
        let next = (state & !(1 << bit)) | (level.bit() << bit);
        expected += i32::from(TRANSITION_TABLE[state as usize][next as usize]);
        state = next;

        engine.on_edge(bit as usize, level);
    }

    let snap = engine.snapshot();
    assert_eq!(snap.counts[0], expected);
    assert_eq!(snap.counts[1], 0);
    assert_eq!(snap.edges, 2000);
    assert_eq!(engine.state(0), Some(state));
}

#[test]
fn diagonal_skip_contributes_zero() {
    assert_eq!(increment(0b00, 0b11), 0);
    assert_eq!(increment(0b01, 0b10), 0);
    assert_eq!(increment(0b11, 0b00), 0);
    assert_eq!(increment(0b10, 0b01), 0);
}

#[test]
fn each_edge_changes_count_by_at_most_one() {
    let engine = running(&two_quadrature());
    let mut rng = Lcg(99);
    let mut last = 0;
    for _ in 0..500 {
        let line = (rng.next() % 2) as usize;
        let level = Level::from(rng.next() % 2 == 1);
        engine.on_edge(line, level);
        let now = engine.snapshot().counts[0];
        assert!((now - last).abs() <= 1);
        last = now;
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_a_full_cycle_a_leading() {
    // A↑ B↑ A↓ B↓ walks 00 -> 01 -> 11 -> 10 -> 00, each step -1 in the table
    let engine = running(&two_quadrature());
    engine.on_edge(0, Level::High);
    engine.on_edge(1, Level::High);
    engine.on_edge(0, Level::Low);
    engine.on_edge(1, Level::Low);

    assert_eq!(engine.state(0), Some(0b00));
    assert_eq!(engine.snapshot().counts, vec![-4, 0]);
}

#[test]
fn scenario_a_reversed_is_positive() {
    let engine = running(&two_quadrature());
    engine.on_edge(1, Level::High);
    engine.on_edge(0, Level::High);
    engine.on_edge(1, Level::Low);
    engine.on_edge(0, Level::Low);
    assert_eq!(engine.snapshot().counts, vec![4, 0]);
}

#[test]
fn back_and_forth_returns_to_zero() {
    let engine = running(&two_quadrature());
    for _ in 0..10 {
        engine.on_edge(3, Level::High);
        engine.on_edge(3, Level::Low);
    }
    assert_eq!(engine.snapshot().counts, vec![0, 0]);
    assert_eq!(engine.snapshot().edges, 20);
}

#[test]
fn scenario_b_idle_read_is_zero() {
    let engine = running(&two_quadrature());
    let device = CountDevice::new(Arc::clone(&engine));

    let mut buf = [0xAAu8; 8];
    assert_eq!(device.read(&mut buf), Ok(8));
    assert_eq!(buf, [0; 8]);
    assert_eq!(device.snapshot().edges, 0);
}

#[test]
fn scenario_c_write_resets_counts_only() {
    let engine = running(&two_quadrature());
    // Encoder 0 to +5: B↑ A↑ B↓ A↓ then B↑
    for (line, level) in [
        (1, Level::High),
        (0, Level::High),
        (1, Level::Low),
        (0, Level::Low),
        (1, Level::High),
    ] {
        engine.on_edge(line, level);
    }
    // Encoder 1 to -3: A↑ B↑ A↓
    for (line, level) in [(2, Level::High), (3, Level::High), (2, Level::Low)] {
        engine.on_edge(line, level);
    }
    assert_eq!(engine.snapshot().counts, vec![5, -3]);
    let edges = engine.snapshot().edges;

    let device = CountDevice::new(Arc::clone(&engine));
    assert_eq!(device.write(&[0x42]), 1);

    let snap = engine.snapshot();
    assert_eq!(snap.counts, vec![0, 0]);
    assert_eq!(snap.edges, edges);
}

#[test]
fn reset_then_snapshot_is_zero() {
    let engine = running(&two_quadrature());
    engine.on_edge(0, Level::High);
    engine.on_edge(2, Level::High);
    engine.reset();
    let snap = engine.snapshot();
    assert_eq!(snap.counts, vec![0, 0]);
    assert_eq!(snap.edges, 2);
}

#[test]
fn decoding_continues_from_state_after_reset() {
    let engine = running(&two_quadrature());
    engine.on_edge(1, Level::High); // 00 -> 10
    engine.reset();
    engine.on_edge(0, Level::High); // 10 -> 11
    assert_eq!(engine.snapshot().counts, vec![1, 0]);
}

#[test]
fn simple_mode_is_monotonic() {
    let config = CounterConfig::new(Mode::Simple)
        .with_encoder(EncoderLines::Simple { pin: 5 })
        .with_encoder(EncoderLines::Simple { pin: 6 })
        .with_encoder(EncoderLines::Simple { pin: 16 });
    let engine = running(&config);

    let mut level = Level::Low;
    for n in 1..=25 {
        level = level.toggled();
        engine.on_edge(2, level);
        assert_eq!(engine.snapshot().counts[2], n);
    }
    assert_eq!(engine.snapshot().counts, vec![0, 0, 25]);
}

// ============================================================================
// Concurrency
// ============================================================================

// Full forward cycles on one encoder from one thread per encoder.
fn spin_forward(engine: &DecodeEngine, a: usize, b: usize, cycles: usize) {
    for _ in 0..cycles {
        engine.on_edge(b, Level::High);
        engine.on_edge(a, Level::High);
        engine.on_edge(b, Level::Low);
        engine.on_edge(a, Level::Low);
    }
}

#[test]
fn parallel_encoders_do_not_interfere() {
    let config = CounterConfig::new(Mode::Quadrature)
        .with_pins("1:2,3:4,5:6,7:8")
        .unwrap();
    let engine = running(&config);
    let cycles = 5000;

    let workers: Vec<_> = (0..4)
        .map(|encoder| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let a = encoder * 2;
                if encoder % 2 == 0 {
                    spin_forward(&engine, a, a + 1, cycles);
                } else {
                    // Backwards: swap the roles of A and B
                    spin_forward(&engine, a + 1, a, cycles);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let expected = (cycles * 4) as i32;
    let snap = engine.snapshot();
    assert_eq!(snap.counts, vec![expected, -expected, expected, -expected]);
    assert_eq!(snap.edges, (cycles * 4 * 4) as u32);
}

#[test]
fn concurrent_reads_see_monotonic_counts() {
    let engine = running(&two_quadrature());
    let cycles = 20_000;

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || spin_forward(&engine, 0, 1, cycles))
    };

    let mut last = 0;
    while !writer.is_finished() {
        let now = engine.snapshot().counts[0];
        assert!(now >= last);
        last = now;
    }
    writer.join().unwrap();

    assert_eq!(engine.snapshot().counts[0], (cycles * 4) as i32);
}

#[test]
fn same_encoder_from_two_threads_keeps_state_consistent() {
    // Each thread toggles one channel; whatever the interleaving, the
    // counter must match the state reached: every accepted step is +-1 and
    // the final state is 00 after both threads return their line low.
    let engine = running(&two_quadrature());
    let toggles = 10_000;

    let workers: Vec<_> = [0usize, 1]
        .into_iter()
        .map(|line| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..toggles {
                    engine.on_edge(line, Level::High);
                    engine.on_edge(line, Level::Low);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(engine.state(0), Some(0));
    // From 00 back to 00 the net count is a whole number of cycles.
    assert_eq!(engine.snapshot().counts[0] % 4, 0);
    assert_eq!(engine.snapshot().edges, (toggles * 4) as u32);
}
