//! ESP32-C3 encoder counter.
//!
//! Polls two quadrature encoders (GPIO6/7 and GPIO2/3) and logs the counts
//! once per second over the serial console. Boot button (GPIO9) held low at
//! a report resets the counters, the same as a write to the endpoint.
//!
//! Sampling runs in bursts: [`POLLS_PER_BURST`] samples spaced
//! [`POLL_SPACING_US`] apart with a busy delay, then one FreeRTOS tick of
//! real sleep so the idle task runs and the task watchdog stays fed. Edges
//! that come and go within that tick are lost, so this suits hand-turned
//! encoders rather than motor shafts.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! ```

use std::time::{Duration, Instant};

use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{IOPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use rs_encoders::hal::{esp32, LocalRegistry};
use rs_encoders::{CounterConfig, EncoderLines, EncoderService, Mode};

/// Busy-wait spacing between samples inside a burst. Must be under half the
/// shortest time between two edges of one encoder.
const POLL_SPACING_US: u32 = 250;

/// Samples per burst before the task yields.
const POLLS_PER_BURST: usize = 16;

/// Real sleep after each burst; rounds up to at least one tick.
const YIELD_MS: u32 = 1;

/// Serial report interval.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    esp_idf_hal::sys::link_patches();
    tracing_subscriber::fmt().without_time().init();

    let config = CounterConfig::new(Mode::Quadrature)
        .with_encoder(EncoderLines::Quadrature { a: 6, b: 7 })
        .with_encoder(EncoderLines::Quadrature { a: 2, b: 3 });

    let peripherals = Peripherals::take()?;
    let lines = esp32::input_lines([
        peripherals.pins.gpio6.downgrade(),
        peripherals.pins.gpio7.downgrade(),
        peripherals.pins.gpio2.downgrade(),
        peripherals.pins.gpio3.downgrade(),
    ])?;

    let mut reset_button = PinDriver::input(peripherals.pins.gpio9)?;
    reset_button.set_pull(Pull::Up)?;

    // Counts are reported over serial; the registry only dispatches resets.
    let mut service = EncoderService::start(&config, lines, LocalRegistry::new())?;
    tracing::info!("encoder counter running");

    let mut last_report = Instant::now();
    loop {
        service
            .gpio_mut()
            .poll_burst(POLLS_PER_BURST, || Ets::delay_us(POLL_SPACING_US));

        if last_report.elapsed() >= REPORT_INTERVAL {
            last_report = Instant::now();
            let snapshot = service.snapshot();
            tracing::info!(edges = snapshot.edges, counts = ?snapshot.counts, "counts");

            if reset_button.is_low() {
                service
                    .registry()
                    .write(config.device_name.as_str(), &[]);
                tracing::info!("counts reset");
            }
        }

        FreeRtos::delay_ms(YIELD_MS);
    }
}
