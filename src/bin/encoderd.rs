//! Raspberry Pi encoder counter daemon.
//!
//! Binds every configured line with rppal edge interrupts and serves the
//! counters over HTTP:
//!
//! ```bash
//! # Two quadrature encoders on BCM 17/27 and 23/24 (the defaults)
//! encoderd
//!
//! # Four single-line counters
//! encoderd --mode simple --pins 5,6,16,26 --name counters
//!
//! # Read (8 bytes for two encoders), then reset
//! curl -s http://pi:8080/dev/encoder-driver | xxd
//! curl -X POST http://pi:8080/dev/encoder-driver
//! ```
//!
//! Set `RUST_LOG=debug` for per-line registration logs.

use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use rs_encoders::hal::rpi::RpiLines;
use rs_encoders::services::{run_server, WebRegistry, WebServerConfig};
use rs_encoders::{CounterConfig, EncoderService, Mode};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ModeArg {
    Quadrature,
    Simple,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Quadrature => Mode::Quadrature,
            ModeArg::Simple => Mode::Simple,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "encoderd", version, about = "Quadrature encoder counter daemon")]
struct Cli {
    /// Decode mode shared by every encoder
    #[arg(long, value_enum, default_value_t = ModeArg::Quadrature)]
    mode: ModeArg,
    /// BCM pins: "A:B,A:B" in quadrature mode, "P,P" in simple mode
    #[arg(long, default_value = "17:27,23:24")]
    pins: String,
    /// Endpoint name
    #[arg(long, default_value = "encoder-driver")]
    name: String,
    /// HTTP listen address
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,
    /// Allow cross-origin reads
    #[arg(long)]
    cors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = CounterConfig::new(cli.mode.into())
        .with_pins(&cli.pins)
        .context("parsing --pins")?
        .with_device_name(&cli.name);

    let registry = WebRegistry::new();
    let gpio = RpiLines::new().context("opening GPIO")?;
    let service = EncoderService::start(&config, gpio, registry.clone())
        .context("starting encoder service")?;

    let web = WebServerConfig::new(cli.listen).cors(cli.cors);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };
    let served = run_server(registry, web, shutdown).await;

    let snapshot = service.snapshot();
    service.stop();
    tracing::info!(edges = snapshot.edges, counts = ?snapshot.counts, "stopped");

    served.context("serving HTTP")
}
