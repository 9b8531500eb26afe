//! CLI entry point for rust_scope.
//!
//! Provides the command-line interface for:
//! - Serving the instrument protocol to a visualization client, over TCP
//!   (default) or a serial link (`--serial`, requires the `serial` feature)
//! - Running a one-shot selftest sweep against the simulated source
//!
//! # Usage
//!
//! Serve on the configured TCP address:
//! ```bash
//! rust_scope serve
//! ```
//!
//! Serve on a serial port:
//! ```bash
//! rust_scope serve --serial /dev/ttyUSB0 --baud 921600
//! ```
//!
//! Capture one sweep and print the measurements:
//! ```bash
//! rust_scope selftest
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_scope::acquisition::SamplingPipeline;
use rust_scope::calibration::CalibrationCurve;
use rust_scope::config::ScopeConfig;
use rust_scope::controller::Controller;
use rust_scope::limits::{clamp_sample_rate, BUFFER_DEPTH, LINK_BAUD};
use rust_scope::logging::{self, LogSettings};
use rust_scope::measurement;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, Instrument};

#[derive(Parser)]
#[command(name = "rust_scope")]
#[command(about = "Single-channel digital storage oscilloscope front end", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config/scope.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the instrument protocol to a visualization client
    Serve {
        /// TCP listen address, overriding the configured one
        #[arg(long)]
        bind: Option<String>,

        /// Serve over this serial port instead of TCP
        #[arg(long)]
        serial: Option<String>,

        /// Serial baud rate
        #[arg(long, default_value_t = LINK_BAUD)]
        baud: u32,
    },

    /// Capture one sweep from the simulated source and print measurements
    Selftest,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ScopeConfig::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    config.validate()?;

    logging::init(&LogSettings::from_config(&config.application)?)?;

    match cli.command {
        Commands::Serve { bind, serial, baud } => serve(config, bind, serial, baud).await,
        Commands::Selftest => selftest(config).await,
    }
}

/// Assemble a controller from loaded settings: calibration curve, simulated
/// source, sampling pipeline, startup acquisition defaults.
fn build_controller(config: &ScopeConfig) -> Result<Controller> {
    let curve = CalibrationCurve::characterize(
        &config.calibration_source(),
        config.adc.full_scale_volts,
    )?;
    let pipeline = SamplingPipeline::new(Box::new(config.simulator.build()), BUFFER_DEPTH);
    Ok(Controller::new(pipeline, curve).with_config(config.acquisition_defaults()))
}

async fn serve(
    config: ScopeConfig,
    bind: Option<String>,
    serial: Option<String>,
    baud: u32,
) -> Result<()> {
    if let Some(path) = serial {
        return serve_serial(config, path, baud).await;
    }

    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "instrument daemon listening");

    // The protocol is stateful and single-channel; serve one client at a
    // time and let further connections wait in the accept backlog.
    loop {
        let (stream, peer) = listener.accept().await?;
        stream.set_nodelay(true).ok();

        let mut controller = build_controller(&config)?;
        let session = info_span!("session", client = %peer);
        match controller.run_session(stream).instrument(session).await {
            Ok(()) => info!(client = %peer, "session finished"),
            Err(err) => error!(client = %peer, error = %err, "session failed"),
        }
    }
}

async fn serve_serial(config: ScopeConfig, path: String, baud: u32) -> Result<()> {
    #[cfg(feature = "serial")]
    {
        use rust_scope::transport;
        use std::time::Duration;
        use tracing::debug;

        let mut link = transport::open_serial_async(&path, baud).await?;
        let drained = transport::drain_link(&mut link, Duration::from_millis(100)).await;
        if drained > 0 {
            debug!(bytes = drained, "drained stale bytes from the link");
        }
        info!(port = %path, baud, "instrument daemon on serial link");

        let mut controller = build_controller(&config)?;
        let session = info_span!("session", port = %path);
        controller.run_session(link).instrument(session).await?;
        info!("serial session finished");
        return Ok(());
    }

    #[cfg(not(feature = "serial"))]
    {
        let _ = (config, path, baud);
        return Err(rust_scope::error::ScopeError::SerialFeatureDisabled.into());
    }
}

/// One acquisition round straight through the measurement path, reported on
/// stdout. Exercises the same pipeline the daemon serves.
async fn selftest(config: ScopeConfig) -> Result<()> {
    let curve = CalibrationCurve::characterize(
        &config.calibration_source(),
        config.adc.full_scale_volts,
    )?;
    let rate = clamp_sample_rate(config.acquisition.sample_rate);

    let mut pipeline = SamplingPipeline::new(Box::new(config.simulator.build()), BUFFER_DEPTH);
    pipeline.configure(rate).await?;
    pipeline.run_round().await?;

    let sweep = pipeline.sweep();
    let snapshot = measurement::analyze(sweep, rate, &curve, config.acquisition.probe.factor());
    let present = measurement::signal_present(&snapshot.stats, &curve);

    println!("waveform    : {:?}", config.simulator.waveform);
    println!("sweep       : {} samples at {} Hz", sweep.len(), rate);
    println!("vpp         : {:.3} V", snapshot.vpp);
    println!("vmean       : {:.3} V", snapshot.vmean);
    println!("frequency   : {:.2} Hz", snapshot.freq.frequency);
    println!(
        "signal      : {}",
        if present { "present" } else { "below noise floor" }
    );
    Ok(())
}
