// rigbridged -- serve one serial-attached transceiver to rigctld clients.
//
// Usage:
//   rigbridged --model IC-7300 --port /dev/ttyUSB0
//   rigbridged --model K3 --port /dev/ttyUSB1 --listen 0.0.0.0:4533 -v
//   rigbridged --model IC-706MKIIG --port COM4 --civ-addr 0x58 --baud 9600
//   rigbridged --list-models

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rigbridge::framing::retry_with_backoff;
use rigbridge::rigctld::{RigctldServer, ServerConfig};
use rigbridge::{find_model, list_models, BandRange, CoordinatorBuilder, Error, ModelEntry, Rig};

const OPEN_ATTEMPTS: u32 = 3;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Serve a transceiver over the Hamlib rigctld network protocol.
#[derive(Parser)]
#[command(name = "rigbridged", version, about)]
struct Cli {
    /// Rig model name (e.g. IC-7300, TS-590SG, K3, FT-DX10).
    #[arg(long, required_unless_present = "list_models")]
    model: Option<String>,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    #[arg(long, required_unless_present = "list_models")]
    port: Option<String>,

    /// Override the default baud rate for this model.
    #[arg(long)]
    baud: Option<u32>,

    /// Override the default CI-V address (hex, e.g. 0x94). Icom only.
    #[arg(long, value_parser = parse_hex_u8)]
    civ_addr: Option<u8>,

    /// Address the rigctld server listens on.
    #[arg(long, default_value = "127.0.0.1:4532")]
    listen: SocketAddr,

    /// Per-command timeout in milliseconds (default depends on baud rate).
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// How long a read stays cached, in milliseconds. 0 disables caching.
    #[arg(long, default_value_t = 500)]
    cache_ttl_ms: u64,

    /// Print the supported models and exit.
    #[arg(long)]
    list_models: bool,

    /// More logging (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Parse a hex string like "0x94" or "94" into a u8.
fn parse_hex_u8(s: &str) -> std::result::Result<u8, String> {
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(s, 16).map_err(|e| format!("invalid hex byte: {e}"))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Model listing
// ---------------------------------------------------------------------------

/// Format frequency ranges into a compact summary string.
fn summarize_freq_ranges(ranges: &[BandRange]) -> String {
    ranges
        .iter()
        .map(|r| {
            let low = r.low_hz as f64 / 1_000_000.0;
            let high = r.high_hz as f64 / 1_000_000.0;
            format!("{low:.1}-{high:.1} MHz")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn cmd_list_models() {
    let entries = list_models();
    let name_width = entries.iter().map(|e| e.name.len()).max().unwrap_or(12).max(12);

    println!(
        "{:<12}  {:<name_width$}  {:<5}  {:>7}  {:>6}  Frequency Coverage",
        "Manufacturer", "Model", "Proto", "Power", "Baud",
    );
    println!(
        "{:<12}  {:<name_width$}  {:<5}  {:>7}  {:>6}  ------------------",
        "-".repeat(12),
        "-".repeat(name_width),
        "-----",
        "-------",
        "------",
    );
    for entry in &entries {
        println!(
            "{:<12}  {:<name_width$}  {:<5}  {:>5.0} W  {:>6}  {}",
            entry.manufacturer.to_string(),
            entry.name,
            entry.protocol(),
            entry.capabilities.max_power_watts,
            entry.default_baud_rate,
            summarize_freq_ranges(&entry.capabilities.frequency_ranges),
        );
    }
    println!();
    println!("{} models total.", entries.len());
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

fn builder_for(entry: &ModelEntry, cli: &Cli, port: &str) -> rigbridge::Result<CoordinatorBuilder> {
    let mut builder = CoordinatorBuilder::new(entry.engine(cli.civ_addr)?)
        .serial_port(port)
        .cache_ttl(Duration::from_millis(cli.cache_ttl_ms));
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }
    if let Some(ms) = cli.timeout_ms {
        builder = builder.command_timeout(Duration::from_millis(ms));
    }
    Ok(builder)
}

/// Failures worth another attempt: the port may still be enumerating, or
/// the rig may be finishing its power-on sequence.
fn worth_retrying(err: &Error) -> bool {
    matches!(err, Error::Timeout | Error::Transport(_) | Error::Io(_))
}

async fn serve(cli: Cli) -> Result<()> {
    let (Some(model), Some(port)) = (cli.model.as_deref(), cli.port.as_deref()) else {
        bail!("--model and --port are required");
    };
    let entry = find_model(model)?;
    if cli.timeout_ms == Some(0) {
        bail!("--timeout-ms must be greater than zero");
    }

    let rig = retry_with_backoff(OPEN_ATTEMPTS, OPEN_RETRY_DELAY, worth_retrying, || {
        let builder = builder_for(&entry, &cli, port);
        async move { builder?.build().await }
    })
    .await
    .with_context(|| format!("failed to connect to {} on {port}", entry.name))?;
    info!(model = %rig.info().model_name, %port, "rig connected");

    let config = ServerConfig {
        listen: cli.listen,
        ..ServerConfig::default()
    };
    let server = RigctldServer::bind(config, Arc::new(rig.clone()))
        .await
        .context("failed to start rigctld server")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                on_signal.cancel();
            }
            Err(e) => warn!("cannot listen for interrupt: {e}"),
        }
    });

    server.run(cancel).await?;

    if let Err(e) = rig.shutdown().await {
        warn!("coordinator shutdown: {e}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list_models {
        cmd_list_models();
        return Ok(());
    }
    serve(cli).await
}
