//! pktio-ctl entry point.
//!
//! Drives one full runtime lifecycle against the simulated device model:
//! initialize, configure, start, dump counters, stop, clean up.

use anyhow::Context;
use clap::Parser;
use pktio_hal::{SimHal, SimPort};
use pktio_runtime::audit::{init_logging, init_logging_pretty};
use pktio_runtime::{ResourceManager, RuntimeConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Packet I/O runtime lifecycle controller
#[derive(Parser, Debug)]
#[command(name = "pktio-ctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults apply when missing)
    #[arg(short = 'c', long, default_value = pktio_runtime::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long)]
    json: bool,

    /// Number of ports in the simulated device model
    #[arg(long, default_value = "2")]
    sim_ports: usize,

    /// Driver name reported by simulated ports
    #[arg(long, default_value = "net_sim")]
    driver: String,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = RuntimeConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let hal = SimHal::builder()
        .ports(args.sim_ports, SimPort::new(args.driver.as_str()))
        .build();
    let mut manager = ResourceManager::new(Arc::new(hal));

    manager
        .initialize(config)
        .context("runtime initialization failed")?;
    info!("Initialized with {} port(s)", manager.port_count());

    let configured = manager.configure_ports()?;
    if !configured.all_succeeded() {
        warn!("Ports skipped during configuration: {:?}", configured.skipped());
    }

    let started = manager.start_ports()?;
    if !started.all_succeeded() {
        warn!(
            "Ports not started: {:?}, degraded: {:?}",
            started.skipped(),
            started.degraded()
        );
    }

    for (port, stats) in manager.report_all_stats() {
        info!(
            "port {}: rx {} pkts / {} bytes, tx {} pkts / {} bytes",
            port, stats.ipackets, stats.ibytes, stats.opackets, stats.obytes
        );
    }

    let stopped = manager.stop_ports();
    if !stopped.all_succeeded() {
        warn!("Ports not closed cleanly: {:?}", stopped.skipped());
    }

    manager.cleanup();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.json {
        init_logging(&args.log_level);
    } else {
        init_logging_pretty(&args.log_level);
    }

    info!("--- Starting pktio-ctl ---");

    match run(&args) {
        Ok(()) => {
            info!("--- pktio-ctl finished ---");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
