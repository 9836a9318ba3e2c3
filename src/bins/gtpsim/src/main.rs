//! gtpsim - GTPv2-C load generator
//!
//! Drives scripted GTPv2-C control-plane scenarios against an EPC node:
//! - client role: generates subscriber sessions at a configured rate
//! - server role: answers sessions opened by the peer
//! - T3/N3 retransmissions, duplicate handling and dead-call grace period

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub mod config;
pub mod context;
pub mod event;
pub mod gtp_path;
pub mod procedure;
pub mod scenario;
pub mod sequence;
pub mod session;
pub mod stats;
pub mod timer;
pub mod tunnel;

use config::SimConfig;
use context::Simulator;
use gtp_path::UdpTransport;
use scenario::Scenario;

/// gtpsim - GTPv2-C control-plane load generator
#[derive(Parser, Debug)]
#[command(name = "gtpsim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "GTPv2-C control-plane load generator")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario file path (overrides the configuration)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Peer GTP-C address
    #[arg(long)]
    remote: Option<SocketAddr>,

    /// Local GTP-C address
    #[arg(long)]
    local: Option<SocketAddr>,

    /// New sessions per second
    #[arg(long)]
    rate: Option<f64>,

    /// Total sessions to generate (0 = unlimited)
    #[arg(long)]
    max_sessions: Option<u64>,
}

impl Args {
    /// Configuration file with the command line overrides applied
    fn load_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)
                .with_context(|| format!("cannot load configuration {}", path.display()))?,
            None => SimConfig::default(),
        };
        if let Some(scenario) = &self.scenario {
            config.scenario = Some(scenario.clone());
        }
        if let Some(remote) = self.remote {
            config.remote_addr = remote;
        }
        if let Some(local) = self.local {
            config.local_addr = local;
        }
        if let Some(rate) = self.rate {
            config.rate = rate;
        }
        if let Some(max_sessions) = self.max_sessions {
            config.max_sessions = max_sessions;
        }
        config.validate()?;
        Ok(config)
    }
}

/// gtpsim application state
pub struct GtpsimApp {
    /// Running flag
    running: Arc<AtomicBool>,
    simulator: Option<Simulator<UdpTransport>>,
}

impl GtpsimApp {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            simulator: None,
        }
    }

    /// Load the scenario, bind the socket and build the simulator
    pub fn init(&mut self, config: SimConfig) -> Result<()> {
        log::info!("Initializing gtpsim...");

        let scenario_path = config
            .scenario
            .clone()
            .context("no scenario given (--scenario or 'scenario' in the configuration)")?;
        let scenario = Scenario::load(&scenario_path)
            .with_context(|| format!("cannot load scenario {}", scenario_path.display()))?;
        log::debug!("Scenario '{}' loaded from {}", scenario.name, scenario_path.display());

        let transport = UdpTransport::bind(config.local_addr)
            .with_context(|| format!("cannot bind {}", config.local_addr))?;
        self.simulator = Some(Simulator::new(config, scenario, transport)?);

        log::info!("gtpsim initialized successfully");
        Ok(())
    }

    /// Run the scheduler loop until finished or interrupted
    pub fn run(&mut self) -> Result<()> {
        let Some(sim) = self.simulator.as_mut() else {
            anyhow::bail!("gtpsim is not initialized");
        };
        log::info!("gtpsim running...");

        let poll_batch = sim.config().poll_batch;
        let poll_interval = sim.config().poll_interval();
        let stats_interval = sim.config().stats_interval();
        let mut last_report = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            sim.tick(now);
            sim.poll_network(now, poll_batch);

            if now.duration_since(last_report) >= stats_interval {
                sim.stats().log_summary(sim.scenario());
                log::debug!(
                    "Sessions: {} {:?}, control tunnels: {}",
                    sim.active_sessions(),
                    sim.state_counts(),
                    sim.control_tunnel_count()
                );
                last_report = now;
            }

            if sim.finished() {
                log::info!("All sessions finished");
                break;
            }
            std::thread::sleep(poll_interval);
        }

        log::info!("gtpsim main loop exited");
        Ok(())
    }

    /// Abort what is still running and report the final statistics
    pub fn shutdown(&mut self) {
        log::info!("Shutting down gtpsim...");
        if let Some(sim) = self.simulator.as_mut() {
            sim.abort_all();
            sim.stats().log_summary(sim.scenario());
        }
        log::info!("gtpsim shutdown complete");
    }

    /// Signal the application to stop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Get the running flag for signal handlers
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }
}

impl Default for GtpsimApp {
    fn default() -> Self {
        Self::new()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    log::info!("gtpsim v{}", env!("CARGO_PKG_VERSION"));

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}");
            return Err(e);
        }
    };

    let mut app = GtpsimApp::new();

    let running = app.running_flag();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    if let Err(e) = app.init(config) {
        log::error!("{e:#}");
        return Err(e);
    }

    app.run()?;
    app.shutdown();

    log::info!("gtpsim terminated");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
