//! Veto parliament monitor entry point.
//!
//! Loads configuration, starts a tokio runtime for the WebSocket session
//! tasks and runs the monitor's cooperative main loop on the main thread.
//!
//! # Main loop
//!
//! ```text
//! every tick:
//!  ├─ operator commands (stdin)   -> connect / disconnect / send
//!  ├─ Connection::service()       -> adopt handshakes, poll transport
//!  ├─ drain event queue           -> MonitorBoard::apply -> maybe send
//!  └─ expire status, print board if it changed
//! ```
//!
//! The loop itself never blocks on the network.  Handshakes run on bootstrap
//! threads and socket I/O runs on the runtime.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use veto_core::MonitorCommand;
use veto_monitor::application::{MonitorBoard, Reaction};
use veto_monitor::infrastructure::console::{spawn_console_reader, OperatorCommand};
use veto_monitor::infrastructure::network::{Connection, WsConnector};
use veto_monitor::infrastructure::storage::config::{load_config, MonitorConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Veto parliament monitor.
///
/// Connects to the game server as the big-screen monitor and prints the
/// state of the parliament as it changes.
#[derive(Debug, Parser)]
#[command(
    name = "veto-monitor",
    about = "Parliament monitor client for the Veto party game",
    version
)]
struct Cli {
    /// TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = "veto-monitor.toml", env = "VETO_CONFIG")]
    config: PathBuf,

    /// Game server host name.
    #[arg(long, env = "VETO_HOST")]
    host: Option<String>,

    /// Game server port.
    #[arg(long, env = "VETO_PORT")]
    port: Option<u16>,

    /// WebSocket path on the server.
    #[arg(long, env = "VETO_PATH")]
    path: Option<String>,

    /// Reconnect this many seconds after the connection drops.
    ///
    /// Without it the operator reconnects by hand (`c`).
    #[arg(long, env = "VETO_RECONNECT_SECS")]
    reconnect_secs: Option<u64>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "VETO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Override any config option, e.g. `--set server.origin=veto-tv`.
    #[arg(long = "set", value_name = "SECTION.KEY=VALUE")]
    overrides: Vec<String>,

    /// Do not connect at startup.
    #[arg(long)]
    no_connect: bool,
}

impl Cli {
    /// Layers the command line over the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an
    /// override names an unknown option or carries a bad value.
    fn into_monitor_config(self) -> anyhow::Result<MonitorConfig> {
        let mut config = load_config(&self.config)
            .with_context(|| format!("loading config from {}", self.config.display()))?;

        for assignment in &self.overrides {
            config
                .apply_assignment(assignment)
                .with_context(|| format!("applying --set {assignment}"))?;
        }

        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = self.path {
            config.server.path = path;
        }
        if let Some(secs) = self.reconnect_secs {
            config.monitor.reconnect_secs = Some(secs);
        }
        if let Some(level) = self.log_level {
            config.monitor.log_level = level;
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let connect_at_start = !cli.no_connect;
    let config = cli.into_monitor_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.monitor.log_level)),
        )
        .init();

    // The main loop stays synchronous; the runtime only hosts socket tasks.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("veto-io")
        .build()
        .context("building tokio runtime")?;

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let (command_tx, mut commands) = mpsc::unbounded_channel();
    spawn_console_reader(command_tx).context("starting console reader")?;

    let connector = Arc::new(
        WsConnector::new(runtime.handle().clone()).with_connect_timeout(config.connect_timeout()),
    );
    let (conn, mut events) = Connection::new(config.endpoint(), connector);
    let mut conn = conn.with_reconnect_policy(config.reconnect_policy());

    info!(
        "Veto monitor starting; server {} (commands: c, d, s, v, q)",
        conn.endpoint().url()
    );
    if connect_at_start {
        conn.connect();
    }

    let tick = config.tick();
    let mut board = MonitorBoard::new();
    let mut shown = String::new();

    'frames: while running.load(Ordering::Relaxed) {
        while let Ok(command) = commands.try_recv() {
            match command {
                OperatorCommand::Connect => conn.connect(),
                OperatorCommand::Disconnect => conn.disconnect(),
                OperatorCommand::Start => conn.send_command(MonitorCommand::Start),
                OperatorCommand::Voting => conn.send_command(MonitorCommand::Voting),
                OperatorCommand::Quit => break 'frames,
            }
        }

        conn.service();

        while let Ok(event) = events.try_recv() {
            if let Some(Reaction::Send(command)) = board.apply(&event) {
                conn.send_command(command);
            }
        }
        board.expire_status(Instant::now());

        let line = board.to_string();
        if line != shown {
            println!("{line}");
            shown = line;
        }

        std::thread::sleep(tick);
    }

    conn.disconnect();
    runtime.shutdown_timeout(tick * 10);
    info!("Veto monitor stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
