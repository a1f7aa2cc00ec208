//! molt binary: flag parsing, logging setup, and supervisor wiring.

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use molt::{pidfile, spawn_signal_listener, Config, Supervisor};

/// Zero-downtime process supervisor with listening-socket handoff.
///
/// Send SIGHUP to hot-swap the worker; SIGINT/SIGTERM/SIGQUIT to stop.
#[derive(Parser, Debug)]
#[command(name = "molt", version)]
struct Cli {
    /// Comma-separated addresses to bind and hand to the worker (host:port).
    #[arg(long = "listen", value_delimiter = ',')]
    listen: Vec<String>,

    /// Worker executable to supervise.
    #[arg(long = "bin")]
    bin: PathBuf,

    /// Opaque argument string, passed to the worker as a single argument.
    #[arg(long = "args")]
    args: Option<String>,

    /// Working directory for the worker.
    #[arg(long = "dir")]
    dir: Option<PathBuf>,

    /// PID file recording the supervisor's own PID.
    #[arg(long = "pid-file")]
    pid_file: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut cfg = Config::new(self.bin);
        cfg.args = self.args;
        cfg.working_dir = self.dir;
        cfg.listen_addrs = self.listen;
        cfg.pid_file = self.pid_file;
        cfg
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Cli::parse().into_config();
    let pid_file = cfg.pid_file.clone();

    let (control_tx, control_rx) = mpsc::unbounded_channel();
    // a failed initial launch exits here, before the loop ever starts
    let supervisor = Supervisor::start(cfg, control_rx)?;
    spawn_signal_listener(control_tx)?;

    if let Some(path) = &pid_file {
        pidfile::write(path);
    }

    supervisor.run().await;

    if let Some(path) = &pid_file {
        pidfile::remove(path);
    }
    info!("bye");
    Ok(())
}
