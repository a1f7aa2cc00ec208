//! # Supervisor configuration.
//!
//! [`Config`] describes the worker to supervise (binary, argument string,
//! working directory), the listen set handed down at every launch, the
//! optional PID file, and the three pacing knobs of the state machine:
//! crash-backoff floor, reload retry interval, and stop re-signal interval.
//!
//! The listen set is immutable after startup; every launch provisions the
//! same addresses.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use molt::Config;
//!
//! let mut cfg = Config::new("/usr/local/bin/worker");
//! cfg.listen_addrs = vec!["127.0.0.1:8080".into()];
//! cfg.crash_backoff_floor = Duration::from_secs(5);
//!
//! assert_eq!(cfg.stop_resignal_interval, Duration::from_secs(1));
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the supervisor and every worker launch.
#[derive(Clone, Debug)]
pub struct Config {
    /// Path to the worker executable.
    pub binary: PathBuf,
    /// Opaque argument string, passed verbatim as a single argv entry.
    /// `None` passes no arguments.
    pub args: Option<String>,
    /// Working directory for the worker (`None` = inherit the supervisor's).
    pub working_dir: Option<PathBuf>,
    /// Addresses to provision and hand to the worker, in order.
    pub listen_addrs: Vec<String>,
    /// Optional PID file recording the supervisor's own PID.
    pub pid_file: Option<PathBuf>,
    /// Minimum spacing between consecutive crash-triggered restarts.
    pub crash_backoff_floor: Duration,
    /// Delay between failed launch attempts during reload and crash recovery.
    pub launch_retry_interval: Duration,
    /// How often the graceful-stop protocol re-sends SIGTERM.
    pub stop_resignal_interval: Duration,
}

impl Config {
    /// Creates a configuration for the given worker binary with defaults:
    /// - no arguments, inherited working directory, empty listen set, no PID file
    /// - `crash_backoff_floor = 5s`
    /// - `launch_retry_interval = 5s`
    /// - `stop_resignal_interval = 1s`
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            args: None,
            working_dir: None,
            listen_addrs: Vec::new(),
            pid_file: None,
            crash_backoff_floor: Duration::from_secs(5),
            launch_retry_interval: Duration::from_secs(5),
            stop_resignal_interval: Duration::from_secs(1),
        }
    }
}
