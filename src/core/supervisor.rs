//! # Supervisor: the event loop that owns the current worker.
//!
//! One [`Supervisor`] value owns all mutable supervision state (current
//! child, crash clock, state tag) and mutates it only from its own loop;
//! no locks, no setters. Waiter tasks communicate purely by message.
//!
//! ## Event flow
//! ```text
//! control channel (Reload/Stop, fed by core::signals) ──┐
//!                                                       ├──► select ──► handler
//! exit channel (ExitNotice, fed by waiter tasks) ───────┘
//! ```
//!
//! ## State machine
//! ```text
//!            Reload                        Stop
//! Steady ──────────────► Reloading   Steady ─────► Stopping ─► loop exits
//!    ▲                       │
//!    └───────────────────────┘  (new child current, old child stopped)
//!
//! ChildExited(current)  → crash recovery inside Steady (backoff, relaunch)
//! ChildExited(retired)  → discarded
//! ```
//!
//! ## Rules
//! - Handlers run to completion before the next event is read: a stop
//!   arriving mid-reload is honored right after the reload finishes.
//! - During a reload, old and new worker briefly coexist; the old one is
//!   only signaled after the new one is current, so the listen set never
//!   goes dark.
//! - Post-startup launch failures are logged and retried forever; only an
//!   explicit stop ends the loop.

use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::stop::stop_child;
use crate::error::RuntimeError;
use crate::events::Event;
use crate::policies::CrashBackoff;
use crate::process::{ChildHandle, ExitNotice, Launcher};

/// Behavioral state of the supervision loop.
///
/// Transitions happen only inside event handlers; the tag is what the loop
/// is *doing*, not a lock — handlers already serialize all work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// One live worker; waiting for the next event.
    Steady,
    /// Launching a replacement worker and retiring the old one.
    Reloading,
    /// Stopping the current worker; terminal.
    Stopping,
}

/// Owns the current worker and reacts to reload, stop, and exit events.
#[derive(Debug)]
pub struct Supervisor {
    cfg: Config,
    launcher: Launcher,
    control_rx: mpsc::UnboundedReceiver<Event>,
    exit_rx: mpsc::UnboundedReceiver<ExitNotice>,
    current: ChildHandle,
    backoff: CrashBackoff,
    state: State,
}

impl Supervisor {
    /// Builds the supervisor and performs the initial launch.
    ///
    /// A failed initial launch is fatal: the error is returned and the loop
    /// is never entered. Must be called from within a tokio runtime.
    pub fn start(
        cfg: Config,
        control_rx: mpsc::UnboundedReceiver<Event>,
    ) -> Result<Self, RuntimeError> {
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();
        let launcher = Launcher::new(&cfg, exit_tx);
        let current = launcher.launch()?;
        let backoff = CrashBackoff::new(cfg.crash_backoff_floor);
        Ok(Self {
            cfg,
            launcher,
            control_rx,
            exit_rx,
            current,
            backoff,
            state: State::Steady,
        })
    }

    /// Current behavioral state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The worker currently considered live.
    pub fn current(&self) -> &ChildHandle {
        &self.current
    }

    /// Runs the event loop until a stop request has been fully honored.
    pub async fn run(mut self) {
        loop {
            let event = tokio::select! {
                Some(ev) = self.control_rx.recv() => ev,
                Some(notice) = self.exit_rx.recv() => Event::ChildExited(notice),
                else => break,
            };
            match event {
                Event::Reload => self.handle_reload().await,
                Event::Stop => {
                    self.handle_stop().await;
                    break;
                }
                Event::ChildExited(notice) => self.handle_child_exit(notice).await,
            }
        }
    }

    /// Entry: reload requested. Exit: replacement worker is current and the
    /// old one has confirmed termination.
    ///
    /// Launch retries are unconditional and paced at
    /// [`Config::launch_retry_interval`]; the old worker keeps serving the
    /// whole time, so a broken deploy degrades to log noise, not downtime.
    async fn handle_reload(&mut self) {
        self.state = State::Reloading;
        info!("reload requested");

        let old = loop {
            match self.launcher.launch() {
                Ok(replacement) => {
                    let old = std::mem::replace(&mut self.current, replacement);
                    info!(old = %old.id(), new = %self.current.id(), "replacement worker is current");
                    break old;
                }
                Err(e) => {
                    warn!(error = %e, "reload launch failed, retrying");
                    time::sleep(self.cfg.launch_retry_interval).await;
                }
            }
        };

        stop_child(&old, self.cfg.stop_resignal_interval).await;
        // the old child's shared-channel notice is drained later by the
        // mismatch branch of handle_child_exit
        self.state = State::Steady;
    }

    /// Entry: stop requested. Exit: worker confirmed terminated; the caller
    /// breaks out of the loop and no further child is ever launched.
    async fn handle_stop(&mut self) {
        self.state = State::Stopping;
        info!(id = %self.current.id(), "stop requested");
        stop_child(&self.current, self.cfg.stop_resignal_interval).await;
        info!("supervisor stopping");
    }

    /// Reacts to an exit notice from a waiter task.
    ///
    /// Only an exit of the *current* worker is a crash; notices for retired
    /// children (stopped during an earlier reload) are discarded. Crash
    /// recovery enforces the backoff floor, then relaunches until success.
    async fn handle_child_exit(&mut self, notice: ExitNotice) {
        if notice.id != self.current.id() {
            debug!(id = %notice.id, "exit notice for retired worker, ignoring");
            return;
        }

        match notice.status {
            Some(status) => warn!(id = %notice.id, pid = notice.pid, %status, "worker exited unexpectedly"),
            None => warn!(id = %notice.id, pid = notice.pid, "worker exited unexpectedly (status unknown)"),
        }

        let waited = self.backoff.enforce().await;
        if !waited.is_zero() {
            debug!(?waited, "crash backoff enforced");
        }

        loop {
            match self.launcher.launch() {
                Ok(child) => {
                    info!(id = %child.id(), pid = child.pid(), "worker restarted");
                    self.current = child;
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "restart launch failed, retrying");
                    time::sleep(self.cfg.launch_retry_interval).await;
                }
            }
        }
    }
}
