//! # molt
//!
//! **molt** is a zero-downtime process supervisor: it launches and monitors
//! a single long-running worker process, restarts it on unexpected exit
//! (with a crash-backoff floor), and hot-reloads it without dropping
//! connections by handing the replacement worker the existing listening
//! sockets before the old worker is retired.
//!
//! ## Architecture
//! ```text
//!   SIGHUP ────► Reload ──┐
//!   SIGINT/TERM ► Stop ───┼──► Supervisor event loop (single owner of
//!   waiter task ► Exited ─┘        "current worker" state)
//!                                   │
//!          ┌────────────────────────┼───────────────────────┐
//!          ▼                        ▼                       ▼
//!   Launcher                 Graceful stop            CrashBackoff
//!   (provision sockets,      (SIGTERM every 1s        (≥5s between
//!    spawn, watch exit)       until confirmed exit)    crash restarts)
//! ```
//!
//! ## Reload sequence
//! 1. Launch a replacement worker; it inherits duplicates of the same
//!    cached listening sockets at fds 3.. (retried every 5s until it comes
//!    up — the old worker keeps serving meanwhile).
//! 2. The replacement becomes "current" immediately.
//! 3. The old worker is driven through the graceful-stop protocol.
//!
//! At no point is the listen set unserved; during step 3 both workers are
//! briefly alive.
//!
//! ## Concurrency model
//! One control task (the event loop) plus one waiter task per spawned
//! worker. Waiters never mutate shared state; they trip the child's exit
//! token and post one [`ExitNotice`]. All state transitions happen on the
//! loop, which processes one event to completion at a time — reload and
//! crash recovery are atomic supervisory transactions.

mod config;
mod core;
mod error;
mod events;
mod policies;
mod process;

pub mod pidfile;
pub mod sockets;

pub use config::Config;
pub use core::{spawn_signal_listener, State, Supervisor};
pub use error::{LaunchError, ProvisionError, RuntimeError};
pub use events::Event;
pub use policies::CrashBackoff;
pub use process::{ChildHandle, ChildId, ExitNotice, Launcher};
