//! # Control events consumed by the supervisor loop.
//!
//! The loop reacts to exactly three things, modeled as one enumeration:
//!
//! ```text
//! SIGHUP ──────────────► Event::Reload ──┐
//! SIGINT/TERM/QUIT ────► Event::Stop ────┼──► Supervisor::run select loop
//! waiter task ─────────► ChildExited ────┘
//! ```
//!
//! OS signals are translated into [`Event`] at the boundary
//! (`core::signals`); nothing inside the loop depends on raw signal
//! semantics, and tests drive the loop through the same channel.

use crate::process::ExitNotice;

/// One input to the supervisor's event loop.
#[derive(Debug)]
pub enum Event {
    /// Hot-swap the worker: launch a replacement that inherits the listen
    /// set, then retire the old instance.
    Reload,
    /// Gracefully stop the current worker and exit the loop permanently.
    Stop,
    /// A spawned worker exited (for any reason, including being signaled).
    ChildExited(ExitNotice),
}
