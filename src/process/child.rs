//! # Child identity and the supervisor-side handle.
//!
//! The OS child handle itself is owned by the waiter task spawned at launch;
//! the supervisor only ever holds a [`ChildHandle`]. Exit is observable two
//! ways, and both fire exactly once per child:
//!
//! ```text
//! waiter task ──► ChildHandle.exited (per-child token)  ──► graceful stop waits here
//!            └──► ExitNotice on the shared exit channel ──► supervisor loop reads here
//! ```
//!
//! The per-child token exists so the graceful-stop protocol never has to
//! read (and possibly discard) another child's notification off the shared
//! channel.

use std::process::ExitStatus;
use std::sync::atomic::{AtomicU64, Ordering};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Global sequence counter for child identity.
static CHILD_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identity of one spawned worker instance.
///
/// Monotonic and never reused within a supervisor process, unlike a PID.
/// Exit notices carry it so consumers can compare against the child they
/// expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildId(u64);

impl ChildId {
    /// Allocates the next identity.
    pub(crate) fn next() -> Self {
        Self(CHILD_SEQ.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ChildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Posted on the shared exit channel when a worker exits, once per child.
#[derive(Debug)]
pub struct ExitNotice {
    /// Which worker exited.
    pub id: ChildId,
    /// Its OS process id.
    pub pid: u32,
    /// Exit status, when the wait call itself succeeded.
    pub status: Option<ExitStatus>,
}

/// Supervisor-side view of one live (or retiring) worker.
///
/// Cheap to clone; all clones observe the same exit token.
#[derive(Debug, Clone)]
pub struct ChildHandle {
    id: ChildId,
    pid: u32,
    exited: CancellationToken,
}

impl ChildHandle {
    pub(crate) fn new(id: ChildId, pid: u32, exited: CancellationToken) -> Self {
        Self { id, pid, exited }
    }

    /// The worker's identity.
    pub fn id(&self) -> ChildId {
        self.id
    }

    /// The worker's OS process id.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Completes once the worker has exited. Idempotent.
    pub async fn exited(&self) {
        self.exited.cancelled().await;
    }

    /// Whether the exit has already been observed.
    pub fn has_exited(&self) -> bool {
        self.exited.is_cancelled()
    }

    /// Sends a polite termination signal (SIGTERM).
    ///
    /// Delivery failure (typically ESRCH: already gone) is logged and
    /// swallowed; the stop protocol re-signals on its own cadence and
    /// completion is decided by the exit token, not by delivery.
    pub fn terminate(&self) {
        if self.pid == 0 {
            return;
        }
        if let Err(e) = kill(Pid::from_raw(self.pid as i32), Signal::SIGTERM) {
            debug!(id = %self.id, pid = self.pid, error = %e, "SIGTERM delivery failed");
        }
    }
}
