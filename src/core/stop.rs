//! # Graceful stop protocol.
//!
//! Drives one worker to termination by re-asserting intent on a fixed
//! cadence:
//!
//! ```text
//! loop {
//!   SIGTERM ──► wait up to resignal_every on the child's exit token
//!                 ├─ exited  → done
//!                 └─ timeout → re-signal
//! }
//! ```
//!
//! A single SIGTERM can be dropped or arrive while the worker is not yet
//! ready to honor it, so the protocol repeats rather than trusting one
//! delivery. Completion is decided solely by the child's own exit token —
//! notifications for unrelated children can neither satisfy nor stall this
//! wait. There is no force-kill escalation: the supervisor's contract with
//! the worker is polite termination only.

use std::time::Duration;

use tokio::time;
use tracing::{debug, info};

use crate::process::ChildHandle;

/// Blocks until `child` has terminated, re-sending SIGTERM every
/// `resignal_every` until its exit is observed.
///
/// Returns immediately (after one redundant signal) when the exit was
/// already observed before the call.
pub(crate) async fn stop_child(child: &ChildHandle, resignal_every: Duration) {
    loop {
        child.terminate();
        if time::timeout(resignal_every, child.exited()).await.is_ok() {
            info!(id = %child.id(), pid = child.pid(), "worker exited");
            return;
        }
        debug!(id = %child.id(), pid = child.pid(), "worker still up, re-signaling");
    }
}
