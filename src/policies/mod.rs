//! Restart pacing policies.
//!
//! One policy lives here: [`CrashBackoff`], the minimum spacing between
//! consecutive crash-triggered restarts. Reload retries and the stop
//! re-signal cadence are plain fixed intervals owned by the supervisor
//! core; only crash recovery carries clock state across events.

mod backoff;

pub use backoff::CrashBackoff;
