//! Error types used by the molt supervisor.
//!
//! Three enums, one per failure boundary:
//!
//! - [`ProvisionError`] — an address could not be turned into a listening socket.
//! - [`LaunchError`] — a worker launch failed (provisioning or spawn).
//! - [`RuntimeError`] — the supervisor itself could not come up.
//!
//! Once the supervisor is running, launch failures are never surfaced to a
//! caller: they are logged and retried indefinitely. Only startup failures
//! propagate out as [`RuntimeError`].

use std::io;

use thiserror::Error;

/// Errors from the socket provisioner.
///
/// Each variant names the address that failed, so a retry log line can point
/// at the offending entry in the listen set.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Address string did not resolve to any socket address.
    #[error("resolve {addr}: {source}")]
    Resolve {
        /// The configured address string.
        addr: String,
        /// The underlying resolution error.
        #[source]
        source: io::Error,
    },

    /// Socket creation, bind, or listen failed for an address.
    #[error("bind {addr}: {source}")]
    Bind {
        /// The configured address string.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: io::Error,
    },

    /// A cached listening socket could not be duplicated for a new launch.
    #[error("duplicate listener for {addr}: {source}")]
    Dup {
        /// The configured address string.
        addr: String,
        /// The underlying duplication error.
        #[source]
        source: io::Error,
    },
}

/// Errors from a single worker launch attempt.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The listen set could not be provisioned; nothing was spawned.
    #[error("provision listeners: {0}")]
    Provision(#[from] ProvisionError),

    /// The worker binary could not be started.
    #[error("spawn worker: {source}")]
    Spawn {
        /// The underlying spawn error.
        #[source]
        source: io::Error,
    },
}

/// Errors that terminate the supervisor before its loop starts.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The initial worker launch failed. Fatal: the loop is never entered.
    #[error("initial launch failed: {0}")]
    Startup(#[from] LaunchError),

    /// OS signal listeners could not be registered.
    #[error("signal registration failed: {source}")]
    Signals {
        /// The underlying registration error.
        #[source]
        source: io::Error,
    },
}
