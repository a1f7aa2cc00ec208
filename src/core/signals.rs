//! # OS signal boundary.
//!
//! Translates raw Unix signals into the typed [`Event`] enumeration the
//! supervisor loop consumes. Nothing past this module depends on signal
//! semantics.
//!
//! ## Signals
//! - `SIGHUP` → [`Event::Reload`] (hot-swap the worker)
//! - `SIGINT` / `SIGTERM` / `SIGQUIT` / Ctrl-C → [`Event::Stop`]
//!
//! Signal streams are created once, up front, and live for the whole task:
//! a signal arriving while the supervisor is busy inside a reload is queued
//! by the stream and picked up on the next loop iteration, never lost.

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use crate::error::RuntimeError;
use crate::events::Event;

/// Registers signal listeners and spawns the forwarding task.
///
/// The task forwards [`Event::Reload`] for every SIGHUP and ends after
/// forwarding one [`Event::Stop`] (stop is terminal for the loop as well).
/// It also ends if the receiving side is gone.
///
/// Returns an error only if a listener cannot be registered.
pub fn spawn_signal_listener(tx: mpsc::UnboundedSender<Event>) -> Result<(), RuntimeError> {
    let register = |kind| signal(kind).map_err(|source| RuntimeError::Signals { source });
    let mut hangup = register(SignalKind::hangup())?;
    let mut interrupt = register(SignalKind::interrupt())?;
    let mut terminate = register(SignalKind::terminate())?;
    let mut quit = register(SignalKind::quit())?;

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = hangup.recv() => Event::Reload,
                _ = interrupt.recv() => Event::Stop,
                _ = terminate.recv() => Event::Stop,
                _ = quit.recv() => Event::Stop,
                _ = tokio::signal::ctrl_c() => Event::Stop,
            };
            let stop = matches!(event, Event::Stop);
            if tx.send(event).is_err() || stop {
                break;
            }
        }
    });
    Ok(())
}
