//! Supervision core: the event loop and its two blocking sub-protocols.
//!
//! Internal modules:
//! - [`supervisor`]: the select loop that owns "current worker" state;
//! - [`stop`]: graceful-stop protocol (SIGTERM on a fixed cadence);
//! - [`signals`]: OS signal → [`Event`](crate::Event) translation boundary.

mod signals;
mod stop;
mod supervisor;

pub use signals::spawn_signal_listener;
pub use supervisor::{State, Supervisor};
