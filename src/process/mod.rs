//! Worker process primitives.
//!
//! - [`child`]: identity and supervisor-side handle for one spawned worker;
//! - [`launcher`]: provision sockets, spawn the worker, arrange exit
//!   notification.

mod child;
mod launcher;

pub use child::{ChildHandle, ChildId, ExitNotice};
pub use launcher::Launcher;
