//! Session registry for Shedder.
//!
//! [`SessionRegistry`] maps session ids to sessions. Pending sessions are
//! edited in place; once started, each session is handed to its own
//! runner task, which applies actions one at a time and publishes
//! snapshots through the session's [`SessionHub`](shedder_hub::SessionHub).
//!
//! ```text
//! submit(id, action) ──▶ registry ──▶ runner queue ──▶ Session::apply
//!                                                  └──▶ hub broadcast
//! ```

mod config;
mod error;
mod registry;
mod runner;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use registry::SessionRegistry;
