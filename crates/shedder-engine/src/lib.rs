//! Turn engine for Shedder sessions.
//!
//! A [`Session`] owns every piece of game state: players and their hands,
//! the draw and discard piles, turn order and lifecycle. It is a plain
//! synchronous value; concurrency lives one layer up, where each session
//! is owned by exactly one runner task.
//!
//! ```text
//! WaitingForPlayers ──start──▶ InProgress ──win──▶ Completed
//!         │                        │
//!         └────────cancel──────────┴──────▶ Cancelled
//! ```

mod audit;
mod config;
mod error;
pub mod rules;
mod session;
mod turn;

pub use audit::{AuditEntry, AuditLog};
pub use config::EngineConfig;
pub use error::EngineError;
pub use rules::{Effect, is_playable};
pub use session::{Player, Session};
pub use turn::{Applied, Outcome};
