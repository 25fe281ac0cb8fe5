//! # Shedder
//!
//! Concurrent multiplayer session server for shedding-type card games
//! (Uno rules).
//!
//! Each game lives in a session owned by its own runner task; players
//! talk to it over WebSocket with JSON messages, and every change is
//! pushed back as a snapshot tailored to the viewer.
//!
//! ```text
//! WebSocket ─▶ handler ─▶ SessionRegistry ─▶ runner ─▶ Session (engine)
//!     ▲                                         │
//!     └──────────────── SessionHub ◀────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shedder::prelude::*;
//!
//! # async fn run() -> Result<(), ShedderError> {
//! let server = ShedderServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ShedderError;
pub use server::{ShedderServer, ShedderServerBuilder};

pub use shedder_cards as cards;
pub use shedder_engine as engine;
pub use shedder_hub as hub;
pub use shedder_protocol as protocol;
pub use shedder_registry as registry;

/// Everything needed to run a server or drive sessions in-process.
pub mod prelude {
    pub use crate::{ShedderError, ShedderServer, ShedderServerBuilder};
    pub use shedder_cards::{Card, Color, Deck, DeckComposition, Value};
    pub use shedder_engine::{Applied, EngineConfig, EngineError, Outcome, Session};
    pub use shedder_hub::{Audience, SessionHub, Sink, SubscriberId};
    pub use shedder_protocol::{
        Action, ActionKind, ClientMessage, Codec, Direction, ErrorKind, JsonCodec,
        PlayerId, PlayerView, ServerMessage, SessionId, SessionState, SessionView,
    };
    pub use shedder_registry::{RegistryConfig, RegistryError, SessionRegistry};
}
