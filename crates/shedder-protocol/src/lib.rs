//! Wire vocabulary for Shedder.
//!
//! - **Identity** ([`SessionId`], [`PlayerId`])
//! - **Types** ([`Action`], [`SessionView`], [`SessionState`],
//!   [`ClientMessage`], [`ServerMessage`], [`ErrorKind`])
//! - **Codec** ([`Codec`], [`JsonCodec`]) and [`ProtocolError`]
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Registry → Engine
//! ```

mod codec;
mod error;
mod ids;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use ids::{PlayerId, SessionId};
pub use types::{
    Action, ActionKind, ClientMessage, Direction, ErrorKind, PlayerView,
    ServerMessage, SessionState, SessionView,
};
