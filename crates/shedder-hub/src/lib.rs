//! Broadcast hub for Shedder sessions.
//!
//! Each session owns one [`SessionHub`]. Connections register a [`Sink`]
//! (usually the sending half of their outbound channel) together with an
//! [`Audience`], and the session's runner pushes encoded snapshots through
//! [`SessionHub::broadcast_with`] after every change.

mod error;
mod hub;
mod sink;

pub use error::{HubError, SinkError};
pub use hub::{Audience, SessionHub, SubscriberId};
pub use sink::Sink;
