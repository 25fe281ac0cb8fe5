//! Error types for the broadcast hub.

use shedder_protocol::ErrorKind;

use crate::SubscriberId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// The hub was closed because its session ended.
    #[error("hub is closed")]
    Closed,

    #[error("unknown subscriber {0}")]
    UnknownSubscriber(SubscriberId),

    /// The subscriber's sink refused the payload and was dropped.
    #[error("delivery to subscriber {0} failed: {1}")]
    Delivery(SubscriberId, SinkError),
}

impl HubError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Closed => ErrorKind::SessionTerminated,
            Self::UnknownSubscriber(_) => ErrorKind::NotFound,
            Self::Delivery(_, SinkError::Full) => ErrorKind::Backpressure,
            Self::Delivery(_, SinkError::Closed) => ErrorKind::NotFound,
        }
    }
}

/// Why a [`Sink`](crate::Sink) refused a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// A bounded buffer is at capacity.
    #[error("buffer full")]
    Full,
    /// The receiving side has gone away.
    #[error("receiver closed")]
    Closed,
}
