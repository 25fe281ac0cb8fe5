//! Outbound delivery targets.

use std::any::Any;

use tokio::sync::mpsc;

use crate::SinkError;

/// Somewhere encoded messages can be pushed without waiting.
///
/// `deliver` must never block: the hub calls it while fanning out to
/// every subscriber of a session, and one slow connection must not stall
/// the others. A sink that cannot take the payload right now returns an
/// error and is dropped from the hub.
pub trait Sink: Send + Sync + 'static {
    fn deliver(&self, payload: Vec<u8>) -> Result<(), SinkError>;

    /// Whether `other` feeds the same destination as `self`.
    ///
    /// The hub asks this to recognize a sink that is subscribed again.
    /// By default every sink is distinct.
    fn same_sink(&self, other: &dyn Any) -> bool {
        let _ = other;
        false
    }
}

impl Sink for mpsc::Sender<Vec<u8>> {
    fn deliver(&self, payload: Vec<u8>) -> Result<(), SinkError> {
        self.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    fn same_sink(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.same_channel(self))
    }
}

impl Sink for mpsc::UnboundedSender<Vec<u8>> {
    fn deliver(&self, payload: Vec<u8>) -> Result<(), SinkError> {
        self.send(payload).map_err(|_| SinkError::Closed)
    }

    fn same_sink(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.same_channel(self))
    }
}
