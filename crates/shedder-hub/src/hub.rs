//! The per-session subscriber set.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use shedder_protocol::{PlayerId, SessionId};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{HubError, Sink};

/// Handle for one subscription, unique within its hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Who is on the other end of a subscription.
///
/// Decides which view of the session a subscriber receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Audience {
    /// A seated player; sees their own hand.
    Player(PlayerId),
    /// An observer; sees card counts only.
    Spectator,
}

impl Audience {
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            Self::Player(id) => Some(id),
            Self::Spectator => None,
        }
    }
}

struct Subscriber {
    audience: Audience,
    sink: Box<dyn Sink>,
}

#[derive(Default)]
struct HubInner {
    subscribers: HashMap<SubscriberId, Subscriber>,
    closed: bool,
}

/// Fans encoded messages out to every subscriber of one session.
///
/// Delivery is best-effort. A subscriber whose sink fails (closed or
/// full) is removed on the spot and the broadcast continues with the
/// rest. Once [`close`](Self::close)d, the hub drops every sink and
/// refuses new subscribers.
pub struct SessionHub {
    session_id: SessionId,
    inner: Mutex<HubInner>,
    next_id: AtomicU64,
}

impl SessionHub {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            inner: Mutex::new(HubInner::default()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Registers `sink` and returns its subscription handle.
    ///
    /// Subscribing a sink that is already registered (per
    /// [`Sink::same_sink`]) keeps its existing handle, so it still gets
    /// one copy of each broadcast. Its audience becomes `audience`.
    pub async fn subscribe<S: Sink>(
        &self,
        audience: Audience,
        sink: S,
    ) -> Result<SubscriberId, HubError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(HubError::Closed);
        }

        let existing = inner
            .subscribers
            .iter_mut()
            .find(|(_, subscriber)| subscriber.sink.same_sink(&sink));
        if let Some((id, subscriber)) = existing {
            debug!(session_id = %self.session_id, subscriber = %id, ?audience, "already subscribed");
            subscriber.audience = audience;
            return Ok(*id);
        }

        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(session_id = %self.session_id, subscriber = %id, ?audience, "subscribed");
        inner.subscribers.insert(
            id,
            Subscriber {
                audience,
                sink: Box::new(sink),
            },
        );
        Ok(id)
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.inner.lock().await.subscribers.remove(&id).is_some();
        if removed {
            debug!(session_id = %self.session_id, subscriber = %id, "unsubscribed");
        }
        removed
    }

    /// Delivers one payload to a single subscriber.
    ///
    /// A failing sink is removed, as in a broadcast.
    pub async fn send_to(&self, id: SubscriberId, payload: Vec<u8>) -> Result<(), HubError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(HubError::Closed);
        }
        let subscriber = inner
            .subscribers
            .get(&id)
            .ok_or(HubError::UnknownSubscriber(id))?;
        if let Err(e) = subscriber.sink.deliver(payload) {
            inner.subscribers.remove(&id);
            warn!(session_id = %self.session_id, subscriber = %id, error = %e, "dropping subscriber");
            return Err(HubError::Delivery(id, e));
        }
        Ok(())
    }

    /// Delivers the same payload to every subscriber.
    ///
    /// Returns how many subscribers accepted it.
    pub async fn broadcast(&self, payload: &[u8]) -> usize {
        match self
            .broadcast_with(|_| Ok::<_, Infallible>(payload.to_vec()))
            .await
        {
            Ok(delivered) => delivered,
            Err(never) => match never {},
        }
    }

    /// Renders a payload per audience and delivers it.
    ///
    /// `render` is called at most once per distinct [`Audience`]. If it
    /// fails, nothing more is sent and the error is returned.
    pub async fn broadcast_with<F, E>(&self, mut render: F) -> Result<usize, E>
    where
        F: FnMut(&Audience) -> Result<Vec<u8>, E>,
    {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Ok(0);
        }

        let mut rendered: HashMap<Audience, Vec<u8>> = HashMap::new();
        let mut failed = Vec::new();
        let mut delivered = 0;

        for (id, subscriber) in &inner.subscribers {
            let payload = match rendered.get(&subscriber.audience) {
                Some(payload) => payload.clone(),
                None => {
                    let payload = render(&subscriber.audience)?;
                    rendered.insert(subscriber.audience.clone(), payload.clone());
                    payload
                }
            };
            match subscriber.sink.deliver(payload) {
                Ok(()) => delivered += 1,
                Err(e) => failed.push((*id, e)),
            }
        }

        for (id, error) in failed {
            inner.subscribers.remove(&id);
            warn!(session_id = %self.session_id, subscriber = %id, %error, "dropping subscriber");
        }
        Ok(delivered)
    }

    /// Drops every subscriber and refuses further subscriptions.
    ///
    /// Dropping a channel sink closes it, so receivers observe the end of
    /// the stream.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return;
        }
        inner.closed = true;
        let count = inner.subscribers.len();
        inner.subscribers.clear();
        debug!(session_id = %self.session_id, subscribers = count, "hub closed");
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    /// Current number of subscribers.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.subscribers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl fmt::Debug for SessionHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHub")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
