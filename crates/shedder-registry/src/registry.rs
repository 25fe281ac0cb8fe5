//! The session registry: creates, tracks, and routes to sessions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use shedder_engine::{Applied, EngineError, Session};
use shedder_hub::{Audience, SessionHub, Sink, SubscriberId};
use shedder_protocol::{Action, Codec, JsonCodec, PlayerId, SessionId, SessionState};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tracing::{debug, info};

use crate::runner::{
    ReplySender, RunnerHandle, Submission, broadcast_snapshot, render_snapshot, spawn_runner,
};
use crate::{RegistryConfig, RegistryError};

/// Where a registered session is in its life.
enum Phase {
    /// Not started: the registry edits the session directly.
    Pending(Session),
    /// Owned by a runner task; the registry only sees snapshots.
    Running(RunnerHandle),
}

/// Everything the registry keeps for one session.
struct SessionSlot {
    phase: Mutex<Phase>,
    hub: Arc<SessionHub>,
}

impl SessionSlot {
    async fn snapshot(&self) -> Arc<Session> {
        match &*self.phase.lock().await {
            Phase::Pending(session) => Arc::new(session.clone()),
            Phase::Running(handle) => Arc::clone(&handle.snapshot.borrow()),
        }
    }
}

pub(crate) struct RegistryInner<C> {
    sessions: RwLock<HashMap<SessionId, Arc<SessionSlot>>>,
    config: RegistryConfig,
    codec: Arc<C>,
}

impl<C> RegistryInner<C> {
    /// Removes `id` only if its slot still owns `hub`.
    ///
    /// A runner calls this on exit; the check keeps it from deleting a
    /// newer session that reused the id after an explicit `remove`.
    pub(crate) async fn remove_if_current(&self, id: &SessionId, hub: &Arc<SessionHub>) {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(id)
            .is_some_and(|slot| Arc::ptr_eq(&slot.hub, hub))
        {
            sessions.remove(id);
            info!(session_id = %id, "session removed");
        }
    }
}

/// Concurrent map of live sessions.
///
/// Constructed explicitly and passed to whoever needs it; clones share
/// the same sessions. The map lock is held only to look up, insert, or
/// delete a slot. Work on a session goes through that slot's own lock
/// (while pending) or its runner's queue (once started).
///
/// ```text
/// create ──▶ Pending ──start──▶ Running ──exit──▶ (removed)
///               │                  │
///               └──stop/remove─────┴──stop/remove──▶ Cancelled
/// ```
pub struct SessionRegistry<C: Codec = JsonCodec> {
    inner: Arc<RegistryInner<C>>,
}

impl<C: Codec> Clone for SessionRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Codec> fmt::Debug for SessionRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry<JsonCodec> {
    /// Creates an empty registry that encodes snapshots as JSON.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_codec(config, JsonCodec)
    }
}

impl Default for SessionRegistry<JsonCodec> {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl<C: Codec> SessionRegistry<C> {
    pub fn with_codec(config: RegistryConfig, codec: C) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: RwLock::new(HashMap::new()),
                config,
                codec: Arc::new(codec),
            }),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    pub fn codec(&self) -> &C {
        &self.inner.codec
    }

    // -----------------------------------------------------------------------
    // Map operations
    // -----------------------------------------------------------------------

    /// Registers `session` under its id.
    ///
    /// The check and the insert happen under one write lock, so of many
    /// concurrent creates with the same id exactly one succeeds. A session
    /// that is already `InProgress` gets its runner right away.
    pub async fn create(&self, session: Session) -> Result<(), RegistryError> {
        let id = session.id().clone();
        let state = session.state();
        if state.is_terminal() {
            return Err(EngineError::SessionTerminated(state).into());
        }

        let mut sessions = self.inner.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(RegistryError::AlreadyExists(id));
        }

        let hub = Arc::new(SessionHub::new(id.clone()));
        let phase = if state == SessionState::InProgress {
            Phase::Running(self.launch(session, &hub))
        } else {
            Phase::Pending(session)
        };
        sessions.insert(
            id.clone(),
            Arc::new(SessionSlot {
                phase: Mutex::new(phase),
                hub,
            }),
        );
        info!(session_id = %id, %state, "session created");
        Ok(())
    }

    /// The current state of a session.
    ///
    /// For a running session this is the snapshot published after its
    /// most recent action; it is never mutated afterwards.
    pub async fn get(&self, id: &SessionId) -> Result<Arc<Session>, RegistryError> {
        Ok(self.slot(id).await?.snapshot().await)
    }

    /// Removes a session. Returns `false` if it was not registered.
    ///
    /// A running session's action queue is closed, so its runner cancels
    /// it and shuts down; a pending session is cancelled here. Either way
    /// every subscriber is dropped.
    pub async fn remove(&self, id: &SessionId) -> bool {
        let Some(slot) = self.inner.sessions.write().await.remove(id) else {
            return false;
        };
        self.wind_down(&slot).await;
        info!(session_id = %id, "session removed");
        true
    }

    /// Stops a session without waiting for it to finish.
    ///
    /// The session ends `Cancelled` (unless it already completed) and is
    /// removed once its runner has drained the queue.
    pub async fn stop(&self, id: &SessionId) -> Result<(), RegistryError> {
        let slot = self.slot(id).await?;
        let pending = self.wind_down(&slot).await;
        if pending {
            self.inner.remove_if_current(id, &slot.hub).await;
        }
        info!(session_id = %id, "session stop requested");
        Ok(())
    }

    /// Cancels a pending session or closes a running session's queue.
    ///
    /// Returns `true` for a pending session, whose teardown completes
    /// here rather than in a runner.
    async fn wind_down(&self, slot: &SessionSlot) -> bool {
        let mut phase = slot.phase.lock().await;
        match &mut *phase {
            Phase::Pending(session) => {
                session.cancel();
                broadcast_snapshot(&slot.hub, session, self.inner.codec.as_ref()).await;
                slot.hub.close().await;
                true
            }
            Phase::Running(handle) => {
                handle.sender.take();
                false
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.sessions.read().await.is_empty()
    }

    /// Ids of every registered session, sorted.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.inner.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    /// Creates a session with a fresh id and seats its creator.
    ///
    /// The deck is generated and shuffled per the registry's engine
    /// config. Returns the new session id and the creator's player id.
    pub async fn create_session(
        &self,
        creator_name: impl Into<String>,
    ) -> Result<(SessionId, PlayerId), RegistryError> {
        let session_id = SessionId::generate();
        let player_id = PlayerId::generate();
        let mut session = Session::new(session_id.clone(), self.inner.config.engine.clone())?;
        session.add_player(player_id.clone(), creator_name)?;
        self.create(session).await?;
        Ok((session_id, player_id))
    }

    /// Seats a new player with a generated id.
    pub async fn join(
        &self,
        id: &SessionId,
        name: impl Into<String>,
    ) -> Result<PlayerId, RegistryError> {
        let player_id = PlayerId::generate();
        self.add_player(id, player_id.clone(), name).await?;
        Ok(player_id)
    }

    /// Seats `player_id` in a pending session and deals their hand.
    pub async fn add_player(
        &self,
        id: &SessionId,
        player_id: PlayerId,
        name: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let slot = self.slot(id).await?;
        let mut phase = slot.phase.lock().await;
        match &mut *phase {
            Phase::Pending(session) => {
                session.add_player(player_id, name)?;
                broadcast_snapshot(&slot.hub, session, self.inner.codec.as_ref()).await;
                Ok(())
            }
            Phase::Running(handle) => {
                let snapshot = Arc::clone(&handle.snapshot.borrow());
                if snapshot.contains_player(&player_id) {
                    Err(EngineError::DuplicatePlayer(player_id).into())
                } else {
                    Err(EngineError::SessionAlreadyStarted.into())
                }
            }
        }
    }

    /// Starts a pending session and hands it to a new runner task.
    pub async fn start(&self, id: &SessionId) -> Result<(), RegistryError> {
        let slot = self.slot(id).await?;
        let mut phase = slot.phase.lock().await;
        let session = match &mut *phase {
            Phase::Pending(session) => {
                session.start()?;
                session.clone()
            }
            Phase::Running(handle) => {
                let state = handle.snapshot.borrow().state();
                return Err(if state.is_terminal() {
                    EngineError::SessionTerminated(state)
                } else {
                    EngineError::SessionAlreadyStarted
                }
                .into());
            }
        };
        *phase = Phase::Running(self.launch(session, &slot.hub));
        Ok(())
    }

    fn launch(&self, session: Session, hub: &Arc<SessionHub>) -> RunnerHandle {
        spawn_runner(
            session,
            Arc::clone(hub),
            Arc::clone(&self.inner.codec),
            Arc::downgrade(&self.inner),
            &self.inner.config,
        )
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Queues `action` and waits for the engine's verdict.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ActionTimeout`] if the queue stays full for
    ///   `submit_timeout`.
    /// - [`RegistryError::Engine`] with whatever the engine rejected.
    /// - [`RegistryError::Unavailable`] if the runner stopped first.
    pub async fn submit(&self, id: &SessionId, action: Action) -> Result<Applied, RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.enqueue(id, action, Some(reply_tx)).await?;
        let verdict = reply_rx
            .await
            .map_err(|_| RegistryError::Unavailable(id.clone()))?;
        Ok(verdict?)
    }

    /// Queues `action` without waiting for it to be applied.
    pub async fn send_action(&self, id: &SessionId, action: Action) -> Result<(), RegistryError> {
        self.enqueue(id, action, None).await
    }

    async fn enqueue(
        &self,
        id: &SessionId,
        action: Action,
        reply: Option<ReplySender>,
    ) -> Result<(), RegistryError> {
        let sender = self.sender(id).await?;
        let timeout = self.inner.config.submit_timeout;
        tokio::time::timeout(timeout, sender.send(Submission { action, reply }))
            .await
            .map_err(|_| RegistryError::ActionTimeout(id.clone(), timeout))?
            .map_err(|_| RegistryError::Unavailable(id.clone()))
    }

    /// A clone of the running session's queue sender.
    async fn sender(&self, id: &SessionId) -> Result<mpsc::Sender<Submission>, RegistryError> {
        let slot = self.slot(id).await?;
        let phase = slot.phase.lock().await;
        match &*phase {
            Phase::Pending(_) => Err(EngineError::NotStarted.into()),
            Phase::Running(handle) => handle
                .sender
                .clone()
                .ok_or_else(|| RegistryError::Unavailable(id.clone())),
        }
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Attaches `sink` to a session's broadcasts.
    ///
    /// A [`Audience::Player`] must be seated in the session. The new
    /// subscriber immediately receives the current snapshot; later ones
    /// carry a higher `version`. Subscribing the same sink again keeps
    /// its id and only resends the current snapshot.
    pub async fn subscribe(
        &self,
        id: &SessionId,
        audience: Audience,
        sink: impl Sink,
    ) -> Result<SubscriberId, RegistryError> {
        let slot = self.slot(id).await?;
        if let Audience::Player(player_id) = &audience {
            if !slot.snapshot().await.contains_player(player_id) {
                return Err(RegistryError::PlayerNotFound(id.clone(), player_id.clone()));
            }
        }

        let subscriber = slot.hub.subscribe(audience.clone(), sink).await?;
        let snapshot = slot.snapshot().await;
        let payload = render_snapshot(&snapshot, &audience, self.inner.codec.as_ref())?;
        slot.hub.send_to(subscriber, payload).await?;
        debug!(session_id = %id, %subscriber, "subscriber attached");
        Ok(subscriber)
    }

    /// Detaches a subscriber. Returns `false` if it was already gone.
    pub async fn unsubscribe(&self, id: &SessionId, subscriber: SubscriberId) -> bool {
        match self.slot(id).await {
            Ok(slot) => slot.hub.unsubscribe(subscriber).await,
            Err(_) => false,
        }
    }

    async fn slot(&self, id: &SessionId) -> Result<Arc<SessionSlot>, RegistryError> {
        self.inner
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }
}
