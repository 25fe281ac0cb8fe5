//! Session runner: the single writer for one started session.
//!
//! Each `InProgress` session is owned by a runner task that receives
//! [`Submission`]s through a bounded channel, applies them one at a time,
//! and publishes an immutable snapshot after every change. Nothing else
//! mutates the session, so the engine never needs a lock.

use std::sync::{Arc, Weak};
use std::time::Duration;

use shedder_engine::{Applied, EngineError, Session};
use shedder_hub::{Audience, SessionHub};
use shedder_protocol::{Action, Codec, ProtocolError, ServerMessage, SessionState};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::RegistryConfig;
use crate::registry::RegistryInner;

/// Where the runner sends the verdict for one action.
pub(crate) type ReplySender = oneshot::Sender<Result<Applied, EngineError>>;

/// One queued action. `reply` is `None` for fire-and-forget submissions.
pub(crate) struct Submission {
    pub(crate) action: Action,
    pub(crate) reply: Option<ReplySender>,
}

/// The registry's side of a running session.
pub(crate) struct RunnerHandle {
    /// Dropping the last sender is the runner's stop signal.
    pub(crate) sender: Option<mpsc::Sender<Submission>>,
    pub(crate) snapshot: watch::Receiver<Arc<Session>>,
}

struct SessionRunner<C: Codec> {
    session: Session,
    receiver: mpsc::Receiver<Submission>,
    snapshot: watch::Sender<Arc<Session>>,
    hub: Arc<SessionHub>,
    codec: Arc<C>,
    registry: Weak<RegistryInner<C>>,
    idle_tick: Duration,
    idle_timeout: Option<Duration>,
    last_activity: Instant,
    /// Version and state of the last snapshot sent out.
    published: Option<(u64, SessionState)>,
}

/// Spawns the runner task for a started session.
pub(crate) fn spawn_runner<C: Codec>(
    session: Session,
    hub: Arc<SessionHub>,
    codec: Arc<C>,
    registry: Weak<RegistryInner<C>>,
    config: &RegistryConfig,
) -> RunnerHandle {
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(session.clone()));

    let runner = SessionRunner {
        session,
        receiver: rx,
        snapshot: snapshot_tx,
        hub,
        codec,
        registry,
        idle_tick: config.idle_tick.max(Duration::from_millis(1)),
        idle_timeout: config.idle_timeout,
        last_activity: Instant::now(),
        published: None,
    };

    tokio::spawn(runner.run());

    RunnerHandle {
        sender: Some(tx),
        snapshot: snapshot_rx,
    }
}

impl<C: Codec> SessionRunner<C> {
    /// Runs until the action source closes or the session ends.
    async fn run(mut self) {
        let session_id = self.session.id().clone();
        info!(%session_id, "session runner started");
        self.publish().await;

        let mut idle = time::interval(self.idle_tick);
        idle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        idle.tick().await;

        while !self.session.state().is_terminal() {
            tokio::select! {
                // Queued actions win over the idle check.
                biased;

                submission = self.receiver.recv() => match submission {
                    Some(submission) => self.handle(submission).await,
                    None => {
                        debug!(%session_id, "action source closed");
                        break;
                    }
                },
                _ = idle.tick() => self.check_idle(),
            }
        }

        self.shutdown().await;
        info!(%session_id, state = %self.session.state(), "session runner stopped");
    }

    async fn handle(&mut self, submission: Submission) {
        let Submission { action, reply } = submission;
        let result = self.session.apply(&action);

        match &result {
            Ok(applied) => {
                self.last_activity = Instant::now();
                debug!(
                    session_id = %self.session.id(),
                    player_id = %action.player_id,
                    seq = applied.seq,
                    "action accepted"
                );
                self.publish().await;
            }
            Err(e) if e.is_fatal() => {
                error!(session_id = %self.session.id(), error = %e, "invariant violated, cancelling session");
                self.session.cancel();
            }
            Err(e) => {
                debug!(
                    session_id = %self.session.id(),
                    player_id = %action.player_id,
                    error = %e,
                    "action rejected"
                );
            }
        }

        if let Some(reply) = reply {
            // The submitter may have given up waiting.
            let _ = reply.send(result);
        }
    }

    fn check_idle(&mut self) {
        let Some(timeout) = self.idle_timeout else {
            return;
        };
        if self.last_activity.elapsed() >= timeout {
            info!(session_id = %self.session.id(), ?timeout, "session idle, cancelling");
            self.session.cancel();
        }
    }

    /// Stores a fresh snapshot and pushes it to every subscriber.
    async fn publish(&mut self) {
        self.published = Some((self.session.version(), self.session.state()));
        let snapshot = Arc::new(self.session.clone());
        self.snapshot.send_replace(Arc::clone(&snapshot));
        broadcast_snapshot(&self.hub, &snapshot, self.codec.as_ref()).await;
    }

    async fn shutdown(&mut self) {
        if self.session.cancel() {
            info!(session_id = %self.session.id(), "session cancelled on close");
        }

        // Anything still queued arrived after the session ended.
        self.receiver.close();
        while let Ok(Submission { reply, .. }) = self.receiver.try_recv() {
            if let Some(reply) = reply {
                let _ = reply.send(Err(EngineError::SessionTerminated(self.session.state())));
            }
        }

        // A winning action has already published the final state.
        if self.published != Some((self.session.version(), self.session.state())) {
            self.publish().await;
        }
        self.hub.close().await;

        if let Some(registry) = self.registry.upgrade() {
            registry.remove_if_current(self.session.id(), &self.hub).await;
        }
    }
}

/// Encodes the view of `session` that `audience` is allowed to see.
pub(crate) fn render_snapshot<C: Codec>(
    session: &Session,
    audience: &Audience,
    codec: &C,
) -> Result<Vec<u8>, ProtocolError> {
    codec.encode(&ServerMessage::Snapshot {
        view: session.view(audience.player_id()),
    })
}

/// Pushes per-audience snapshots of `session` through `hub`.
pub(crate) async fn broadcast_snapshot<C: Codec>(hub: &SessionHub, session: &Session, codec: &C) {
    let result = hub
        .broadcast_with(|audience| render_snapshot(session, audience, codec))
        .await;
    match result {
        Ok(delivered) => {
            debug!(session_id = %session.id(), version = session.version(), delivered, "snapshot broadcast");
        }
        Err(e) => {
            error!(session_id = %session.id(), error = %e, "failed to encode snapshot");
        }
    }
}
