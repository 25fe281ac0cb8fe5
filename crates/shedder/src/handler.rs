//! Per-connection handler: decode client messages and route them to the
//! registry.
//!
//! Each accepted connection gets its own task running this handler. The
//! socket is split: a writer task drains a bounded outbound channel, and
//! a clone of that channel's sender doubles as the connection's hub sink,
//! so replies and snapshots share one ordered stream.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use shedder_hub::{Audience, SubscriberId};
use shedder_protocol::{ClientMessage, Codec, PlayerId, ServerMessage, SessionId};
use shedder_registry::SessionRegistry;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::ShedderError;
use crate::server::ServerState;

/// Drop guard that detaches a connection's subscriptions when the
/// handler exits.
///
/// `Drop` is synchronous, so the unsubscribes run on a spawned task.
struct SubscriptionGuard {
    registry: SessionRegistry,
    subscriptions: HashMap<SessionId, SubscriberId>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        let registry = self.registry.clone();
        let subscriptions = std::mem::take(&mut self.subscriptions);
        tokio::spawn(async move {
            for (session_id, subscriber) in subscriptions {
                registry.unsubscribe(&session_id, subscriber).await;
            }
        });
    }
}

/// What one connection is allowed to do.
struct ConnectionContext {
    conn_id: u64,
    state: Arc<ServerState>,
    outbound: mpsc::Sender<Vec<u8>>,
    /// Players this connection created or joined; it may act as them.
    players: HashSet<PlayerId>,
    guard: SubscriptionGuard,
}

/// Handles a single connection from upgrade to close.
pub(crate) async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    conn_id: u64,
    state: Arc<ServerState>,
) -> Result<(), ShedderError> {
    let (mut write, mut read) = ws.split();
    let (outbound, mut outbound_rx) = mpsc::channel::<Vec<u8>>(state.subscriber_buffer);

    let writer = tokio::spawn(async move {
        while let Some(bytes) = outbound_rx.recv().await {
            if let Err(e) = write.send(Message::Binary(bytes.into())).await {
                tracing::debug!(conn_id, error = %e, "send failed");
                break;
            }
        }
        let _ = write.close().await;
    });

    let mut ctx = ConnectionContext {
        conn_id,
        guard: SubscriptionGuard {
            registry: state.registry.clone(),
            subscriptions: HashMap::new(),
        },
        state,
        outbound,
        players: HashSet::new(),
    };

    let result = loop {
        let data = match read.next().await {
            Some(Ok(Message::Binary(data))) => data.to_vec(),
            Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
            Some(Ok(Message::Close(_))) | None => {
                tracing::debug!(conn_id, "connection closed cleanly");
                break Ok(());
            }
            // Ping, pong and raw frames.
            Some(Ok(_)) => continue,
            Some(Err(e)) => break Err(ShedderError::from(e)),
        };

        let msg: ClientMessage = match ctx.state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(conn_id, error = %e, "failed to decode client message");
                ctx.send_error(&ShedderError::from(e)).await;
                continue;
            }
        };

        match ctx.dispatch(msg).await {
            Ok(reply) => ctx.send(&reply).await,
            Err(e) => {
                tracing::debug!(conn_id, error = %e, "request rejected");
                ctx.send_error(&e).await;
            }
        }
    };

    // Hub sinks hold clones of the outbound sender, so the writer would
    // otherwise outlive the socket until every session dropped it.
    writer.abort();
    tracing::debug!(conn_id = ctx.conn_id, "connection handler finished");
    result
}

impl ConnectionContext {
    async fn dispatch(&mut self, msg: ClientMessage) -> Result<ServerMessage, ShedderError> {
        let registry = &self.state.registry;
        match msg {
            ClientMessage::CreateSession { name } => {
                let (session_id, player_id) = registry.create_session(name).await?;
                self.players.insert(player_id.clone());
                tracing::info!(conn_id = self.conn_id, %session_id, %player_id, "session created by client");
                Ok(ServerMessage::SessionCreated {
                    session_id,
                    player_id,
                })
            }

            ClientMessage::JoinSession { session_id, name } => {
                let player_id = registry.join(&session_id, name).await?;
                self.players.insert(player_id.clone());
                Ok(ServerMessage::Joined {
                    session_id,
                    player_id,
                })
            }

            ClientMessage::StartSession { session_id } => {
                registry.start(&session_id).await?;
                Ok(ServerMessage::Started { session_id })
            }

            ClientMessage::Subscribe {
                session_id,
                player_id,
            } => {
                let audience = match player_id {
                    Some(player_id) => Audience::Player(self.owned(player_id)?),
                    None => Audience::Spectator,
                };
                let subscriber = registry
                    .subscribe(&session_id, audience, self.outbound.clone())
                    .await?;
                // The outbound sender is one sink, so a repeat subscribe
                // gets the same id back.
                let previous = self
                    .guard
                    .subscriptions
                    .insert(session_id.clone(), subscriber);
                if let Some(previous) = previous.filter(|previous| *previous != subscriber) {
                    registry.unsubscribe(&session_id, previous).await;
                }
                Ok(ServerMessage::Subscribed { session_id })
            }

            ClientMessage::Unsubscribe { session_id } => {
                if let Some(subscriber) = self.guard.subscriptions.remove(&session_id) {
                    registry.unsubscribe(&session_id, subscriber).await;
                }
                Ok(ServerMessage::Unsubscribed { session_id })
            }

            ClientMessage::Act { session_id, action } => {
                self.owned(action.player_id.clone())?;
                let applied = registry.submit(&session_id, action).await?;
                Ok(ServerMessage::ActionApplied {
                    session_id,
                    seq: applied.seq,
                })
            }
        }
    }

    fn owned(&self, player_id: PlayerId) -> Result<PlayerId, ShedderError> {
        if self.players.contains(&player_id) {
            Ok(player_id)
        } else {
            Err(ShedderError::NotYourPlayer(player_id))
        }
    }

    /// Queues a reply behind any snapshots already waiting.
    async fn send(&self, msg: &ServerMessage) {
        match self.state.codec.encode(msg) {
            Ok(bytes) => {
                if self.outbound.send(bytes).await.is_err() {
                    tracing::debug!(conn_id = self.conn_id, "writer gone, dropping reply");
                }
            }
            Err(e) => tracing::error!(conn_id = self.conn_id, error = %e, "failed to encode reply"),
        }
    }

    async fn send_error(&self, error: &ShedderError) {
        self.send(&ServerMessage::Error {
            kind: error.kind(),
            message: error.to_string(),
        })
        .await;
    }
}
