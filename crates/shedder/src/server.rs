//! `ShedderServer` builder and accept loop.
//!
//! Ties the layers together: WebSocket transport → protocol → registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use shedder_protocol::JsonCodec;
use shedder_registry::{RegistryConfig, SessionRegistry};
use tokio::net::TcpListener;

use crate::ShedderError;
use crate::handler::handle_connection;

/// Counter for connection ids used in logs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Default outbound buffer per connection, in messages.
const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Shared state handed to every connection task.
pub(crate) struct ServerState {
    pub(crate) registry: SessionRegistry<JsonCodec>,
    pub(crate) codec: JsonCodec,
    pub(crate) subscriber_buffer: usize,
}

/// Builder for configuring and starting a Shedder server.
///
/// ```rust,no_run
/// use shedder::prelude::*;
///
/// # async fn run() -> Result<(), ShedderError> {
/// let server = ShedderServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ShedderServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
    registry: Option<SessionRegistry<JsonCodec>>,
    subscriber_buffer: usize,
}

impl ShedderServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            registry_config: RegistryConfig::default(),
            registry: None,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration for the registry the server creates.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Serves an existing registry instead of creating one.
    ///
    /// Overrides [`registry_config`](Self::registry_config).
    pub fn registry(mut self, registry: SessionRegistry<JsonCodec>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets how many outbound messages may queue per connection before
    /// its subscriptions are dropped as too slow.
    pub fn subscriber_buffer(mut self, size: usize) -> Self {
        self.subscriber_buffer = size.max(1);
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<ShedderServer, ShedderError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "WebSocket listener bound");

        let registry = self
            .registry
            .unwrap_or_else(|| SessionRegistry::new(self.registry_config));

        let state = Arc::new(ServerState {
            registry,
            codec: JsonCodec,
            subscriber_buffer: self.subscriber_buffer,
        });

        Ok(ShedderServer { listener, state })
    }
}

impl Default for ShedderServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Shedder server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ShedderServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl ShedderServer {
    pub fn builder() -> ShedderServerBuilder {
        ShedderServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The registry this server routes to.
    pub fn registry(&self) -> &SessionRegistry<JsonCodec> {
        &self.state.registry
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each accepted TCP stream is upgraded to a WebSocket and handled on
    /// its own task.
    pub async fn run(self) -> Result<(), ShedderError> {
        tracing::info!("Shedder server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    let conn_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
                    tokio::spawn(async move {
                        let ws = match tokio_tungstenite::accept_async(stream).await {
                            Ok(ws) => ws,
                            Err(e) => {
                                tracing::debug!(conn_id, %addr, error = %e, "WebSocket upgrade failed");
                                return;
                            }
                        };
                        tracing::debug!(conn_id, %addr, "accepted WebSocket connection");
                        if let Err(e) = handle_connection(ws, conn_id, state).await {
                            tracing::debug!(conn_id, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
