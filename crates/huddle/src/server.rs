//! `HuddleServer` builder and server loop.
//!
//! This is the entry point for running a Huddle server. It ties together
//! all the layers: transport → protocol → room coordination.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use huddle_protocol::{Codec, JsonCodec};
use huddle_room::{RoomConfig, SessionCoordinator};
use huddle_transport::{Transport, WebSocketTransport};

use crate::HuddleError;
use crate::handler::handle_connection;

/// Default capacity of each connection's outbound event queue.
const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// coordinator does its own locking.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) coordinator: Arc<SessionCoordinator>,
    pub(crate) codec: C,
    pub(crate) outbound_buffer: usize,
    pub(crate) idle_timeout: Option<Duration>,
}

impl<C: Codec> ServerState<C> {
    /// Bound on queueing one event for a connection.
    pub(crate) fn send_timeout(&self) -> Duration {
        self.coordinator.directory().config().send_timeout
    }
}

/// Builder for configuring and starting a Huddle server.
///
/// # Example
///
/// ```rust,no_run
/// use huddle::prelude::*;
///
/// # async fn run() -> Result<(), HuddleError> {
/// let server = HuddleServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct HuddleServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    outbound_buffer: usize,
    idle_timeout: Option<Duration>,
}

impl HuddleServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            idle_timeout: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets how many undelivered events a connection may have queued.
    pub fn outbound_buffer(mut self, buffer: usize) -> Self {
        self.outbound_buffer = buffer.max(1);
        self
    }

    /// Closes connections that send nothing for this long. `None` keeps
    /// quiet connections open indefinitely.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener and returns a server ready to [`run`](HuddleServer::run).
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<HuddleServer<JsonCodec>, HuddleError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            coordinator: Arc::new(SessionCoordinator::new(self.room_config)),
            codec: JsonCodec,
            outbound_buffer: self.outbound_buffer,
            idle_timeout: self.idle_timeout,
        });

        Ok(HuddleServer { transport, state })
    }
}

impl Default for HuddleServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Huddle server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct HuddleServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl HuddleServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> HuddleServerBuilder {
        HuddleServerBuilder::new()
    }
}

impl<C: Codec> HuddleServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The coordinator shared by every connection. Stays usable after
    /// [`run`](Self::run) takes the server.
    pub fn coordinator(&self) -> Arc<SessionCoordinator> {
        Arc::clone(&self.state.coordinator)
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated; a failed accept is logged and skipped.
    pub async fn run(mut self) -> Result<(), HuddleError> {
        if let Ok(addr) = self.local_addr() {
            tracing::info!(%addr, "huddle server running");
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
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
