//! `RelayServer` builder and accept loop.
//!
//! This is the entry point for running the relay. It ties together the
//! layers: transport → protocol → identity/channel bookkeeping, with
//! one listener for browser clients and one for the game-server link.

use std::sync::Arc;

use tokio::sync::Mutex;
use voxrelay_protocol::{Codec, JsonCodec};
use voxrelay_transport::{Transport, WebSocketTransport};

use crate::game::handle_game_connection;
use crate::handler::handle_browser_connection;
use crate::state::RelayState;
use crate::RelayError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. All
/// mutable relay state sits behind the one `Mutex` — see
/// [`RelayState`]'s locking rules.
pub(crate) struct ServerShared<C: Codec> {
    pub(crate) state: Mutex<RelayState>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,ignore
/// let server = RelayServer::builder()
///     .browser_bind("0.0.0.0:3000")
///     .game_bind("0.0.0.0:3001")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RelayServerBuilder {
    browser_addr: String,
    game_addr: String,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            browser_addr: "127.0.0.1:3000".to_string(),
            game_addr: "127.0.0.1:3001".to_string(),
        }
    }

    /// Sets the address of the browser-facing endpoint.
    pub fn browser_bind(mut self, addr: &str) -> Self {
        self.browser_addr = addr.to_string();
        self
    }

    /// Sets the address of the game-server-facing endpoint.
    pub fn game_bind(mut self, addr: &str) -> Self {
        self.game_addr = addr.to_string();
        self
    }

    /// Binds both listeners and builds the server.
    ///
    /// Uses `JsonCodec` — the wire format both endpoints speak.
    pub async fn build(
        self,
    ) -> Result<RelayServer<JsonCodec>, RelayError> {
        let browser =
            WebSocketTransport::bind(&self.browser_addr).await?;
        let game = WebSocketTransport::bind(&self.game_addr).await?;

        let shared = Arc::new(ServerShared {
            state: Mutex::new(RelayState::new()),
            codec: JsonCodec,
        });

        Ok(RelayServer {
            browser,
            game,
            shared,
        })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running signaling relay.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer<C: Codec> {
    browser: WebSocketTransport,
    game: WebSocketTransport,
    shared: Arc<ServerShared<C>>,
}

impl RelayServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }
}

impl<C: Codec> RelayServer<C> {
    /// Returns the local address of the browser-facing endpoint.
    pub fn browser_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.browser.local_addr()
    }

    /// Returns the local address of the game-server-facing endpoint.
    pub fn game_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.game.local_addr()
    }

    /// Runs both accept loops until the process is terminated.
    ///
    /// Every accepted browser connection gets a handler task; every
    /// accepted game connection becomes the authoritative link,
    /// replacing the previous one.
    pub async fn run(mut self) -> Result<(), RelayError> {
        tracing::info!("voxrelay running");

        loop {
            tokio::select! {
                result = self.browser.accept() => match result {
                    Ok(conn) => {
                        let shared = Arc::clone(&self.shared);
                        tokio::spawn(handle_browser_connection(
                            conn, shared,
                        ));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "browser accept failed");
                    }
                },
                result = self.game.accept() => match result {
                    Ok(conn) => {
                        let shared = Arc::clone(&self.shared);
                        tokio::spawn(handle_game_connection(
                            conn, shared,
                        ));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "game accept failed");
                    }
                },
            }
        }
    }
}
