//! Per-connection handler for browser clients.
//!
//! Each accepted browser connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Register the connection and spawn its outbound pump
//!   2. Loop: receive events → dispatch against the shared state
//!   3. On any exit (clean close, error, forced disconnect) → cascade
//!
//! There is no handshake phase: a fresh connection may immediately send
//! `join`, and everything before a successful join is simply an
//! unauthenticated connection that can only get itself disconnected.

use std::sync::Arc;

use tokio::sync::mpsc;
use voxrelay_protocol::{ClientEvent, Codec, ServerEvent};
use voxrelay_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::server::ServerShared;
use crate::state::JoinOutcome;

/// Drop guard that runs the disconnect cascade when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock;
/// the cascade itself is idempotent, so racing an earlier explicit
/// disconnect is harmless.
struct DisconnectGuard<C: Codec> {
    conn_id: ConnectionId,
    shared: Arc<ServerShared<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            shared.state.lock().await.disconnect(conn_id);
        });
    }
}

/// Handles a single browser connection from accept to close.
pub(crate) async fn handle_browser_connection<C: Codec>(
    conn: WebSocketConnection,
    shared: Arc<ServerShared<C>>,
) {
    let conn_id = conn.id();
    tracing::info!(%conn_id, "browser connection accepted");

    // Register the outbound queue, then keep the guard active for the
    // rest of the handler's life.
    let (tx, rx) = mpsc::unbounded_channel();
    shared.state.lock().await.register_connection(conn_id, tx);
    let _guard = DisconnectGuard {
        conn_id,
        shared: Arc::clone(&shared),
    };

    // The pump owns the send half of the socket: it drains queued
    // events until every registry sender is dropped (the cascade), then
    // closes the socket. Queued events — an `invalidToken` in
    // particular — are flushed before the close frame goes out.
    tokio::spawn(pump_outbound(conn.clone(), rx, Arc::clone(&shared)));

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match shared.codec.decode(&data) {
            Ok(ev) => ev,
            Err(e) => {
                tracing::debug!(
                    %conn_id, error = %e, "ignoring undecodable frame"
                );
                continue;
            }
        };

        if dispatch(conn_id, event, &shared).await {
            break;
        }
    }

    // _guard drops here → disconnect cascade fires (idempotent).
}

/// Applies one client event to the shared state. Returns `true` if the
/// connection should close.
async fn dispatch<C: Codec>(
    conn_id: ConnectionId,
    event: ClientEvent,
    shared: &Arc<ServerShared<C>>,
) -> bool {
    match event {
        ClientEvent::Join { channel, userdata } => {
            tracing::debug!(%conn_id, %channel, "join requested");
            let outcome = shared.state.lock().await.join(
                conn_id,
                channel,
                &userdata.player_token,
            );
            // Any rejection already cascaded inside join(); the
            // handler just stops reading.
            !matches!(outcome, JoinOutcome::Joined)
        }

        ClientEvent::Part { channel } => {
            shared.state.lock().await.part(conn_id, &channel);
            false
        }

        ClientEvent::RelayIceCandidate {
            peer_id,
            ice_candidate,
        } => {
            tracing::debug!(%conn_id, %peer_id, "relaying ICE candidate");
            shared.state.lock().await.relay_ice_candidate(
                conn_id,
                peer_id,
                ice_candidate,
            );
            false
        }

        ClientEvent::RelaySessionDescription {
            peer_id,
            session_description,
        } => {
            tracing::debug!(%conn_id, %peer_id, "relaying session description");
            shared.state.lock().await.relay_session_description(
                conn_id,
                peer_id,
                session_description,
            );
            false
        }

        ClientEvent::DisconnectClient => {
            tracing::info!(%conn_id, "client requested disconnect");
            shared.state.lock().await.disconnect(conn_id);
            true
        }
    }
}

/// Drains a connection's outbound queue into its socket.
///
/// Ends when the registry drops the sender (disconnect cascade) or the
/// socket rejects a send; either way the socket is closed on the way
/// out.
async fn pump_outbound<C: Codec>(
    conn: WebSocketConnection,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    shared: Arc<ServerShared<C>>,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let bytes = match shared.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if conn.send(&bytes).await.is_err() {
            // The peer is gone; delivery is best-effort.
            break;
        }
    }
    let _ = conn.close().await;
    tracing::debug!(%conn_id, "outbound pump stopped");
}
