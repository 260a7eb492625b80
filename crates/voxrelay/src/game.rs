//! The game-server link: the single privileged connection.
//!
//! The game server dials in on its own endpoint and from then on pushes
//! token grants, invalidations, and volume batches; the relay pushes
//! presence notices back. At most one link is authoritative at a time —
//! a newly accepted game connection replaces the stored handle (last
//! writer wins) and the replaced task finds out only when it tries to
//! clear the handle on exit.

use std::sync::Arc;

use tokio::sync::mpsc;
use voxrelay_protocol::{Codec, GameCommand, GameNotice};
use voxrelay_transport::{Connection, WebSocketConnection};

use crate::server::ServerShared;

/// Handles a single game-server connection from accept to close.
pub(crate) async fn handle_game_connection<C: Codec>(
    conn: WebSocketConnection,
    shared: Arc<ServerShared<C>>,
) {
    let link_id = conn.id();

    let (tx, rx) = mpsc::unbounded_channel();
    shared.state.lock().await.set_game_link(link_id, tx);

    tokio::spawn(pump_notices(conn.clone(), rx, Arc::clone(&shared)));

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%link_id, "game-server link closed by peer");
                break;
            }
            Err(e) => {
                tracing::debug!(%link_id, error = %e, "game link recv error");
                break;
            }
        };

        let command: GameCommand = match shared.codec.decode(&data) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::debug!(
                    %link_id, error = %e,
                    "ignoring unrecognized game-server frame"
                );
                continue;
            }
        };

        let mut state = shared.state.lock().await;
        match command {
            GameCommand::GrantToken {
                player,
                player_name,
                token,
            } => {
                state.grant_token(token, player, player_name);
            }
            GameCommand::InvalidateToken { invalidate_token } => {
                state.invalidate_token(&invalidate_token);
            }
            GameCommand::PushVolumes {
                player,
                microphone_activated,
                volumes,
            } => {
                state.push_volumes(&player, microphone_activated, volumes);
            }
        }
    }

    // Only clears if this task's link is still the authoritative one —
    // a replaced link must not tear down its replacement.
    shared.state.lock().await.clear_game_link(link_id);
}

/// Drains presence notices into the game-server socket.
async fn pump_notices<C: Codec>(
    conn: WebSocketConnection,
    mut rx: mpsc::UnboundedReceiver<GameNotice>,
    shared: Arc<ServerShared<C>>,
) {
    let link_id = conn.id();
    while let Some(notice) = rx.recv().await {
        let bytes = match shared.codec.encode(&notice) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(%link_id, error = %e, "failed to encode notice");
                continue;
            }
        };
        if conn.send(&bytes).await.is_err() {
            break;
        }
    }
    tracing::debug!(%link_id, "notice pump stopped");
}
