//! The relay's single owned state object.
//!
//! `RelayState` bundles the connection registry, the channel directory,
//! the identity store, and the game-link handle, and implements every
//! state transition of the signaling protocol as a synchronous method.
//! The server shares it behind one `tokio::sync::Mutex`: each inbound
//! event locks, mutates to completion, and unlocks, which gives a total
//! order over all transitions — the single-session-per-player invariant
//! cannot be violated by interleaving. Deliveries along the way go
//! through unbounded senders and never block.

use serde_json::Value;
use tokio::sync::mpsc;

use voxrelay_channel::{ChannelDirectory, ConnectionRegistry, EventSender};
use voxrelay_protocol::{
    ChannelId, GameNotice, PlayerUuid, ServerEvent, VolumeEntry,
};
use voxrelay_session::IdentityStore;
use voxrelay_transport::ConnectionId;

/// Sender half of the game link's outbound notice queue.
pub(crate) type NoticeSender = mpsc::UnboundedSender<GameNotice>;

/// The current game-server link, if one is connected.
///
/// The connection id lets a closing link task tell whether it is still
/// the authoritative one — a replaced link must not clear its
/// replacement's handle on the way out.
struct GameLink {
    connection: ConnectionId,
    sender: NoticeSender,
}

/// How a join request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Session bound, channel joined, peers introduced.
    Joined,
    /// The token was unknown. The connection has been sent
    /// `invalidToken` and disconnected.
    InvalidToken,
    /// Duplicate channel membership or a second presence for the
    /// player. The connection has been disconnected without further
    /// notice.
    Violation,
}

/// All mutable relay state. See the module docs for the locking rules.
pub struct RelayState {
    registry: ConnectionRegistry,
    directory: ChannelDirectory,
    identities: IdentityStore,
    game_link: Option<GameLink>,
}

impl RelayState {
    /// Creates a fresh, empty state.
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            directory: ChannelDirectory::new(),
            identities: IdentityStore::new(),
            game_link: None,
        }
    }

    // -----------------------------------------------------------------
    // Browser connection lifecycle
    // -----------------------------------------------------------------

    /// Registers a newly accepted browser connection.
    pub fn register_connection(
        &mut self,
        connection: ConnectionId,
        sender: EventSender,
    ) {
        self.registry.register(connection, sender);
    }

    /// Handles a join request: token check, session binding, channel
    /// membership, peer introductions, and the presence notice to the
    /// game server.
    ///
    /// Any rejection disconnects the requesting connection — see
    /// [`JoinOutcome`] for which rejection carries an `invalidToken`
    /// notice.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        channel: ChannelId,
        token: &str,
    ) -> JoinOutcome {
        let Some(player) =
            self.identities.resolve_player(token).cloned()
        else {
            tracing::warn!(%connection, "join with unknown token");
            self.registry.send(connection, ServerEvent::InvalidToken);
            self.disconnect(connection);
            return JoinOutcome::InvalidToken;
        };

        if self.directory.is_member(connection, &channel) {
            tracing::warn!(
                %connection,
                %channel,
                "join while already a member"
            );
            self.disconnect(connection);
            return JoinOutcome::Violation;
        }

        if let Err(e) =
            self.identities.bind_session(player.clone(), connection)
        {
            tracing::warn!(%connection, error = %e, "join rejected");
            self.disconnect(connection);
            return JoinOutcome::Violation;
        }

        self.directory
            .join(connection, channel, &self.registry)
            .expect("membership pre-checked");

        self.notify_game(GameNotice::PlayerConnected {
            player_uuid: player,
        });
        JoinOutcome::Joined
    }

    /// Removes the connection from one channel.
    pub fn part(&mut self, connection: ConnectionId, channel: &ChannelId) {
        self.directory.part(connection, channel, &self.registry);
    }

    /// Forwards an ICE candidate to a peer, verbatim, tagged with the
    /// sender's id. Dropped silently if the peer is gone.
    pub fn relay_ice_candidate(
        &self,
        from: ConnectionId,
        to: ConnectionId,
        candidate: Value,
    ) {
        if !self.registry.contains(to) {
            tracing::debug!(%from, %to, "dropping ICE candidate for gone peer");
            return;
        }
        self.registry.send(
            to,
            ServerEvent::IceCandidate {
                peer_id: from,
                ice_candidate: candidate,
            },
        );
    }

    /// Forwards a session description to a peer, verbatim, tagged with
    /// the sender's id. Dropped silently if the peer is gone.
    pub fn relay_session_description(
        &self,
        from: ConnectionId,
        to: ConnectionId,
        description: Value,
    ) {
        if !self.registry.contains(to) {
            tracing::debug!(
                %from, %to,
                "dropping session description for gone peer"
            );
            return;
        }
        self.registry.send(
            to,
            ServerEvent::SessionDescription {
                peer_id: from,
                session_description: description,
            },
        );
    }

    /// The disconnect cascade: parts every channel (with removePeer
    /// fan-out), releases the session binding, deregisters the
    /// connection, and notifies the game server if a player was bound.
    ///
    /// Idempotent — a connection that has already been cascaded is
    /// skipped, so the transport-close path and a forced disconnect can
    /// both fire without double fan-out. Returns `true` if this call
    /// did the teardown.
    pub fn disconnect(&mut self, connection: ConnectionId) -> bool {
        if !self.registry.contains(connection) {
            return false;
        }
        tracing::info!(%connection, "disconnecting client");

        // Part first: the departing connection must still be
        // registered so its own symmetric removePeer events deliver.
        self.directory.part_all(connection, &self.registry);
        self.registry.unregister(connection);

        if let Some(player) = self.identities.release_session(connection)
        {
            self.notify_game(GameNotice::PlayerDisconnected {
                player_uuid: player,
            });
        }
        true
    }

    // -----------------------------------------------------------------
    // Game-server link
    // -----------------------------------------------------------------

    /// Installs a game link, replacing any previous one.
    ///
    /// Last writer wins: the old link is not torn down, its handle is
    /// simply forgotten.
    pub(crate) fn set_game_link(
        &mut self,
        connection: ConnectionId,
        sender: NoticeSender,
    ) {
        if let Some(old) = &self.game_link {
            tracing::warn!(
                old = %old.connection,
                new = %connection,
                "replacing game-server link"
            );
        } else {
            tracing::info!(%connection, "game-server link established");
        }
        self.game_link = Some(GameLink { connection, sender });
    }

    /// Clears the game link, but only if `connection` is still the
    /// authoritative one.
    pub(crate) fn clear_game_link(&mut self, connection: ConnectionId) {
        if self
            .game_link
            .as_ref()
            .is_some_and(|link| link.connection == connection)
        {
            tracing::info!(%connection, "game-server link closed");
            self.game_link = None;
        }
    }

    /// Records a token grant.
    pub fn grant_token(
        &mut self,
        token: String,
        player: PlayerUuid,
        display_name: String,
    ) {
        self.identities.grant_token(token, player, display_name);
    }

    /// Revokes a token. If its player is currently connected, that
    /// connection is sent `invalidToken` and force-disconnected.
    pub fn invalidate_token(&mut self, token: &str) {
        let Some(player) = self.identities.invalidate_token(token)
        else {
            tracing::debug!("invalidate for unknown token, ignoring");
            return;
        };

        let Some(connection) = self.identities.connection_for(&player)
        else {
            return;
        };

        tracing::info!(%player, %connection, "forcing disconnect: token invalidated");
        self.registry.send(connection, ServerEvent::InvalidToken);
        self.disconnect(connection);
    }

    /// Forwards a volume batch to the target player's connection,
    /// substituting each entry's display name and connection id.
    /// Dropped silently if the target player is not connected.
    pub fn push_volumes(
        &self,
        player: &PlayerUuid,
        microphone_activated: bool,
        volumes: Vec<VolumeEntry>,
    ) {
        let Some(target) = self.identities.connection_for(player) else {
            tracing::debug!(%player, "volume push for unconnected player, dropping");
            return;
        };

        let resolved = volumes
            .into_iter()
            .map(|entry| VolumeEntry {
                player_name: self
                    .identities
                    .display_name(&entry.player)
                    .map(str::to_string),
                socket_id: self.identities.connection_for(&entry.player),
                ..entry
            })
            .collect();

        self.registry.send(
            target,
            ServerEvent::Volumes {
                microphone_activated,
                volumes: resolved,
            },
        );
    }

    /// Sends a notice to the game server, if a link is up. Skipped
    /// silently otherwise — the relay keeps serving existing sessions
    /// without one.
    fn notify_game(&self, notice: GameNotice) {
        match &self.game_link {
            Some(link) => {
                let _ = link.sender.send(notice);
            }
            None => {
                tracing::debug!("no game-server link, dropping notice");
            }
        }
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
