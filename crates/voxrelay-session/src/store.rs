//! The identity store: tokens, display names, and active sessions.
//!
//! This is the relay's record of what the game server has told it
//! (grants, invalidations) and which players are currently connected.
//! It is responsible for:
//! - Mapping tokens to player identities (granted by the game server)
//! - Caching display names per player
//! - Binding a player to their single live connection
//! - Enforcing "at most one presence per player"
//!
//! # Concurrency note
//!
//! `IdentityStore` is NOT thread-safe by itself — plain `HashMap`s, no
//! locks. This is intentional: the store lives inside the relay's single
//! state object and every mutation happens under the state mutex. Keeping
//! it synchronous here means each operation completes atomically with
//! respect to every other inbound event.

use std::collections::HashMap;

use voxrelay_protocol::PlayerUuid;
use voxrelay_transport::ConnectionId;

use crate::SessionError;

/// Tokens, display names, and the active-session binding.
///
/// ## Lifecycle of a player
///
/// ```text
/// grant_token() ──→ bind_session() ──→ release_session()
///      │                  │                   │
///      │             [connected]         [player free]
///      ▼
/// invalidate_token() — revokes the credential; the caller force-
/// disconnects the bound connection, which ends in release_session()
/// ```
pub struct IdentityStore {
    /// Live tokens, keyed by the token string.
    ///
    /// Several tokens may map to the same player — the game server may
    /// re-issue freely. A token stays valid until explicitly invalidated;
    /// a successful join does NOT consume it.
    tokens: HashMap<String, PlayerUuid>,

    /// Display names, keyed by player. Written on every grant (last
    /// grant wins). Never pruned — a stale name for a long-gone player
    /// is harmless and the next grant overwrites it.
    names: HashMap<PlayerUuid, String>,

    /// Active sessions: player → their one live connection.
    sessions: HashMap<PlayerUuid, ConnectionId>,

    /// Reverse index of `sessions`: connection → bound player. Kept in
    /// sync with `sessions` so disconnect cascades can go from a
    /// connection id to the player without scanning.
    players: HashMap<ConnectionId, PlayerUuid>,
}

impl IdentityStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
            names: HashMap::new(),
            sessions: HashMap::new(),
            players: HashMap::new(),
        }
    }

    /// Records a token grant from the game server.
    ///
    /// Idempotent upsert: granting the same token again re-points it,
    /// and the display name for the player is overwritten. Earlier
    /// tokens for the same player remain valid.
    pub fn grant_token(
        &mut self,
        token: String,
        player: PlayerUuid,
        display_name: String,
    ) {
        tracing::info!(%player, name = %display_name, "token granted");
        self.names.insert(player.clone(), display_name);
        self.tokens.insert(token, player);
    }

    /// Looks up the player a token belongs to.
    ///
    /// Read-only: the token is NOT consumed. It stays valid for repeated
    /// joins until the game server explicitly invalidates it.
    pub fn resolve_player(&self, token: &str) -> Option<&PlayerUuid> {
        self.tokens.get(token)
    }

    /// Revokes a token, returning the player it mapped to.
    ///
    /// Returns `None` if the token was unknown (or already revoked) —
    /// a second invalidation of the same token is a no-op. The caller
    /// is responsible for force-disconnecting the player's connection
    /// if one is bound; the store only drops the credential.
    pub fn invalidate_token(&mut self, token: &str) -> Option<PlayerUuid> {
        let player = self.tokens.remove(token)?;
        tracing::info!(%player, "token invalidated");
        Some(player)
    }

    /// Binds a player to a connection, marking them present.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyConnected`] if the player already
    /// has a live session OR the connection already has a player bound —
    /// either way the join that triggered this is a protocol violation.
    pub fn bind_session(
        &mut self,
        player: PlayerUuid,
        connection: ConnectionId,
    ) -> Result<(), SessionError> {
        if self.sessions.contains_key(&player)
            || self.players.contains_key(&connection)
        {
            return Err(SessionError::AlreadyConnected(player));
        }

        // Insert into both maps to keep them in sync.
        self.sessions.insert(player.clone(), connection);
        self.players.insert(connection, player.clone());

        tracing::info!(%player, %connection, "session bound");
        Ok(())
    }

    /// Releases whatever player is bound to this connection.
    ///
    /// Returns the player so the caller can notify the game server, or
    /// `None` if the connection never bound one (join never completed).
    /// After this the player is free to bind from a new connection.
    pub fn release_session(
        &mut self,
        connection: ConnectionId,
    ) -> Option<PlayerUuid> {
        let player = self.players.remove(&connection)?;
        self.sessions.remove(&player);
        tracing::info!(%player, %connection, "session released");
        Some(player)
    }

    /// Returns the display name for a player, if one was ever granted.
    pub fn display_name(&self, player: &PlayerUuid) -> Option<&str> {
        self.names.get(player).map(String::as_str)
    }

    /// Returns the connection a player is currently bound to.
    pub fn connection_for(
        &self,
        player: &PlayerUuid,
    ) -> Option<ConnectionId> {
        self.sessions.get(player).copied()
    }

    /// Returns the player bound to a connection.
    pub fn player_for(
        &self,
        connection: ConnectionId,
    ) -> Option<&PlayerUuid> {
        self.players.get(&connection)
    }

    /// Returns the number of players currently connected.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `IdentityStore`, following the
    //! `test_{function}_{scenario}_{expected}` naming convention.
    //!
    //! The store is synchronous, so these tests exercise the maps
    //! directly — the interesting part is the pairing of forward and
    //! reverse indices staying consistent across every operation.

    use super::*;

    fn uuid(s: &str) -> PlayerUuid {
        PlayerUuid::from(s)
    }

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    /// A store with one granted token: "T1" → "p1" ("Alice").
    fn store_with_grant() -> IdentityStore {
        let mut store = IdentityStore::new();
        store.grant_token("T1".into(), uuid("p1"), "Alice".into());
        store
    }

    // =====================================================================
    // grant_token() / resolve_player()
    // =====================================================================

    #[test]
    fn test_resolve_player_known_token_returns_player() {
        let store = store_with_grant();
        assert_eq!(store.resolve_player("T1"), Some(&uuid("p1")));
    }

    #[test]
    fn test_resolve_player_unknown_token_returns_none() {
        let store = store_with_grant();
        assert_eq!(store.resolve_player("nope"), None);
    }

    #[test]
    fn test_resolve_player_does_not_consume_token() {
        // Tokens are multi-use until invalidated — two resolves of the
        // same token must both succeed.
        let store = store_with_grant();
        assert!(store.resolve_player("T1").is_some());
        assert!(store.resolve_player("T1").is_some());
    }

    #[test]
    fn test_grant_token_overwrites_display_name() {
        let mut store = store_with_grant();
        store.grant_token("T2".into(), uuid("p1"), "Alicia".into());
        assert_eq!(store.display_name(&uuid("p1")), Some("Alicia"));
    }

    #[test]
    fn test_grant_token_keeps_earlier_tokens_valid() {
        // Re-granting for the same player must not revoke old tokens.
        let mut store = store_with_grant();
        store.grant_token("T2".into(), uuid("p1"), "Alice".into());
        assert_eq!(store.resolve_player("T1"), Some(&uuid("p1")));
        assert_eq!(store.resolve_player("T2"), Some(&uuid("p1")));
    }

    #[test]
    fn test_grant_token_same_token_repoints_player() {
        let mut store = store_with_grant();
        store.grant_token("T1".into(), uuid("p2"), "Bob".into());
        assert_eq!(store.resolve_player("T1"), Some(&uuid("p2")));
    }

    // =====================================================================
    // invalidate_token()
    // =====================================================================

    #[test]
    fn test_invalidate_token_removes_mapping() {
        let mut store = store_with_grant();
        let player = store.invalidate_token("T1");
        assert_eq!(player, Some(uuid("p1")));
        assert_eq!(store.resolve_player("T1"), None);
    }

    #[test]
    fn test_invalidate_token_twice_is_noop() {
        let mut store = store_with_grant();
        assert!(store.invalidate_token("T1").is_some());
        assert!(store.invalidate_token("T1").is_none());
    }

    #[test]
    fn test_invalidate_token_unknown_returns_none() {
        let mut store = store_with_grant();
        assert!(store.invalidate_token("bogus").is_none());
    }

    #[test]
    fn test_invalidate_token_leaves_session_untouched() {
        // Revoking the credential doesn't release the session — the
        // caller does that as part of the forced disconnect, which also
        // notifies the connection. Token and session lifecycles are
        // separate on purpose.
        let mut store = store_with_grant();
        store.bind_session(uuid("p1"), conn(1)).unwrap();
        store.invalidate_token("T1");
        assert_eq!(store.connection_for(&uuid("p1")), Some(conn(1)));
    }

    // =====================================================================
    // bind_session()
    // =====================================================================

    #[test]
    fn test_bind_session_records_both_directions() {
        let mut store = store_with_grant();
        store.bind_session(uuid("p1"), conn(1)).expect("should bind");

        assert_eq!(store.connection_for(&uuid("p1")), Some(conn(1)));
        assert_eq!(store.player_for(conn(1)), Some(&uuid("p1")));
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_bind_session_player_already_bound_returns_error() {
        // The same player connecting from a second browser tab must be
        // rejected — one presence per player.
        let mut store = store_with_grant();
        store.bind_session(uuid("p1"), conn(1)).unwrap();

        let result = store.bind_session(uuid("p1"), conn(2));

        assert!(matches!(
            result,
            Err(SessionError::AlreadyConnected(p)) if p == uuid("p1")
        ));
        // The original binding is untouched.
        assert_eq!(store.connection_for(&uuid("p1")), Some(conn(1)));
    }

    #[test]
    fn test_bind_session_connection_already_bound_returns_error() {
        // One connection claiming two identities is also a violation.
        let mut store = store_with_grant();
        store.bind_session(uuid("p1"), conn(1)).unwrap();

        let result = store.bind_session(uuid("p2"), conn(1));

        assert!(matches!(
            result,
            Err(SessionError::AlreadyConnected(_))
        ));
        assert_eq!(store.player_for(conn(1)), Some(&uuid("p1")));
    }

    #[test]
    fn test_bind_session_two_players_two_connections_ok() {
        let mut store = IdentityStore::new();
        store.bind_session(uuid("p1"), conn(1)).unwrap();
        store.bind_session(uuid("p2"), conn(2)).unwrap();
        assert_eq!(store.session_count(), 2);
    }

    // =====================================================================
    // release_session()
    // =====================================================================

    #[test]
    fn test_release_session_returns_bound_player() {
        let mut store = store_with_grant();
        store.bind_session(uuid("p1"), conn(1)).unwrap();

        let released = store.release_session(conn(1));

        assert_eq!(released, Some(uuid("p1")));
        assert_eq!(store.connection_for(&uuid("p1")), None);
        assert_eq!(store.player_for(conn(1)), None);
    }

    #[test]
    fn test_release_session_unbound_connection_returns_none() {
        let mut store = store_with_grant();
        assert_eq!(store.release_session(conn(99)), None);
    }

    #[test]
    fn test_release_session_frees_player_for_rebind() {
        // The disconnect-then-rejoin flow: after release, the same
        // player must be able to bind from a fresh connection.
        let mut store = store_with_grant();
        store.bind_session(uuid("p1"), conn(1)).unwrap();
        store.release_session(conn(1));

        store
            .bind_session(uuid("p1"), conn(2))
            .expect("player should be free after release");
        assert_eq!(store.connection_for(&uuid("p1")), Some(conn(2)));
    }

    #[test]
    fn test_release_session_keeps_token_valid() {
        // Disconnecting doesn't revoke the credential — only an
        // explicit invalidation does.
        let mut store = store_with_grant();
        store.bind_session(uuid("p1"), conn(1)).unwrap();
        store.release_session(conn(1));
        assert_eq!(store.resolve_player("T1"), Some(&uuid("p1")));
    }

    // =====================================================================
    // display_name()
    // =====================================================================

    #[test]
    fn test_display_name_known_player_returns_name() {
        let store = store_with_grant();
        assert_eq!(store.display_name(&uuid("p1")), Some("Alice"));
    }

    #[test]
    fn test_display_name_unknown_player_returns_none() {
        let store = store_with_grant();
        assert_eq!(store.display_name(&uuid("ghost")), None);
    }

    #[test]
    fn test_display_name_survives_token_invalidation() {
        // The name mapping is a cache keyed by player, not by token.
        let mut store = store_with_grant();
        store.invalidate_token("T1");
        assert_eq!(store.display_name(&uuid("p1")), Some("Alice"));
    }

    // =====================================================================
    // Full lifecycle
    // =====================================================================

    #[test]
    fn test_full_lifecycle_grant_bind_release_rebind() {
        let mut store = IdentityStore::new();

        // 1. Game server grants a token.
        store.grant_token("T1".into(), uuid("p1"), "Alice".into());

        // 2. Browser joins — session bound.
        store.bind_session(uuid("p1"), conn(1)).unwrap();
        assert_eq!(store.session_count(), 1);

        // 3. Browser disconnects — session released, token intact.
        assert_eq!(store.release_session(conn(1)), Some(uuid("p1")));
        assert_eq!(store.session_count(), 0);

        // 4. Browser reconnects with the same token on a new connection.
        assert_eq!(store.resolve_player("T1"), Some(&uuid("p1")));
        store.bind_session(uuid("p1"), conn(2)).unwrap();
        assert_eq!(store.connection_for(&uuid("p1")), Some(conn(2)));
    }

    #[test]
    fn test_multiple_tokens_one_player_single_presence() {
        // Two live tokens for the same player still can't produce two
        // concurrent sessions.
        let mut store = IdentityStore::new();
        store.grant_token("T1".into(), uuid("p1"), "Alice".into());
        store.grant_token("T2".into(), uuid("p1"), "Alice".into());

        store.bind_session(uuid("p1"), conn(1)).unwrap();
        let result = store.bind_session(uuid("p1"), conn(2));
        assert!(result.is_err(), "second presence must be rejected");
    }
}
