//! Signaling event types for both relay endpoints.
//!
//! Four event enums, one per direction:
//!
//! - [`ClientEvent`] — browser → relay (join, part, relay, disconnect)
//! - [`ServerEvent`] — relay → browser (peer discovery, relayed
//!   handshakes, token rejection, volume batches)
//! - [`GameCommand`] — game server → relay (token grants, invalidations,
//!   volume pushes)
//! - [`GameNotice`] — relay → game server (player presence)
//!
//! The browser-facing events use `{"event": ..., "data": ...}` framing —
//! adjacently tagged in serde terms — with the exact event names the
//! browser client listens for. Game-server frames carry no tag at all;
//! they are told apart by which fields are present, so [`GameCommand`]
//! is untagged and serde tries the variants in declaration order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use voxrelay_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The game server's stable identifier for a player, independent of any
/// particular connection.
///
/// Opaque to the relay — it is compared, stored, and echoed back, never
/// parsed. `#[serde(transparent)]` keeps it a plain JSON string on the
/// wire.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerUuid(pub String);

impl fmt::Display for PlayerUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerUuid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A channel name — a named group of connections that should be mutually
/// introduced for peer-to-peer negotiation (e.g. a proximity voice
/// group). Game-supplied and opaque.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Browser → relay
// ---------------------------------------------------------------------------

/// The `userdata` object carried by a join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinUserdata {
    /// The token the browser received out-of-band from the game.
    #[serde(rename = "playerToken")]
    pub player_token: String,
}

/// Events a browser connection may send to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Join a channel, authenticating with a player token.
    #[serde(rename = "join")]
    Join {
        channel: ChannelId,
        userdata: JoinUserdata,
    },

    /// Leave a channel.
    #[serde(rename = "part")]
    Part { channel: ChannelId },

    /// Forward an ICE candidate to another connection. The candidate
    /// body is opaque and passed through unmodified.
    #[serde(rename = "relayICECandidate")]
    RelayIceCandidate {
        peer_id: ConnectionId,
        ice_candidate: Value,
    },

    /// Forward a session description to another connection. Opaque,
    /// passed through unmodified.
    #[serde(rename = "relaySessionDescription")]
    RelaySessionDescription {
        peer_id: ConnectionId,
        session_description: Value,
    },

    /// Explicit disconnect request, equivalent to closing the transport.
    #[serde(rename = "disconnectClient")]
    DisconnectClient,
}

// ---------------------------------------------------------------------------
// Relay → browser
// ---------------------------------------------------------------------------

/// Events the relay sends to a browser connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A new peer is present in one of your channels. The joiner is
    /// always the offerer (`should_create_offer: true` only on the
    /// events sent TO the joiner), so the two sides of a pair never
    /// offer simultaneously.
    #[serde(rename = "addPeer")]
    AddPeer {
        peer_id: ConnectionId,
        should_create_offer: bool,
    },

    /// A peer left one of your channels (or disconnected).
    #[serde(rename = "removePeer")]
    RemovePeer { peer_id: ConnectionId },

    /// An ICE candidate relayed from `peer_id`.
    #[serde(rename = "iceCandidate")]
    IceCandidate {
        peer_id: ConnectionId,
        ice_candidate: Value,
    },

    /// A session description relayed from `peer_id`.
    #[serde(rename = "sessionDescription")]
    SessionDescription {
        peer_id: ConnectionId,
        session_description: Value,
    },

    /// The token presented at join time is unknown or was invalidated.
    /// The connection is force-closed after this event.
    #[serde(rename = "invalidToken")]
    InvalidToken,

    /// A volume batch from the game server, with display names and
    /// connection ids substituted in by the relay.
    #[serde(rename = "volumes", rename_all = "camelCase")]
    Volumes {
        microphone_activated: bool,
        volumes: Vec<VolumeEntry>,
    },
}

/// One entry of a volume batch.
///
/// The game server decides the entry's actual contents (gain, distance,
/// whatever the voice client consumes) — the relay only recognizes the
/// `player` field, fills in `playerName` / `socketId`, and forwards the
/// rest untouched via the flattened `extra` map. Fields the relay cannot
/// resolve are omitted from the output entirely, matching the original
/// wire behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeEntry {
    /// The player this entry applies to.
    pub player: PlayerUuid,

    /// Display name substituted by the relay.
    #[serde(
        rename = "playerName",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub player_name: Option<String>,

    /// The player's current connection id, substituted by the relay.
    #[serde(
        rename = "socketId",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub socket_id: Option<ConnectionId>,

    /// Everything else the game server put in the entry.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Game server → relay
// ---------------------------------------------------------------------------

/// Commands the game server sends over the privileged link.
///
/// The game-server protocol has no event tag — frames are distinguished
/// by their field shape, hence `#[serde(untagged)]`. Variant order
/// matters: serde tries them top to bottom, and the field sets are
/// disjoint enough that each frame matches exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameCommand {
    /// Issue a token for a player. Idempotent upsert: re-granting
    /// overwrites the display name and leaves earlier tokens valid.
    #[serde(rename_all = "camelCase")]
    GrantToken {
        player: PlayerUuid,
        player_name: String,
        token: String,
    },

    /// Revoke a token. If the player it mapped to is currently
    /// connected, that connection is force-disconnected.
    #[serde(rename_all = "camelCase")]
    InvalidateToken { invalidate_token: String },

    /// Push a volume batch to one player's connection.
    #[serde(rename_all = "camelCase")]
    PushVolumes {
        player: PlayerUuid,
        microphone_activated: bool,
        volumes: Vec<VolumeEntry>,
    },
}

// ---------------------------------------------------------------------------
// Relay → game server
// ---------------------------------------------------------------------------

/// Presence notifications the relay sends to the game server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum GameNotice {
    /// A player's connection joined a channel (session bound).
    #[serde(rename = "playerConnected")]
    PlayerConnected {
        #[serde(rename = "playerUUID")]
        player_uuid: PlayerUuid,
    },

    /// A player's connection went away (session released).
    #[serde(rename = "playerDisconnected")]
    PlayerDisconnected {
        #[serde(rename = "playerUUID")]
        player_uuid: PlayerUuid,
    },
}

// =========================================================================
// Tests
// =========================================================================
