//! The connection registry: every live browser connection's outbound
//! event channel.
//!
//! Each connection task owns a pump that drains an unbounded mpsc
//! receiver into the socket; the registry holds the matching senders so
//! any other task (peer fan-out, volume pushes, forced disconnects) can
//! deliver events by connection id.

use std::collections::HashMap;

use tokio::sync::mpsc;
use voxrelay_protocol::ServerEvent;
use voxrelay_transport::ConnectionId;

/// Sender half of a connection's outbound event queue.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Tracks every live connection and delivers events to them.
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, EventSender>,
}

impl ConnectionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Registers a connection's outbound sender.
    ///
    /// Connection ids are fresh per transport accept, so this never
    /// replaces an existing entry.
    pub fn register(&mut self, id: ConnectionId, sender: EventSender) {
        self.connections.insert(id, sender);
        tracing::debug!(%id, "connection registered");
    }

    /// Removes a connection. Returns `false` if it was already gone,
    /// which callers use to make disconnect cascades idempotent.
    pub fn unregister(&mut self, id: ConnectionId) -> bool {
        let removed = self.connections.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "connection unregistered");
        }
        removed
    }

    /// Returns `true` if the connection is currently registered.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Delivers an event to a connection, best-effort.
    ///
    /// Silently a no-op if the target has already disconnected — either
    /// unregistered (absent here) or mid-teardown (send on a closed
    /// channel). Never queued beyond the connection's own outbound
    /// buffer, never retried.
    pub fn send(&self, id: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.connections.get(&id) {
            let _ = sender.send(event);
        }
    }

    /// Returns the number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
