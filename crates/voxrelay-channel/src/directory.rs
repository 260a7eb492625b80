//! The channel directory: membership bookkeeping and peer-discovery
//! fan-out.
//!
//! Membership lives in two maps — channel → member set and connection →
//! channel set — and every mutation updates both, so "which peers do I
//! introduce you to" and "which channels do I tear down on disconnect"
//! are both O(1) lookups.

use std::collections::{HashMap, HashSet};

use voxrelay_protocol::{ChannelId, ServerEvent};
use voxrelay_transport::ConnectionId;

use crate::{ChannelError, ConnectionRegistry};

/// Maps channels to their member connections and back.
///
/// Channels are created lazily on first join and pruned when their last
/// member leaves; nothing outside this struct observes an empty channel.
pub struct ChannelDirectory {
    /// Forward view: channel → member connections.
    channels: HashMap<ChannelId, HashSet<ConnectionId>>,

    /// Reverse view: connection → channels it belongs to. Drives the
    /// disconnect cascade without scanning every channel.
    memberships: HashMap<ConnectionId, HashSet<ChannelId>>,
}

impl ChannelDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    /// Adds a connection to a channel and introduces it to every
    /// existing member.
    ///
    /// For each existing member M, exactly two events are delivered:
    /// `addPeer{peer_id: joiner, should_create_offer: false}` to M, and
    /// `addPeer{peer_id: M, should_create_offer: true}` to the joiner.
    /// The joiner is always the designated offerer, so the two ends of
    /// a pair never offer simultaneously.
    ///
    /// # Errors
    /// Returns [`ChannelError::AlreadyInChannel`] if the connection is
    /// already a member; no events are delivered in that case.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        channel: ChannelId,
        registry: &ConnectionRegistry,
    ) -> Result<(), ChannelError> {
        if self.is_member(connection, &channel) {
            return Err(ChannelError::AlreadyInChannel(
                connection, channel,
            ));
        }

        let members = self.channels.entry(channel.clone()).or_default();

        // Introduce the joiner to every existing member before it
        // becomes a member itself, so it never sees an addPeer for
        // its own id.
        for &member in members.iter() {
            registry.send(
                member,
                ServerEvent::AddPeer {
                    peer_id: connection,
                    should_create_offer: false,
                },
            );
            registry.send(
                connection,
                ServerEvent::AddPeer {
                    peer_id: member,
                    should_create_offer: true,
                },
            );
        }

        members.insert(connection);
        self.memberships
            .entry(connection)
            .or_default()
            .insert(channel.clone());

        tracing::info!(
            %connection,
            %channel,
            members = self.member_count(&channel),
            "joined channel"
        );
        Ok(())
    }

    /// Removes a connection from a channel, notifying both sides.
    ///
    /// Every remaining member M receives `removePeer{peer_id: leaver}`,
    /// and the leaver receives one `removePeer{peer_id: M}` per
    /// remaining member. Parting a channel the connection is not in is
    /// a no-op with a diagnostic — expected during races with the
    /// disconnect cascade.
    pub fn part(
        &mut self,
        connection: ConnectionId,
        channel: &ChannelId,
        registry: &ConnectionRegistry,
    ) {
        if !self.is_member(connection, channel) {
            tracing::debug!(
                %connection,
                %channel,
                "part of a channel the connection is not in, ignoring"
            );
            return;
        }

        if let Some(set) = self.memberships.get_mut(&connection) {
            set.remove(channel);
            if set.is_empty() {
                self.memberships.remove(&connection);
            }
        }

        let Some(members) = self.channels.get_mut(channel) else {
            return;
        };
        members.remove(&connection);

        for &member in members.iter() {
            registry.send(
                member,
                ServerEvent::RemovePeer {
                    peer_id: connection,
                },
            );
            registry.send(
                connection,
                ServerEvent::RemovePeer { peer_id: member },
            );
        }

        // Lazily created, eagerly pruned: an empty channel has no
        // observable behavior, so drop the entry.
        if members.is_empty() {
            self.channels.remove(channel);
        }

        tracing::info!(%connection, %channel, "parted channel");
    }

    /// Parts the connection from every channel it belongs to.
    ///
    /// Used by the disconnect cascade. Per-channel order is
    /// unspecified; each part is independent.
    pub fn part_all(
        &mut self,
        connection: ConnectionId,
        registry: &ConnectionRegistry,
    ) {
        let channels: Vec<ChannelId> = self
            .memberships
            .get(&connection)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        for channel in channels {
            self.part(connection, &channel, registry);
        }
    }

    /// Returns `true` if the connection is a member of the channel.
    pub fn is_member(
        &self,
        connection: ConnectionId,
        channel: &ChannelId,
    ) -> bool {
        self.memberships
            .get(&connection)
            .is_some_and(|set| set.contains(channel))
    }

    /// Returns the number of members in a channel (0 if it doesn't
    /// exist).
    pub fn member_count(&self, channel: &ChannelId) -> usize {
        self.channels.get(channel).map_or(0, HashSet::len)
    }

    /// Returns the channels a connection currently belongs to.
    pub fn channels_of(
        &self,
        connection: ConnectionId,
    ) -> Vec<ChannelId> {
        self.memberships
            .get(&connection)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of live (non-empty) channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for ChannelDirectory {
    fn default() -> Self {
        Self::new()
    }
}
