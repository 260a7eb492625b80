//! Error types for the channel layer.

use voxrelay_protocol::ChannelId;
use voxrelay_transport::ConnectionId;

/// Errors that can occur during channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The connection is already a member of this channel. Joining a
    /// channel twice is a protocol violation, not a retryable error.
    #[error("{0} already in channel {1}")]
    AlreadyInChannel(ConnectionId, ChannelId),
}
