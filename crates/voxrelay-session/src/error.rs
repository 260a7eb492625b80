//! Error types for the identity layer.

/// Errors that can occur during session binding.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The player already has a live session, or the connection already
    /// has a player bound. At most one concurrent presence per player,
    /// and one player per connection.
    #[error("player {0} already has an active session")]
    AlreadyConnected(voxrelay_protocol::PlayerUuid),
}
