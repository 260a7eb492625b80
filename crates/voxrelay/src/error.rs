//! Unified error type for the relay.

use voxrelay_channel::ChannelError;
use voxrelay_protocol::ProtocolError;
use voxrelay_session::SessionError;
use voxrelay_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An identity-level error (session binding).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A channel-membership error.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
