//! Error types for the protocol layer.
//!
//! Each crate in voxrelay defines its own error enum. A `ProtocolError`
//! always means a serialization problem, not a networking or bookkeeping
//! one.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or an
    /// unknown event name.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is invalid at the protocol level even though it
    /// parsed — e.g. a game-server frame matching none of the known
    /// command shapes.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
