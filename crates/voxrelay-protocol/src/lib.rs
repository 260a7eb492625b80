//! Wire protocol for voxrelay.
//!
//! This crate defines the "language" spoken on both relay endpoints:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`GameCommand`],
//!   [`GameNotice`], identity newtypes) — the message structures that
//!   travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the relay
//! core (registry, directory, identity store). It doesn't know about
//! connections or channels — it only knows how to serialize and
//! deserialize events.
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Relay core (state machine)
//! ```
//!
//! ICE candidates and session descriptions are carried as opaque
//! [`serde_json::Value`] blobs and relayed verbatim; the relay never
//! interprets them.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ChannelId, ClientEvent, GameCommand, GameNotice, JoinUserdata,
    PlayerUuid, ServerEvent, VolumeEntry,
};
