//! Connection and channel bookkeeping for voxrelay.
//!
//! Two pieces, used together by the relay core:
//!
//! - [`ConnectionRegistry`] — every live browser connection and its
//!   outbound event sender. Delivery is best-effort and fire-and-forget.
//! - [`ChannelDirectory`] — which connections are in which channels,
//!   and the symmetric `addPeer`/`removePeer` fan-out that introduces
//!   (and un-introduces) peers to each other.
//!
//! Membership is recorded twice — channel → members and connection →
//! channels — and the directory keeps the two views consistent through
//! every join, part, and disconnect cascade.

mod directory;
mod error;
mod registry;

pub use directory::ChannelDirectory;
pub use error::ChannelError;
pub use registry::{ConnectionRegistry, EventSender};
