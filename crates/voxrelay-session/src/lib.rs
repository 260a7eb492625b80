//! Identity and token bookkeeping for voxrelay.
//!
//! This crate answers three questions for the relay core:
//!
//! 1. **Who is this token for?** — token → player lookups, granted and
//!    revoked by the game server ([`IdentityStore::resolve_player`])
//! 2. **What do we call them?** — player → display-name cache
//! 3. **Are they here right now?** — the active-session binding between
//!    a player and at most one live connection
//!
//! # How it fits in the stack
//!
//! ```text
//! Relay core (above)  ← validates joins, cascades disconnects
//!     ↕
//! Identity layer (this crate)  ← tokens, names, session bindings
//!     ↕
//! Protocol layer (below)  ← provides PlayerUuid
//! ```

mod error;
mod store;

pub use error::SessionError;
pub use store::IdentityStore;
