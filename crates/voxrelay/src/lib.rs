//! # voxrelay
//!
//! A WebRTC signaling relay for proximity voice. Browser clients connect
//! over WebSocket, authenticate channel joins with tokens issued by the
//! game server, and exchange opaque ICE/SDP handshake payloads until
//! they can stream audio directly to each other. A second, privileged
//! WebSocket endpoint links the game server itself: token grants and
//! invalidations flow in, player presence flows out, and per-player
//! volume batches are forwarded through.
//!
//! The relay never sees media — it only introduces peers
//! (`addPeer`/`removePeer`) and passes their handshake blobs along.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use voxrelay::RelayServer;
//!
//! # async fn run() -> Result<(), voxrelay::RelayError> {
//! let server = RelayServer::builder()
//!     .browser_bind("0.0.0.0:3000")
//!     .game_bind("0.0.0.0:3001")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod game;
mod handler;
mod server;
mod state;

pub use error::RelayError;
pub use server::{RelayServer, RelayServerBuilder};
pub use state::{JoinOutcome, RelayState};
