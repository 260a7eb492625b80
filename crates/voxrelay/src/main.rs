//! Runnable relay binary.
//!
//! Configuration comes from the environment:
//! - `VOXRELAY_ADDR` — browser-facing endpoint (default `0.0.0.0:3000`)
//! - `VOXRELAY_GAME_ADDR` — game-server endpoint (default `0.0.0.0:3001`)
//! - `RUST_LOG` — log filter (default `info`)

use tracing_subscriber::EnvFilter;
use voxrelay::{RelayError, RelayServer};

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let browser_addr = std::env::var("VOXRELAY_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let game_addr = std::env::var("VOXRELAY_GAME_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3001".to_string());

    let server = RelayServer::builder()
        .browser_bind(&browser_addr)
        .game_bind(&game_addr)
        .build()
        .await?;

    tracing::info!(
        browser = %browser_addr,
        game = %game_addr,
        "signaling relay listening"
    );
    server.run().await
}
