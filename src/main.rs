//! Room server (default binary).
//!
//! Listens for players on `TETRIS_BATTLE_HOST:TETRIS_BATTLE_PORT` and runs the
//! room coordinator until the listener fails. `RUST_LOG` controls verbosity.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use tetris_battle::net::{serve, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        default_room = %config.default_room,
        room_max_age_secs = config.room_max_age.as_secs(),
        reap_interval_secs = config.reap_interval.as_secs(),
        "starting server"
    );

    serve(config, None).await
}
