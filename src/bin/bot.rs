//! Headless bot player.
//!
//! Joins a room and feeds random commands to its engine until the match ends.
//! Reads `TETRIS_BATTLE_ADDR` (default 127.0.0.1:3000), `TETRIS_BATTLE_ROOM`
//! and `TETRIS_BATTLE_NICKNAME`. With `TETRIS_BATTLE_AUTO_START=1` the bot
//! starts the match once a second player is present.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use tetris_battle::net::{run_client, ClientOptions, MatchOptions};
use tetris_battle::types::PlayerCommand;

/// Pause between two bot inputs
const THINK_MS: u64 = 150;

/// Relative weights of [MoveLeft, MoveRight, SoftDrop, Rotate, HardDrop]
const WEIGHTS: [u32; 5] = [4, 4, 2, 3, 1];

fn random_command(rng: &mut impl Rng) -> PlayerCommand {
    let commands = [
        PlayerCommand::MoveLeft,
        PlayerCommand::MoveRight,
        PlayerCommand::SoftDrop,
        PlayerCommand::Rotate,
        PlayerCommand::HardDrop,
    ];
    let total: u32 = WEIGHTS.iter().sum();
    let mut roll = rng.gen_range(0..total);
    for (cmd, w) in commands.iter().zip(WEIGHTS) {
        if roll < w {
            return *cmd;
        }
        roll -= w;
    }
    PlayerCommand::HardDrop
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let addr: SocketAddr = std::env::var("TETRIS_BATTLE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()
        .context("TETRIS_BATTLE_ADDR must be host:port")?;

    let options = ClientOptions {
        room_id: std::env::var("TETRIS_BATTLE_ROOM").ok(),
        nickname: std::env::var("TETRIS_BATTLE_NICKNAME").ok(),
        auto_start: env_flag("TETRIS_BATTLE_AUTO_START").then(MatchOptions::default),
        seed: None,
    };

    let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>(16);
    tokio::spawn(async move {
        let mut rng = rand::rngs::StdRng::from_entropy();
        loop {
            tokio::time::sleep(Duration::from_millis(THINK_MS)).await;
            if cmd_tx.send(random_command(&mut rng)).await.is_err() {
                break;
            }
        }
    });

    let outcome = run_client(addr, options, cmd_rx).await?;
    tracing::info!(
        winner = outcome.winner_id,
        winner_nickname = %outcome.winner_nickname,
        won = outcome.won,
        score = outcome.final_score,
        "bot finished"
    );
    Ok(())
}
