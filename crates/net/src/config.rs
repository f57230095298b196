use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use crate::protocol::DEFAULT_ROOM_ID;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Room that always exists and is never destroyed
    pub default_room: String,
    /// Capacity of the inbound command queue feeding the coordinator
    pub max_pending_commands: usize,
    /// Rooms older than this are reaped
    pub room_max_age: Duration,
    /// How often the reaper runs
    pub reap_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            default_room: DEFAULT_ROOM_ID.to_string(),
            max_pending_commands: 256,
            room_max_age: Duration::from_secs(60 * 60),
            reap_interval: Duration::from_secs(30 * 60),
        }
    }
}

impl ServerConfig {
    /// Create from `TETRIS_BATTLE_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();

        let host = env::var("TETRIS_BATTLE_HOST").unwrap_or(defaults.host);
        let port = env_parse("TETRIS_BATTLE_PORT").unwrap_or(defaults.port);
        let default_room = env::var("TETRIS_BATTLE_DEFAULT_ROOM")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.default_room);
        let max_pending_commands =
            env_parse("TETRIS_BATTLE_MAX_PENDING").unwrap_or(defaults.max_pending_commands);
        let room_max_age = env_parse("TETRIS_BATTLE_ROOM_MAX_AGE_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.room_max_age);
        let reap_interval = env_parse("TETRIS_BATTLE_REAP_INTERVAL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.reap_interval);

        Self {
            host,
            port,
            default_room,
            max_pending_commands,
            room_max_age,
            reap_interval,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
