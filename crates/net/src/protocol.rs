//! Protocol module - JSON message types for the room protocol
//!
//! Line-delimited JSON: one object per `\n`-terminated line, tagged by a
//! `"type"` field, camelCase field names.

use serde::{Deserialize, Serialize};

use crate::core::{EngineRules, Grid};
use crate::types::{Difficulty, DEFAULT_LEVEL_UP_INTERVAL_MS};

/// Stable per-connection identity, also used as the player id
pub type PlayerId = usize;

/// Room joined when `joinRoom` names none
pub const DEFAULT_ROOM_ID: &str = "main";

/// Nickname used when `joinRoom` names none
pub const DEFAULT_NICKNAME: &str = "Anonymous";

// ============== Shared payloads ==============

/// Wire form of [`Difficulty`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl From<DifficultyLevel> for Difficulty {
    fn from(value: DifficultyLevel) -> Self {
        match value {
            DifficultyLevel::Easy => Difficulty::Easy,
            DifficultyLevel::Normal => Difficulty::Normal,
            DifficultyLevel::Hard => Difficulty::Hard,
        }
    }
}

impl From<Difficulty> for DifficultyLevel {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyLevel::Easy,
            Difficulty::Normal => DifficultyLevel::Normal,
            Difficulty::Hard => DifficultyLevel::Hard,
        }
    }
}

/// Options chosen when a match starts. Missing fields take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchOptions {
    pub rotation_enabled: bool,
    pub penalty_enabled: bool,
    pub difficulty: DifficultyLevel,
    pub level_up_interval_ms: u32,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            rotation_enabled: true,
            penalty_enabled: true,
            difficulty: DifficultyLevel::Normal,
            level_up_interval_ms: DEFAULT_LEVEL_UP_INTERVAL_MS,
        }
    }
}

impl MatchOptions {
    /// Engine rules implied by these options
    pub fn engine_rules(&self) -> EngineRules {
        EngineRules {
            rotation_enabled: self.rotation_enabled,
            difficulty: self.difficulty.into(),
        }
    }
}

/// One roster entry as broadcast to the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub nickname: String,
    /// Last reported grid, null until the first report of a match
    pub board: Option<Grid>,
    pub score: u32,
    pub level: u32,
    pub topped_out: bool,
}

// ============== Client -> Server Messages ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nickname: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    StartGame {
        #[serde(default)]
        options: MatchOptions,
    },
    #[serde(rename_all = "camelCase")]
    UpdateBoard {
        board: Grid,
        score: u32,
        level: u32,
        #[serde(default)]
        lines_cleared: u32,
    },
    GameOver,
    LeaveRoom,
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Welcome { player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    PlayerList { players: Vec<PlayerView> },
    #[serde(rename_all = "camelCase")]
    RoomInfo { room_id: String, player_count: usize },
    #[serde(rename_all = "camelCase")]
    GameStarted { options: MatchOptions },
    #[serde(rename_all = "camelCase")]
    UpdateOpponentBoard { players: Vec<PlayerView> },
    #[serde(rename_all = "camelCase")]
    AddPenaltyLines { lines: u32, from: String },
    #[serde(rename_all = "camelCase")]
    GameEnded {
        winner_id: PlayerId,
        winner_nickname: String,
    },
    #[serde(rename_all = "camelCase")]
    LeftRoom { room_id: String },
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

/// Parse one inbound line
pub fn parse_client_message(line: &str) -> serde_json::Result<ClientMessage> {
    serde_json::from_str(line)
}

/// Parse one outbound line
pub fn parse_server_message(line: &str) -> serde_json::Result<ServerMessage> {
    serde_json::from_str(line)
}

/// Serialize a message into `buf` followed by a newline
pub fn write_line<T: Serialize>(buf: &mut Vec<u8>, msg: &T) -> serde_json::Result<()> {
    serde_json::to_writer(&mut *buf, msg)?;
    buf.push(b'\n');
    Ok(())
}
