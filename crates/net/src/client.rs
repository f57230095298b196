//! Player-side match client
//!
//! [`MatchClient`] couples one [`BoardEngine`] to the room protocol without
//! doing any I/O: server messages go in, client messages come out.
//! [`run_client`] drives it over TCP with gravity, level-up timer, server
//! input and player commands multiplexed in one `select!` loop.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context};
use arrayvec::ArrayVec;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::core::{BoardEngine, EngineReport, EngineRules};
use crate::protocol::{
    parse_server_message, write_line, ClientMessage, MatchOptions, PlayerId, PlayerView,
    ServerMessage,
};
use crate::types::PlayerCommand;

/// Messages produced by one client step. A lock that tops out yields both the
/// final board and `gameOver`.
pub type Outgoing = ArrayVec<ClientMessage, 2>;

/// How a match ended from this client's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub winner_id: PlayerId,
    pub winner_nickname: String,
    pub won: bool,
    /// Own score when the match ended
    pub final_score: u32,
}

#[derive(Debug, Clone)]
pub struct MatchClient {
    engine: BoardEngine,
    player_id: Option<PlayerId>,
    options: Option<MatchOptions>,
    roster: Vec<PlayerView>,
    opponents: Vec<PlayerView>,
    in_match: bool,
    /// Start options to request once a second player is present and this
    /// client is the first in the roster
    auto_start: Option<MatchOptions>,
    start_requested: bool,
    outcome: Option<MatchOutcome>,
}

impl MatchClient {
    pub fn new(seed: u64) -> Self {
        Self {
            engine: BoardEngine::new(seed, EngineRules::default()),
            player_id: None,
            options: None,
            roster: Vec::new(),
            opponents: Vec::new(),
            in_match: false,
            auto_start: None,
            start_requested: false,
            outcome: None,
        }
    }

    pub fn with_auto_start(mut self, options: MatchOptions) -> Self {
        self.auto_start = Some(options);
        self
    }

    pub fn engine(&self) -> &BoardEngine {
        &self.engine
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    pub fn options(&self) -> Option<MatchOptions> {
        self.options
    }

    pub fn roster(&self) -> &[PlayerView] {
        &self.roster
    }

    /// Last reported state of every other participant
    pub fn opponents(&self) -> &[PlayerView] {
        &self.opponents
    }

    pub fn in_match(&self) -> bool {
        self.in_match
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    /// Whether timers and commands should currently drive the engine
    pub fn is_running(&self) -> bool {
        self.in_match && !self.engine.game_over()
    }

    pub fn fall_interval(&self) -> Duration {
        Duration::from_millis(self.engine.fall_interval_ms() as u64)
    }

    pub fn level_up_interval(&self) -> Duration {
        let ms = self
            .options
            .map(|o| o.level_up_interval_ms)
            .unwrap_or_default();
        Duration::from_millis(ms.max(1) as u64)
    }

    /// Apply one server message and return what to send back
    pub fn handle_server_message(&mut self, msg: &ServerMessage) -> Outgoing {
        let mut out = Outgoing::new();
        match msg {
            ServerMessage::Welcome { player_id } => {
                self.player_id = Some(*player_id);
            }
            ServerMessage::PlayerList { players } => {
                self.roster = players.clone();
                // A pending start is moot once the opponent is gone; ask again
                // when the next one joins.
                if self.roster.len() < 2 {
                    self.start_requested = false;
                }
                if let Some(start) = self.maybe_auto_start() {
                    out.push(start);
                }
            }
            ServerMessage::RoomInfo { .. } => {}
            ServerMessage::GameStarted { options } => {
                self.options = Some(*options);
                self.opponents.clear();
                self.outcome = None;
                self.start_requested = false;
                self.in_match = true;
                self.engine.reset(options.engine_rules());
                let report = self.engine.start();
                self.push_report(&mut out, report, true);
            }
            ServerMessage::UpdateOpponentBoard { players } => {
                let own = self.player_id;
                self.opponents = players
                    .iter()
                    .filter(|p| Some(p.id) != own)
                    .cloned()
                    .collect();
            }
            ServerMessage::AddPenaltyLines { lines, .. } => {
                if self.is_running() {
                    self.engine.add_penalty_lines(*lines as usize);
                    self.push_report(&mut out, EngineReport::default(), true);
                }
            }
            ServerMessage::GameEnded {
                winner_id,
                winner_nickname,
            } => {
                self.in_match = false;
                self.outcome = Some(MatchOutcome {
                    winner_id: *winner_id,
                    winner_nickname: winner_nickname.clone(),
                    won: self.player_id == Some(*winner_id),
                    final_score: self.engine.score(),
                });
            }
            ServerMessage::LeftRoom { .. } => {
                self.in_match = false;
                self.roster.clear();
                self.opponents.clear();
            }
            ServerMessage::Error { .. } => {
                // A rejected start leaves the lobby as it was.
                if !self.in_match {
                    self.start_requested = false;
                }
            }
        }
        out
    }

    /// One gravity step
    pub fn on_gravity(&mut self) -> Outgoing {
        let mut out = Outgoing::new();
        if self.is_running() {
            let report = self.engine.tick();
            self.push_report(&mut out, report, false);
        }
        out
    }

    /// One level-up timer expiry
    pub fn on_level_up(&mut self) -> Outgoing {
        let mut out = Outgoing::new();
        if self.is_running() {
            self.engine.increase_level();
            self.push_report(&mut out, EngineReport::default(), true);
        }
        out
    }

    /// One player input command
    pub fn on_command(&mut self, command: PlayerCommand) -> Outgoing {
        let mut out = Outgoing::new();
        if self.is_running() {
            let report = self.engine.apply_command(command);
            self.push_report(&mut out, report, false);
        }
        out
    }

    fn maybe_auto_start(&mut self) -> Option<ClientMessage> {
        let options = self.auto_start?;
        if self.in_match || self.start_requested || self.roster.len() < 2 {
            return None;
        }
        let host = self.roster.first().map(|p| p.id);
        if host.is_none() || host != self.player_id {
            return None;
        }
        self.start_requested = true;
        Some(ClientMessage::StartGame { options })
    }

    fn push_report(&self, out: &mut Outgoing, report: EngineReport, force: bool) {
        if force || report.changed() {
            let snapshot = self.engine.snapshot();
            out.push(ClientMessage::UpdateBoard {
                board: snapshot.board,
                score: snapshot.score,
                level: snapshot.level,
                lines_cleared: report.lines_cleared,
            });
        }
        if report.topped_out {
            out.push(ClientMessage::GameOver);
        }
    }
}

/// Connection settings for [`run_client`]
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub room_id: Option<String>,
    pub nickname: Option<String>,
    /// Request a match with these options once another player joins
    pub auto_start: Option<MatchOptions>,
    /// Engine seed; random when absent
    pub seed: Option<u64>,
}

/// Join a room and play until the first match ends
pub async fn run_client(
    addr: SocketAddr,
    options: ClientOptions,
    mut commands: mpsc::Receiver<PlayerCommand>,
) -> anyhow::Result<MatchOutcome> {
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let mut client = MatchClient::new(options.seed.unwrap_or_else(rand::random));
    if let Some(start) = options.auto_start {
        client = client.with_auto_start(start);
    }

    let mut buf = Vec::with_capacity(1024);
    send(
        &mut writer,
        &mut buf,
        &ClientMessage::JoinRoom {
            room_id: options.room_id,
            nickname: options.nickname,
        },
    )
    .await?;

    let mut next_gravity = Instant::now();
    let mut next_level_up = Instant::now();
    let mut commands_open = true;

    loop {
        let running = client.is_running();
        let outgoing = tokio::select! {
            _ = tokio::time::sleep_until(next_gravity), if running => {
                next_gravity = Instant::now() + client.fall_interval();
                client.on_gravity()
            }
            _ = tokio::time::sleep_until(next_level_up), if running => {
                next_level_up = Instant::now() + client.level_up_interval();
                client.on_level_up()
            }
            cmd = commands.recv(), if commands_open => match cmd {
                Some(cmd) => client.on_command(cmd),
                None => {
                    commands_open = false;
                    Outgoing::new()
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    bail!("server closed the connection");
                };
                let msg = match parse_server_message(line.trim()) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(error = %e, "unparseable server line");
                        continue;
                    }
                };
                debug!(?msg, "received");
                let outgoing = client.handle_server_message(&msg);
                match &msg {
                    ServerMessage::GameStarted { options } => {
                        info!(?options, seed = client.engine().seed(), "match started");
                        let now = Instant::now();
                        next_gravity = now + client.fall_interval();
                        next_level_up = now + client.level_up_interval();
                    }
                    ServerMessage::Error { message } => warn!(%message, "server error"),
                    _ => {}
                }
                outgoing
            }
        };

        for msg in &outgoing {
            send(&mut writer, &mut buf, msg).await?;
        }

        if let Some(outcome) = client.outcome() {
            info!(
                winner = outcome.winner_id,
                winner_nickname = %outcome.winner_nickname,
                won = outcome.won,
                score = outcome.final_score,
                "match ended"
            );
            return Ok(outcome.clone());
        }
    }
}

async fn send(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    buf: &mut Vec<u8>,
    msg: &ClientMessage,
) -> anyhow::Result<()> {
    buf.clear();
    write_line(buf, msg)?;
    writer.write_all(buf).await?;
    writer.flush().await?;
    Ok(())
}
