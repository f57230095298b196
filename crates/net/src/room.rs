//! Room state machine
//!
//! A [`Room`] owns its roster and phase. Every transition takes the current
//! time explicitly and returns the messages it wants delivered as
//! [`Dispatch`] values; resolving audiences to connections is the
//! coordinator's job. Rejections come back as [`SessionError`] and leave the
//! room unchanged.
//!
//! Phases: `Lobby -> InProgress -> Ended`, and `Ended` behaves like `Lobby`
//! for joins and starts.

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use crate::core::Grid;
use crate::error::SessionError;
use crate::protocol::{MatchOptions, PlayerId, PlayerView, ServerMessage};
use crate::types::{MIN_LEVEL_UP_INTERVAL_MS, START_LEVEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Lobby,
    InProgress,
    Ended,
}

/// Who receives a dispatched message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    All,
    AllExcept(PlayerId),
    Only(PlayerId),
}

impl Audience {
    pub fn includes(&self, id: PlayerId) -> bool {
        match *self {
            Audience::All => true,
            Audience::AllExcept(excluded) => id != excluded,
            Audience::Only(target) => id == target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl Dispatch {
    fn new(audience: Audience, message: ServerMessage) -> Self {
        Self { audience, message }
    }
}

/// Board state a participant reports after a tick or clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardUpdate {
    pub board: Grid,
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub board: Option<Grid>,
    pub score: u32,
    pub level: u32,
    pub topped_out: bool,
    pub joined_at: Instant,
    /// Stamped for every roster member when a match starts
    pub started_at: Option<Instant>,
}

impl Player {
    pub fn new(id: PlayerId, nickname: String, now: Instant) -> Self {
        Self {
            id,
            nickname,
            board: None,
            score: 0,
            level: START_LEVEL,
            topped_out: false,
            joined_at: now,
            started_at: None,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            nickname: self.nickname.clone(),
            board: self.board,
            score: self.score,
            level: self.level,
            topped_out: self.topped_out,
        }
    }

    fn reset_match_state(&mut self) {
        self.board = None;
        self.score = 0;
        self.level = START_LEVEL;
        self.topped_out = false;
        self.started_at = None;
    }

    fn match_started_at(&self) -> Instant {
        self.started_at.unwrap_or(self.joined_at)
    }
}

/// Index of the winner: highest score, ties to the earliest match start, then
/// to roster order.
pub fn select_winner(players: &[Player]) -> Option<usize> {
    players
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| (Reverse(p.score), p.match_started_at()))
        .map(|(i, _)| i)
}

#[derive(Debug, Clone)]
pub struct Room {
    id: String,
    players: Vec<Player>,
    phase: RoomPhase,
    options: Option<MatchOptions>,
    created_at: Instant,
    started_at: Option<Instant>,
}

impl Room {
    pub fn new(id: impl Into<String>, now: Instant) -> Self {
        Self {
            id: id.into(),
            players: Vec::new(),
            phase: RoomPhase::Lobby,
            options: None,
            created_at: now,
            started_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        self.phase == RoomPhase::InProgress
    }

    pub fn options(&self) -> Option<MatchOptions> {
        self.options
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn is_expired(&self, now: Instant, max_age: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > max_age
    }

    /// Recipients of `audience` among the current roster
    pub fn recipients(&self, audience: Audience) -> Vec<PlayerId> {
        self.players
            .iter()
            .map(|p| p.id)
            .filter(|id| audience.includes(*id))
            .collect()
    }

    fn views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    fn roster_dispatches(&self) -> Vec<Dispatch> {
        vec![
            Dispatch::new(
                Audience::All,
                ServerMessage::PlayerList {
                    players: self.views(),
                },
            ),
            Dispatch::new(
                Audience::All,
                ServerMessage::RoomInfo {
                    room_id: self.id.clone(),
                    player_count: self.players.len(),
                },
            ),
        ]
    }

    fn position(&self, id: PlayerId) -> Result<usize, SessionError> {
        self.players
            .iter()
            .position(|p| p.id == id)
            .ok_or(SessionError::UnknownPlayer)
    }

    /// Add a player. Rejected while a match is in progress.
    pub fn join(
        &mut self,
        id: PlayerId,
        nickname: impl Into<String>,
        now: Instant,
    ) -> Result<Vec<Dispatch>, SessionError> {
        if self.phase == RoomPhase::InProgress {
            return Err(SessionError::RoomUnavailable {
                room_id: self.id.clone(),
            });
        }
        if self.player(id).is_some() {
            return Err(SessionError::AlreadyInRoom {
                room_id: self.id.clone(),
            });
        }

        self.players.push(Player::new(id, nickname.into(), now));
        self.phase = RoomPhase::Lobby;
        Ok(self.roster_dispatches())
    }

    /// Start a match with `options`. Needs at least two players.
    ///
    /// The level-up interval is raised to `MIN_LEVEL_UP_INTERVAL_MS` before it is
    /// stored and broadcast.
    pub fn request_start(
        &mut self,
        options: MatchOptions,
        now: Instant,
    ) -> Result<Vec<Dispatch>, SessionError> {
        if self.phase == RoomPhase::InProgress {
            return Err(SessionError::AlreadyStarted);
        }
        if self.players.len() < 2 {
            return Err(SessionError::InsufficientPlayers {
                count: self.players.len(),
            });
        }

        let options = MatchOptions {
            level_up_interval_ms: options.level_up_interval_ms.max(MIN_LEVEL_UP_INTERVAL_MS),
            ..options
        };
        self.phase = RoomPhase::InProgress;
        self.options = Some(options);
        self.started_at = Some(now);
        for p in &mut self.players {
            p.reset_match_state();
            p.started_at = Some(now);
        }

        Ok(vec![Dispatch::new(
            Audience::All,
            ServerMessage::GameStarted { options },
        )])
    }

    /// Store a participant's snapshot and fan it out to everyone else
    pub fn report_update(
        &mut self,
        id: PlayerId,
        update: BoardUpdate,
    ) -> Result<Vec<Dispatch>, SessionError> {
        if self.phase != RoomPhase::InProgress {
            return Err(SessionError::NotInProgress);
        }
        let idx = self.position(id)?;

        let player = &mut self.players[idx];
        player.board = Some(update.board);
        player.score = update.score;
        player.level = update.level.max(START_LEVEL);
        let nickname = player.nickname.clone();

        let mut out = vec![Dispatch::new(
            Audience::AllExcept(id),
            ServerMessage::UpdateOpponentBoard {
                players: self.views(),
            },
        )];

        let penalty_enabled = self.options.map(|o| o.penalty_enabled).unwrap_or(false);
        if update.lines_cleared > 0 && penalty_enabled {
            out.push(Dispatch::new(
                Audience::AllExcept(id),
                ServerMessage::AddPenaltyLines {
                    lines: update.lines_cleared,
                    from: nickname,
                },
            ));
        }

        Ok(out)
    }

    /// Mark a participant topped out; ends the match once everyone is
    pub fn report_top_out(&mut self, id: PlayerId) -> Result<Vec<Dispatch>, SessionError> {
        if self.phase != RoomPhase::InProgress {
            return Err(SessionError::NotInProgress);
        }
        let idx = self.position(id)?;
        self.players[idx].topped_out = true;

        if self.players.iter().all(|p| p.topped_out) {
            if let Some(winner) = select_winner(&self.players) {
                return Ok(self.end_match(winner));
            }
        }
        Ok(Vec::new())
    }

    /// Remove a participant.
    ///
    /// The remaining members get the new roster. During a match, a lone
    /// survivor wins by forfeit, and a remainder that is entirely topped out is
    /// scored normally.
    pub fn leave(&mut self, id: PlayerId) -> Result<Vec<Dispatch>, SessionError> {
        let idx = self.position(id)?;
        self.players.remove(idx);

        if self.players.is_empty() {
            self.phase = RoomPhase::Lobby;
            self.options = None;
            self.started_at = None;
            return Ok(Vec::new());
        }

        let mut out = self.roster_dispatches();
        if self.phase == RoomPhase::InProgress {
            if self.players.len() == 1 {
                out.extend(self.end_match(0));
            } else if self.players.iter().all(|p| p.topped_out) {
                if let Some(winner) = select_winner(&self.players) {
                    out.extend(self.end_match(winner));
                }
            }
        }
        Ok(out)
    }

    /// Notice sent to every member before the room is reaped
    pub fn expire(&self) -> Vec<Dispatch> {
        vec![Dispatch::new(
            Audience::All,
            ServerMessage::error(
                SessionError::StaleRoomExpired {
                    room_id: self.id.clone(),
                }
                .to_string(),
            ),
        )]
    }

    /// Announce `winner` and clear every per-match field so a new match can start
    fn end_match(&mut self, winner: usize) -> Vec<Dispatch> {
        let w = &self.players[winner];
        let ended = Dispatch::new(
            Audience::All,
            ServerMessage::GameEnded {
                winner_id: w.id,
                winner_nickname: w.nickname.clone(),
            },
        );

        self.phase = RoomPhase::Ended;
        self.options = None;
        self.started_at = None;
        for p in &mut self.players {
            p.reset_match_state();
        }

        vec![ended]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with(n: usize) -> (Room, Instant) {
        let now = Instant::now();
        let mut room = Room::new("r1", now);
        for id in 1..=n {
            room.join(id, format!("p{id}"), now).unwrap();
        }
        (room, now)
    }

    fn update(score: u32, lines_cleared: u32) -> BoardUpdate {
        BoardUpdate {
            board: [[0u8; 10]; 20],
            score,
            level: 1,
            lines_cleared,
        }
    }

    fn ended_winner(dispatches: &[Dispatch]) -> Option<PlayerId> {
        dispatches.iter().find_map(|d| match d.message {
            ServerMessage::GameEnded { winner_id, .. } => Some(winner_id),
            _ => None,
        })
    }

    #[test]
    fn test_join_broadcasts_roster_and_occupancy() {
        let (mut room, now) = room_with(1);
        let out = room.join(2, "p2", now).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|d| d.audience == Audience::All));
        assert!(matches!(
            &out[1].message,
            ServerMessage::RoomInfo { player_count: 2, .. }
        ));
        assert_eq!(room.players()[1].nickname, "p2");
    }

    #[test]
    fn test_join_rejected_while_in_progress() {
        let (mut room, now) = room_with(2);
        room.request_start(MatchOptions::default(), now).unwrap();
        let err = room.join(3, "late", now).unwrap_err();
        assert_eq!(
            err,
            SessionError::RoomUnavailable {
                room_id: "r1".into()
            }
        );
        assert_eq!(room.players().len(), 2);
    }

    #[test]
    fn test_start_needs_two_players() {
        let (mut room, now) = room_with(1);
        let err = room.request_start(MatchOptions::default(), now).unwrap_err();
        assert_eq!(err, SessionError::InsufficientPlayers { count: 1 });
        assert_eq!(room.phase(), RoomPhase::Lobby);

        room.join(2, "p2", now).unwrap();
        let out = room.request_start(MatchOptions::default(), now).unwrap();
        assert_eq!(room.phase(), RoomPhase::InProgress);
        assert!(matches!(out[0].message, ServerMessage::GameStarted { .. }));
        assert!(room.players().iter().all(|p| p.started_at == Some(now)));
    }

    #[test]
    fn test_zero_level_up_interval_is_raised_to_floor() {
        let (mut room, now) = room_with(2);
        let options = MatchOptions {
            level_up_interval_ms: 0,
            ..MatchOptions::default()
        };
        let out = room.request_start(options, now).unwrap();

        let ServerMessage::GameStarted { options } = &out[0].message else {
            panic!("expected gameStarted");
        };
        assert_eq!(options.level_up_interval_ms, MIN_LEVEL_UP_INTERVAL_MS);
        assert_eq!(
            room.options().map(|o| o.level_up_interval_ms),
            Some(MIN_LEVEL_UP_INTERVAL_MS)
        );
    }

    #[test]
    fn test_start_twice_rejected() {
        let (mut room, now) = room_with(2);
        room.request_start(MatchOptions::default(), now).unwrap();
        assert_eq!(
            room.request_start(MatchOptions::default(), now),
            Err(SessionError::AlreadyStarted)
        );
    }

    #[test]
    fn test_update_excludes_sender_and_sends_penalty() {
        let (mut room, now) = room_with(3);
        room.request_start(MatchOptions::default(), now).unwrap();

        let out = room.report_update(2, update(200, 2)).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|d| d.audience == Audience::AllExcept(2)));
        assert_eq!(room.recipients(out[0].audience), vec![1, 3]);
        assert_eq!(
            out[1].message,
            ServerMessage::AddPenaltyLines {
                lines: 2,
                from: "p2".into()
            }
        );
        assert_eq!(room.player(2).unwrap().score, 200);
    }

    #[test]
    fn test_no_penalty_when_disabled() {
        let (mut room, now) = room_with(2);
        let options = MatchOptions {
            penalty_enabled: false,
            ..MatchOptions::default()
        };
        room.request_start(options, now).unwrap();
        let out = room.report_update(1, update(100, 1)).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_update_outside_match_is_rejected() {
        let (mut room, _) = room_with(2);
        assert_eq!(
            room.report_update(1, update(0, 0)),
            Err(SessionError::NotInProgress)
        );
    }

    #[test]
    fn test_winner_is_highest_score_then_earliest_start() {
        let t1 = Instant::now();
        let t2 = t1 + Duration::from_millis(10);
        let t3 = t1 + Duration::from_millis(20);

        let mut players: Vec<Player> = (1..=3).map(|i| Player::new(i, format!("p{i}"), t1)).collect();
        for (p, (score, started)) in players.iter_mut().zip([(50, t2), (80, t1), (80, t3)]) {
            p.score = score;
            p.started_at = Some(started);
        }

        assert_eq!(select_winner(&players), Some(1));
    }

    #[test]
    fn test_winner_tie_with_shared_start_goes_to_first_joined() {
        let (mut room, now) = room_with(3);
        room.request_start(MatchOptions::default(), now).unwrap();
        room.report_update(2, update(300, 0)).unwrap();
        room.report_update(3, update(300, 0)).unwrap();

        assert!(room.report_top_out(3).unwrap().is_empty());
        assert!(room.report_top_out(1).unwrap().is_empty());
        let out = room.report_top_out(2).unwrap();
        assert_eq!(ended_winner(&out), Some(2));
    }

    #[test]
    fn test_match_end_resets_room() {
        let (mut room, now) = room_with(2);
        room.request_start(MatchOptions::default(), now).unwrap();
        room.report_update(1, update(500, 0)).unwrap();
        room.report_top_out(1).unwrap();
        let out = room.report_top_out(2).unwrap();

        assert_eq!(ended_winner(&out), Some(1));
        assert_eq!(room.phase(), RoomPhase::Ended);
        assert!(room.options().is_none());
        for p in room.players() {
            assert_eq!(p.score, 0);
            assert_eq!(p.level, START_LEVEL);
            assert!(!p.topped_out);
            assert!(p.board.is_none());
        }

        // A new match can begin without re-joining.
        assert!(room.request_start(MatchOptions::default(), now).is_ok());
    }

    #[test]
    fn test_leave_forfeit_declares_survivor() {
        let (mut room, now) = room_with(2);
        room.request_start(MatchOptions::default(), now).unwrap();
        room.report_update(1, update(900, 0)).unwrap();

        let out = room.leave(1).unwrap();
        assert_eq!(ended_winner(&out), Some(2));
        assert_eq!(room.phase(), RoomPhase::Ended);
    }

    #[test]
    fn test_leave_with_topped_out_remainder_scores_normally() {
        let (mut room, now) = room_with(3);
        room.request_start(MatchOptions::default(), now).unwrap();
        room.report_update(2, update(100, 0)).unwrap();
        room.report_update(3, update(400, 0)).unwrap();
        room.report_top_out(2).unwrap();
        room.report_top_out(3).unwrap();

        let out = room.leave(1).unwrap();
        assert_eq!(ended_winner(&out), Some(3));
    }

    #[test]
    fn test_leave_in_lobby_rebroadcasts_roster() {
        let (mut room, _) = room_with(3);
        let out = room.leave(2).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(ended_winner(&out), None);
        assert_eq!(room.recipients(Audience::All), vec![1, 3]);
    }

    #[test]
    fn test_last_leave_empties_room() {
        let (mut room, now) = room_with(2);
        room.request_start(MatchOptions::default(), now).unwrap();
        room.leave(1).unwrap();
        room.leave(2).unwrap();
        assert!(room.is_empty());
        assert_eq!(room.leave(2), Err(SessionError::UnknownPlayer));
    }

    #[test]
    fn test_expiry() {
        let now = Instant::now();
        let room = Room::new("old", now);
        let max_age = Duration::from_secs(3600);
        assert!(!room.is_expired(now + Duration::from_secs(10), max_age));
        assert!(room.is_expired(now + Duration::from_secs(3601), max_age));
        assert!(matches!(room.expire()[0].message, ServerMessage::Error { .. }));
    }
}
