//! Room coordinator - the single writer for every room
//!
//! One task owns the [`SessionDirectory`] and the connection -> room map and
//! applies inbound commands strictly one at a time, so no two transitions on a
//! room can interleave. Results go out as [`OutboundMessage`]s; delivery is
//! fire-and-forget.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::directory::SessionDirectory;
use crate::error::SessionError;
use crate::protocol::{ClientMessage, PlayerId, ServerMessage, DEFAULT_NICKNAME};
use crate::room::{BoardUpdate, Dispatch, Room};
use crate::runtime::{InboundCommand, InboundPayload, OutboundMessage};

pub struct Coordinator {
    directory: SessionDirectory,
    memberships: HashMap<PlayerId, String>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    room_max_age: Duration,
}

impl Coordinator {
    pub fn new(config: &ServerConfig, outbound: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self {
            directory: SessionDirectory::new(config.default_room.clone(), Instant::now()),
            memberships: HashMap::new(),
            outbound,
            room_max_age: config.room_max_age,
        }
    }

    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    /// Room the connection currently belongs to
    pub fn room_of(&self, client_id: PlayerId) -> Option<&str> {
        self.memberships.get(&client_id).map(String::as_str)
    }

    /// Consume commands until every sender is gone, reaping old rooms on a timer
    pub async fn run(mut self, mut inbound: mpsc::Receiver<InboundCommand>, reap_interval: Duration) {
        let mut reaper = tokio::time::interval(reap_interval);
        // The first tick completes immediately.
        reaper.tick().await;

        loop {
            tokio::select! {
                cmd = inbound.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.handle(cmd, Instant::now());
                }
                _ = reaper.tick() => {
                    self.reap(Instant::now());
                }
            }
        }

        debug!("coordinator stopped");
    }

    /// Apply one inbound command
    pub fn handle(&mut self, cmd: InboundCommand, now: Instant) {
        let client_id = cmd.client_id;
        let result = match cmd.payload {
            InboundPayload::Message(msg) => self.handle_message(client_id, msg, now),
            InboundPayload::Disconnected => {
                debug!(client_id, "disconnected");
                self.leave(client_id).map(|_| ())
            }
        };

        if let Err(err) = result {
            self.reject(client_id, err);
        }
    }

    fn handle_message(
        &mut self,
        client_id: PlayerId,
        msg: ClientMessage,
        now: Instant,
    ) -> Result<(), SessionError> {
        match msg {
            ClientMessage::JoinRoom { room_id, nickname } => {
                let room_id = room_id
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| self.directory.default_room().to_string());
                let nickname = nickname
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_NICKNAME.to_string());
                self.join(client_id, room_id, nickname, now)
            }
            ClientMessage::StartGame { options } => {
                let room = member_room(&self.memberships, &mut self.directory, client_id)?;
                let dispatches = room.request_start(options, now)?;
                info!(room = room.id(), players = room.players().len(), ?options, "game started");
                deliver(&self.outbound, room, dispatches);
                Ok(())
            }
            ClientMessage::UpdateBoard {
                board,
                score,
                level,
                lines_cleared,
            } => {
                let room = member_room(&self.memberships, &mut self.directory, client_id)?;
                let dispatches = room.report_update(
                    client_id,
                    BoardUpdate {
                        board,
                        score,
                        level,
                        lines_cleared,
                    },
                )?;
                deliver(&self.outbound, room, dispatches);
                Ok(())
            }
            ClientMessage::GameOver => {
                let room = member_room(&self.memberships, &mut self.directory, client_id)?;
                let dispatches = room.report_top_out(client_id)?;
                log_match_end(room, &dispatches);
                deliver(&self.outbound, room, dispatches);
                Ok(())
            }
            ClientMessage::LeaveRoom => {
                let room_id = self.leave(client_id)?;
                self.send(client_id, ServerMessage::LeftRoom { room_id });
                Ok(())
            }
        }
    }

    fn join(
        &mut self,
        client_id: PlayerId,
        room_id: String,
        nickname: String,
        now: Instant,
    ) -> Result<(), SessionError> {
        if let Some(current) = self.memberships.get(&client_id) {
            return Err(SessionError::AlreadyInRoom {
                room_id: current.clone(),
            });
        }

        let created = !self.directory.contains(&room_id);
        let room = self.directory.get_or_create(&room_id, now);
        let result = room.join(client_id, nickname.clone(), now);
        match result {
            Ok(dispatches) => {
                info!(client_id, room = %room_id, %nickname, "player joined");
                deliver(&self.outbound, room, dispatches);
                self.memberships.insert(client_id, room_id);
                Ok(())
            }
            Err(err) => {
                if created {
                    self.directory.remove_if_empty(&room_id);
                }
                Err(err)
            }
        }
    }

    /// Remove the connection from its room. Returns the room id it left.
    fn leave(&mut self, client_id: PlayerId) -> Result<String, SessionError> {
        let room_id = self
            .memberships
            .remove(&client_id)
            .ok_or(SessionError::UnknownRoom)?;
        let Some(room) = self.directory.get_mut(&room_id) else {
            return Err(SessionError::UnknownRoom);
        };

        let dispatches = room.leave(client_id)?;
        info!(client_id, room = %room_id, remaining = room.players().len(), "player left");
        log_match_end(room, &dispatches);
        deliver(&self.outbound, room, dispatches);

        if self.directory.remove_if_empty(&room_id) {
            info!(room = %room_id, "room removed (no players)");
        }
        Ok(room_id)
    }

    /// Destroy every expired room, telling its members first
    pub fn reap(&mut self, now: Instant) {
        for room in self.directory.reap_expired(now, self.room_max_age) {
            deliver(&self.outbound, &room, room.expire());
            for p in room.players() {
                self.memberships.remove(&p.id);
            }
            info!(room = room.id(), players = room.players().len(), "room removed (expired)");
        }
    }

    fn reject(&self, client_id: PlayerId, err: SessionError) {
        if err.is_silent() {
            debug!(client_id, %err, "dropped command");
            return;
        }
        warn!(client_id, %err, "rejected command");
        self.send(client_id, ServerMessage::error(err.to_string()));
    }

    fn send(&self, client_id: PlayerId, message: ServerMessage) {
        let _ = self
            .outbound
            .send(OutboundMessage::ToClient { client_id, message });
    }
}

fn member_room<'a>(
    memberships: &HashMap<PlayerId, String>,
    directory: &'a mut SessionDirectory,
    client_id: PlayerId,
) -> Result<&'a mut Room, SessionError> {
    let room_id = memberships.get(&client_id).ok_or(SessionError::UnknownRoom)?;
    directory.get_mut(room_id).ok_or(SessionError::UnknownRoom)
}

/// Resolve each dispatch against the room's current roster and queue it
fn deliver(
    outbound: &mpsc::UnboundedSender<OutboundMessage>,
    room: &Room,
    dispatches: Vec<Dispatch>,
) {
    for Dispatch { audience, message } in dispatches {
        let client_ids = room.recipients(audience);
        if client_ids.is_empty() {
            continue;
        }
        let _ = outbound.send(OutboundMessage::ToClients {
            client_ids,
            message,
        });
    }
}

fn log_match_end(room: &Room, dispatches: &[Dispatch]) {
    for d in dispatches {
        if let ServerMessage::GameEnded {
            winner_id,
            winner_nickname,
        } = &d.message
        {
            info!(room = room.id(), winner = winner_id, %winner_nickname, "game ended");
        }
    }
}
