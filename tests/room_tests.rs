//! Room rules through the coordinator: membership, match lifecycle, winners

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use tetris_battle::net::{
    ClientMessage, Coordinator, InboundCommand, MatchOptions, OutboundMessage, PlayerId,
    RoomPhase, ServerConfig, ServerMessage,
};

struct Harness {
    coordinator: Coordinator,
    out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    now: Instant,
}

impl Harness {
    fn new() -> Self {
        let (tx, out_rx) = mpsc::unbounded_channel();
        Self {
            coordinator: Coordinator::new(&ServerConfig::default(), tx),
            out_rx,
            now: Instant::now(),
        }
    }

    fn send(&mut self, client_id: PlayerId, msg: ClientMessage) {
        self.coordinator
            .handle(InboundCommand::message(client_id, msg), self.now);
    }

    fn join(&mut self, client_id: PlayerId, room: &str) {
        self.send(
            client_id,
            ClientMessage::JoinRoom {
                room_id: Some(room.into()),
                nickname: Some(format!("player{client_id}")),
            },
        );
    }

    fn report(&mut self, client_id: PlayerId, score: u32, lines_cleared: u32) {
        self.send(
            client_id,
            ClientMessage::UpdateBoard {
                board: [[0; 10]; 20],
                score,
                level: 1,
                lines_cleared,
            },
        );
    }

    fn drain(&mut self) {
        while self.out_rx.try_recv().is_ok() {}
    }

    fn messages_for(&mut self, client_id: PlayerId) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.out_rx.try_recv() {
            match msg {
                OutboundMessage::ToClient {
                    client_id: id,
                    message,
                } if id == client_id => out.push(message),
                OutboundMessage::ToClients {
                    client_ids,
                    message,
                } if client_ids.contains(&client_id) => out.push(message),
                _ => {}
            }
        }
        out
    }

    fn phase(&self, room: &str) -> Option<RoomPhase> {
        self.coordinator.directory().get(room).map(|r| r.phase())
    }
}

fn winner(messages: &[ServerMessage]) -> Option<PlayerId> {
    messages.iter().find_map(|m| match m {
        ServerMessage::GameEnded { winner_id, .. } => Some(*winner_id),
        _ => None,
    })
}

#[test]
fn test_full_match_highest_score_wins() {
    let mut h = Harness::new();
    for id in 1..=3 {
        h.join(id, "arena");
    }
    h.send(2, ClientMessage::StartGame { options: MatchOptions::default() });
    assert_eq!(h.phase("arena"), Some(RoomPhase::InProgress));

    h.report(1, 100, 1);
    h.report(2, 700, 0);
    h.report(3, 300, 2);

    h.send(2, ClientMessage::GameOver);
    h.send(1, ClientMessage::GameOver);
    assert_eq!(h.phase("arena"), Some(RoomPhase::InProgress));
    h.send(3, ClientMessage::GameOver);

    let msgs = h.messages_for(1);
    assert_eq!(winner(&msgs), Some(2));
    assert_eq!(h.phase("arena"), Some(RoomPhase::Ended));

    // Players stay seated and can rematch.
    h.send(1, ClientMessage::StartGame { options: MatchOptions::default() });
    assert_eq!(h.phase("arena"), Some(RoomPhase::InProgress));
}

#[test]
fn test_penalty_fanout_reaches_everyone_but_sender() {
    let mut h = Harness::new();
    for id in 1..=3 {
        h.join(id, "arena");
    }
    h.send(1, ClientMessage::StartGame { options: MatchOptions::default() });
    h.drain();

    h.report(2, 200, 2);
    let mut deliveries = Vec::new();
    while let Ok(OutboundMessage::ToClients {
        client_ids,
        message,
    }) = h.out_rx.try_recv()
    {
        deliveries.push((client_ids, message));
    }

    assert_eq!(deliveries.len(), 2);
    assert!(deliveries.iter().all(|(ids, _)| ids == &vec![1, 3]));
    assert!(matches!(
        &deliveries[1].1,
        ServerMessage::AddPenaltyLines { lines: 2, from } if from == "player2"
    ));
}

#[test]
fn test_penalty_disabled_by_options() {
    let mut h = Harness::new();
    h.join(1, "arena");
    h.join(2, "arena");
    h.send(
        1,
        ClientMessage::StartGame {
            options: MatchOptions {
                penalty_enabled: false,
                ..MatchOptions::default()
            },
        },
    );
    h.drain();

    h.report(1, 400, 4);
    let msgs = h.messages_for(2);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(msgs[0], ServerMessage::UpdateOpponentBoard { .. }));
}

#[test]
fn test_late_joiner_rejected_during_match() {
    let mut h = Harness::new();
    h.join(1, "arena");
    h.join(2, "arena");
    h.send(1, ClientMessage::StartGame { options: MatchOptions::default() });
    h.drain();

    h.join(3, "arena");
    let msgs = h.messages_for(3);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(msgs[0], ServerMessage::Error { .. }));
    assert_eq!(h.coordinator.room_of(3), None);
}

#[test]
fn test_forfeit_after_disconnect() {
    let mut h = Harness::new();
    h.join(1, "arena");
    h.join(2, "arena");
    h.send(1, ClientMessage::StartGame { options: MatchOptions::default() });
    h.report(1, 5000, 0);
    h.drain();

    h.coordinator
        .handle(InboundCommand::disconnected(1), h.now);
    let msgs = h.messages_for(2);

    // Roster first, then the forfeit result.
    assert!(matches!(msgs[0], ServerMessage::PlayerList { ref players } if players.len() == 1));
    assert_eq!(winner(&msgs), Some(2));
}

#[test]
fn test_rooms_are_isolated() {
    let mut h = Harness::new();
    h.join(1, "a");
    h.join(2, "a");
    h.join(3, "b");
    h.send(1, ClientMessage::StartGame { options: MatchOptions::default() });

    let msgs = h.messages_for(3);
    assert!(msgs
        .iter()
        .all(|m| !matches!(m, ServerMessage::GameStarted { .. })));
    assert_eq!(h.phase("b"), Some(RoomPhase::Lobby));
}

#[test]
fn test_stale_rooms_reaped_default_kept() {
    let mut h = Harness::new();
    h.join(1, "old");
    let later = h.now + Duration::from_secs(3601);
    h.coordinator.reap(later);

    assert!(!h.coordinator.directory().contains("old"));
    assert!(h.coordinator.directory().contains("main"));
    assert_eq!(h.coordinator.room_of(1), None);
}

#[test]
fn test_coordinator_task_applies_commands_in_order() {
    tokio_test::block_on(async {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let coordinator = Coordinator::new(&ServerConfig::default(), out_tx);
        let task = tokio::spawn(coordinator.run(cmd_rx, Duration::from_secs(60)));

        for id in 1..=2 {
            cmd_tx
                .send(InboundCommand::message(
                    id,
                    ClientMessage::JoinRoom {
                        room_id: None,
                        nickname: None,
                    },
                ))
                .await
                .unwrap();
        }
        cmd_tx
            .send(InboundCommand::message(
                1,
                ClientMessage::StartGame {
                    options: MatchOptions::default(),
                },
            ))
            .await
            .unwrap();
        drop(cmd_tx);
        task.await.unwrap();

        let mut last = None;
        while let Ok(msg) = out_rx.try_recv() {
            last = Some(msg);
        }
        match last {
            Some(OutboundMessage::ToClients {
                client_ids,
                message: ServerMessage::GameStarted { .. },
            }) => assert_eq!(client_ids, vec![1, 2]),
            other => panic!("expected gameStarted last, got {other:?}"),
        }
    });
}
