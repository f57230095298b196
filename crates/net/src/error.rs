use thiserror::Error;

/// Rejections produced by the room coordinator.
///
/// The `Display` text is sent verbatim to the client in an `error` message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Room {room_id} has already started a game")]
    RoomUnavailable { room_id: String },

    #[error("At least 2 players are needed to start a game ({count} in room)")]
    InsufficientPlayers { count: usize },

    #[error("The game has already started")]
    AlreadyStarted,

    #[error("Already in room {room_id}; leave it first")]
    AlreadyInRoom { room_id: String },

    #[error("No game in progress")]
    NotInProgress,

    #[error("Not in a room")]
    UnknownRoom,

    #[error("Not a member of this room")]
    UnknownPlayer,

    #[error("Room {room_id} was removed because it was too old")]
    StaleRoomExpired { room_id: String },
}

impl SessionError {
    /// Errors caused by a race with a just-completed leave or match end.
    /// These are dropped instead of being reported to the client.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            SessionError::UnknownRoom | SessionError::UnknownPlayer | SessionError::NotInProgress
        )
    }
}
