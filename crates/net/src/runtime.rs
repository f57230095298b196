//! Channel message types between the TCP transport and the coordinator.

use crate::protocol::{ClientMessage, PlayerId, ServerMessage};

/// Command delivered to the coordinator.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: PlayerId,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    Message(ClientMessage),
    /// The connection closed; treated as a leave
    Disconnected,
}

impl InboundCommand {
    pub fn message(client_id: PlayerId, message: ClientMessage) -> Self {
        Self {
            client_id,
            payload: InboundPayload::Message(message),
        }
    }

    pub fn disconnected(client_id: PlayerId) -> Self {
        Self {
            client_id,
            payload: InboundPayload::Disconnected,
        }
    }
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient {
        client_id: PlayerId,
        message: ServerMessage,
    },
    ToClients {
        client_ids: Vec<PlayerId>,
        message: ServerMessage,
    },
}
