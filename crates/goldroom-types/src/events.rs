use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, Participant};

/// Row sets a gateway connection can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Participants,
    Messages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowChange {
    Insert,
    Update,
}

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Sent once right after the socket is accepted
    Ready { connection_id: Uuid },

    /// Acknowledges a Subscribe command
    Subscribed { room_id: Uuid, tables: Vec<Table> },

    /// A participant row was inserted or updated
    ParticipantChanged {
        change: RowChange,
        participant: Participant,
    },

    /// A chat message was inserted
    MessageCreated { message: Message },
}

impl GatewayEvent {
    /// Room and table this event belongs to. Control events return `None`
    /// and are never fanned out through the broadcast channel.
    pub fn scope(&self) -> Option<(Uuid, Table)> {
        match self {
            Self::ParticipantChanged { participant, .. } => {
                Some((participant.room_id, Table::Participants))
            }
            Self::MessageCreated { message } => Some((message.room_id, Table::Messages)),
            Self::Ready { .. } | Self::Subscribed { .. } => None,
        }
    }
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Replace this connection's subscription with the given room and tables.
    Subscribe { room_id: Uuid, tables: Vec<Table> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn participant(room_id: Uuid) -> Participant {
        Participant {
            id: Uuid::new_v4(),
            room_id,
            display_name: "Lina".into(),
            is_muted: false,
            is_video_off: false,
            is_online: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_events_are_scoped_to_room_and_table() {
        let room_id = Uuid::new_v4();
        let event = GatewayEvent::ParticipantChanged {
            change: RowChange::Update,
            participant: participant(room_id),
        };
        assert_eq!(event.scope(), Some((room_id, Table::Participants)));

        let ready = GatewayEvent::Ready { connection_id: Uuid::new_v4() };
        assert_eq!(ready.scope(), None);
    }

    #[test]
    fn subscribe_command_wire_format() {
        let room_id = Uuid::nil();
        let raw = format!(
            r#"{{"type":"Subscribe","data":{{"room_id":"{}","tables":["participants","messages"]}}}}"#,
            room_id
        );
        let cmd: GatewayCommand = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            cmd,
            GatewayCommand::Subscribe {
                room_id,
                tables: vec![Table::Participants, Table::Messages],
            }
        );
    }
}
