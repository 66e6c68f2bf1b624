//! In-memory [`Backend`] for state tests, with switches to make calls fail.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;
use tokio::sync::Notify;
use uuid::Uuid;

use goldroom_types::api::ParticipantUpdate;
use goldroom_types::models::{Message, Participant, Room};

use crate::backend::Backend;
use crate::error::ClientError;

#[derive(Default)]
struct Tables {
    rooms: Vec<Room>,
    participants: Vec<Participant>,
    messages: Vec<Message>,
}

/// Holds writes inside the backend until the test releases them, so state
/// can be inspected while a call is in flight.
#[derive(Default)]
pub(crate) struct Gate {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Resolves once a call is parked at the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.armed.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    tables: Mutex<Tables>,
    pub fail_lookups: AtomicBool,
    pub fail_creates: AtomicBool,
    pub fail_joins: AtomicBool,
    pub fail_updates: AtomicBool,
    pub fail_sends: AtomicBool,
    pub participant_loads: AtomicUsize,
    /// Applies to participant updates and message sends.
    pub gate: Gate,
}

fn unavailable() -> ClientError {
    ClientError::Status {
        status: 503,
        body: "backend unavailable".into(),
    }
}

impl FakeBackend {
    pub fn with_room(code: &str, is_active: bool) -> (Self, Room) {
        let backend = Self::default();
        let room = backend.add_room(code, is_active);
        (backend, room)
    }

    pub fn add_room(&self, code: &str, is_active: bool) -> Room {
        let room = Room {
            id: Uuid::new_v4(),
            room_code: code.to_string(),
            is_active,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().rooms.push(room.clone());
        room
    }

    /// Simulates another client joining behind our back.
    pub fn add_remote_participant(&self, room_id: Uuid, name: &str) -> Participant {
        let participant = new_participant(room_id, name);
        self.tables.lock().unwrap().participants.push(participant.clone());
        participant
    }

    pub fn stored_messages(&self) -> Vec<Message> {
        self.tables.lock().unwrap().messages.clone()
    }

    pub fn participant(&self, id: Uuid) -> Option<Participant> {
        self.tables
            .lock()
            .unwrap()
            .participants
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn fail(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn recover(flag: &AtomicBool) {
        flag.store(false, Ordering::SeqCst);
    }
}

fn new_participant(room_id: Uuid, name: &str) -> Participant {
    Participant {
        id: Uuid::new_v4(),
        room_id,
        display_name: name.to_string(),
        is_muted: false,
        is_video_off: false,
        is_online: true,
        created_at: Utc::now(),
    }
}

impl Backend for FakeBackend {
    async fn create_room(&self, room_code: &str) -> Result<Room, ClientError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.add_room(room_code, true))
    }

    async fn find_room(&self, room_code: &str) -> Result<Option<Room>, ClientError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables.rooms.iter().find(|r| r.room_code == room_code).cloned())
    }

    async fn join_room(&self, room_id: Uuid, display_name: &str) -> Result<Participant, ClientError> {
        if self.fail_joins.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.add_remote_participant(room_id, display_name))
    }

    async fn online_participants(&self, room_id: Uuid) -> Result<Vec<Participant>, ClientError> {
        self.participant_loads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.room_id == room_id && p.is_online)
            .cloned()
            .collect())
    }

    async fn update_participant(
        &self,
        participant_id: Uuid,
        update: ParticipantUpdate,
    ) -> Result<Participant, ClientError> {
        self.gate.pass().await;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut tables = self.tables.lock().unwrap();
        let participant = tables
            .participants
            .iter_mut()
            .find(|p| p.id == participant_id)
            .ok_or(ClientError::Status {
                status: 404,
                body: "Participant not found".into(),
            })?;
        if let Some(v) = update.is_muted {
            participant.is_muted = v;
        }
        if let Some(v) = update.is_video_off {
            participant.is_video_off = v;
        }
        if let Some(v) = update.is_online {
            participant.is_online = v;
        }
        Ok(participant.clone())
    }

    async fn messages(&self, room_id: Uuid) -> Result<Vec<Message>, ClientError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn send_message(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        text: &str,
    ) -> Result<Message, ClientError> {
        self.gate.pass().await;
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut tables = self.tables.lock().unwrap();
        let display_name = tables
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .map(|p| p.display_name.clone());
        let message = Message {
            id: Uuid::new_v4(),
            room_id,
            participant_id,
            message: text.to_string(),
            created_at: Utc::now(),
            display_name,
        };
        tables.messages.push(message.clone());
        Ok(message)
    }
}
