use tracing::{error, info};
use uuid::Uuid;

use goldroom_types::api::ParticipantUpdate;
use goldroom_types::models::Participant;

use crate::backend::Backend;
use crate::notice::{Notice, Notices};

/// Online participants of a room plus the local user's own record.
#[derive(Debug, Default)]
pub struct ParticipantsState {
    participants: Vec<Participant>,
    current: Option<Participant>,
}

impl ParticipantsState {
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn current(&self) -> Option<&Participant> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> Option<Uuid> {
        self.current.as_ref().map(|p| p.id)
    }

    /// Replace the list with the backend's online participants. On error
    /// the previous list is kept.
    pub async fn load<B: Backend>(&mut self, backend: &B, room_id: Uuid) {
        match backend.online_participants(room_id).await {
            Ok(participants) => {
                info!("Participants loaded: {}", participants.len());
                self.participants = participants;
            }
            Err(e) => error!("Error loading participants for room {}: {}", room_id, e),
        }
    }

    /// Any participant change in the room triggers a full reload.
    pub async fn on_change<B: Backend>(&mut self, backend: &B, room_id: Uuid) {
        self.load(backend, room_id).await;
    }

    pub async fn add<B: Backend>(
        &mut self,
        backend: &B,
        room_id: Uuid,
        display_name: &str,
        notices: &mut Notices,
    ) -> Option<Participant> {
        match backend.join_room(room_id, display_name).await {
            Ok(participant) => {
                info!("Participant created: {} ({})", participant.display_name, participant.id);
                self.current = Some(participant.clone());
                notices.push(Notice::Joined);
                Some(participant)
            }
            Err(e) => {
                error!("Error adding participant to room {}: {}", room_id, e);
                notices.push(Notice::JoinFailed);
                None
            }
        }
    }

    /// Persist a partial update and, on success, merge it into the local
    /// current participant.
    pub async fn update<B: Backend>(
        &mut self,
        backend: &B,
        participant_id: Uuid,
        update: ParticipantUpdate,
    ) -> bool {
        match backend.update_participant(participant_id, update).await {
            Ok(_) => {
                self.merge(participant_id, &update);
                true
            }
            Err(e) => {
                error!("Error updating participant {}: {}", participant_id, e);
                false
            }
        }
    }

    /// Merge an already persisted update into the local current participant.
    pub fn merge(&mut self, participant_id: Uuid, update: &ParticipantUpdate) {
        if let Some(current) = self.current.as_mut().filter(|p| p.id == participant_id) {
            apply_update(current, update);
        }
    }

    /// Mark the current participant offline. The row is kept.
    pub async fn leave<B: Backend>(&mut self, backend: &B) -> bool {
        let Some(id) = self.current_id() else { return false };
        match backend.update_participant(id, ParticipantUpdate::offline()).await {
            Ok(_) => {
                info!("Left room successfully");
                self.merge(id, &ParticipantUpdate::offline());
                true
            }
            Err(e) => {
                error!("Error leaving room: {}", e);
                false
            }
        }
    }
}

fn apply_update(participant: &mut Participant, update: &ParticipantUpdate) {
    if let Some(v) = update.is_muted {
        participant.is_muted = v;
    }
    if let Some(v) = update.is_video_off {
        participant.is_video_off = v;
    }
    if let Some(v) = update.is_online {
        participant.is_online = v;
    }
}
