use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use goldroom_types::models::Message;

use crate::backend::Backend;
use crate::error::ClientError;
use crate::notice::{Notice, Notices};

/// Author label used when the author's name could not be resolved.
pub const ANONYMOUS: &str = "Anonymous";

/// Chat history of one room plus the local draft.
#[derive(Debug, Default)]
pub struct ChatState {
    messages: Vec<Message>,
    draft: String,
}

impl ChatState {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Whether the send button is enabled.
    pub fn can_send(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    /// Replace the history with the room's messages, oldest first.
    pub async fn load<B: Backend>(&mut self, backend: &B, room_id: Uuid) {
        info!("Loading messages for room {}", room_id);
        match backend.messages(room_id).await {
            Ok(messages) => {
                info!("Messages loaded: {}", messages.len());
                self.messages = messages;
            }
            Err(e) => error!("Error loading messages for room {}: {}", room_id, e),
        }
    }

    /// Append a pushed message unless one with the same id is present.
    /// Returns whether it was appended.
    pub fn add(&mut self, message: Message) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            debug!("Dropping duplicate message {}", message.id);
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Take the trimmed draft for sending and clear the input. Blank drafts
    /// and a missing participant leave the draft alone and return `None`.
    pub fn begin_send(&mut self, room_id: Uuid, participant_id: Option<Uuid>) -> Option<PendingMessage> {
        let text = self.draft.trim().to_string();
        if text.is_empty() {
            debug!("Message is empty, not sending");
            return None;
        }
        let Some(participant_id) = participant_id else {
            debug!("No current participant, not sending");
            return None;
        };

        Some(PendingMessage {
            room_id,
            participant_id,
            text,
            draft: std::mem::take(&mut self.draft),
        })
    }

    /// Settle a pending send. On failure the original draft comes back.
    pub fn finish_send(
        &mut self,
        pending: PendingMessage,
        result: Result<Message, ClientError>,
        notices: &mut Notices,
    ) -> bool {
        match result {
            Ok(message) => {
                debug!("Message {} sent", message.id);
                true
            }
            Err(e) => {
                error!("Error sending message: {}", e);
                self.draft = pending.draft;
                notices.push(Notice::SendFailed);
                false
            }
        }
    }

    /// Send the trimmed draft. The draft is cleared up front and restored
    /// if the insert fails.
    pub async fn send<B: Backend>(
        &mut self,
        backend: &B,
        room_id: Uuid,
        participant_id: Option<Uuid>,
        notices: &mut Notices,
    ) -> bool {
        let Some(pending) = self.begin_send(room_id, participant_id) else {
            return false;
        };
        let result = pending.commit(backend).await;
        self.finish_send(pending, result, notices)
    }
}

/// A message taken out of the draft and waiting to be inserted. Hand the
/// outcome of [`commit`](Self::commit) to [`ChatState::finish_send`].
#[must_use]
#[derive(Debug, Clone)]
pub struct PendingMessage {
    room_id: Uuid,
    participant_id: Uuid,
    text: String,
    draft: String,
}

impl PendingMessage {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub async fn commit<B: Backend>(&self, backend: &B) -> Result<Message, ClientError> {
        backend
            .send_message(self.room_id, self.participant_id, &self.text)
            .await
    }
}

pub fn is_own(message: &Message, participant_id: Uuid) -> bool {
    message.participant_id == participant_id
}

pub fn author_label(message: &Message) -> &str {
    message.display_name.as_deref().unwrap_or(ANONYMOUS)
}

/// 24-hour `HH:MM` in the local time zone.
pub fn format_time(at: &DateTime<Utc>) -> String {
    format_time_in(at, &Local)
}

pub fn format_time_in<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz).format("%H:%M").to_string()
}
