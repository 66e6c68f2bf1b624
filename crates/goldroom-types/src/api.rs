use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on a chat message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Upper bound on a display name, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

// -- Rooms --

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRoomRequest {
    /// Client-chosen code. The server generates one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_code: Option<String>,
}

// -- Participants --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinRoomRequest {
    pub display_name: String,
}

/// Partial update of a participant's flags. Only the fields that are set
/// are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticipantUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_video_off: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
}

impl ParticipantUpdate {
    pub fn muted(is_muted: bool) -> Self {
        Self { is_muted: Some(is_muted), ..Self::default() }
    }

    pub fn video_off(is_video_off: bool) -> Self {
        Self { is_video_off: Some(is_video_off), ..Self::default() }
    }

    pub fn offline() -> Self {
        Self { is_online: Some(false), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.is_muted.is_none() && self.is_video_off.is_none() && self.is_online.is_none()
    }
}

// -- Messages --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub participant_id: Uuid,
    pub message: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
