use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub room_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A user's membership in a room. Leaving flips `is_online` to false;
/// the row itself is never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub room_id: Uuid,
    pub display_name: String,
    pub is_muted: bool,
    pub is_video_off: bool,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
}

/// Chat messages are append-only. `display_name` is the author's name at
/// read time, absent when the author row could not be joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub participant_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub display_name: Option<String>,
}
