//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the goldroom-types models so the DB layer stays
//! independent; `into_model` does the parsing.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use uuid::Uuid;

use goldroom_types::models::{Message, Participant, Room};

pub struct RoomRow {
    pub id: String,
    pub room_code: String,
    pub is_active: bool,
    pub created_at: String,
}

pub struct ParticipantRow {
    pub id: String,
    pub room_id: String,
    pub display_name: String,
    pub is_muted: bool,
    pub is_video_off: bool,
    pub is_online: bool,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub room_id: String,
    pub participant_id: String,
    pub display_name: Option<String>,
    pub message: String,
    pub created_at: String,
}

impl RoomRow {
    pub fn into_model(self) -> Result<Room> {
        Ok(Room {
            id: parse_id(&self.id)?,
            room_code: self.room_code,
            is_active: self.is_active,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl ParticipantRow {
    pub fn into_model(self) -> Result<Participant> {
        Ok(Participant {
            id: parse_id(&self.id)?,
            room_id: parse_id(&self.room_id)?,
            display_name: self.display_name,
            is_muted: self.is_muted,
            is_video_off: self.is_video_off,
            is_online: self.is_online,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl MessageRow {
    pub fn into_model(self) -> Result<Message> {
        Ok(Message {
            id: parse_id(&self.id)?,
            room_id: parse_id(&self.room_id)?,
            participant_id: parse_id(&self.participant_id)?,
            message: self.message,
            created_at: parse_timestamp(&self.created_at)?,
            display_name: self.display_name,
        })
    }
}

/// Timestamp string written on insert. Fixed microsecond precision keeps
/// lexical order equal to chronological order.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("Corrupt id '{}'", raw))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through sqlite3 use datetime('now'),
            // which has no timezone suffix.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("Corrupt timestamp '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_sqlite_timestamps() {
        let a = parse_timestamp("2026-10-19T08:13:00.000001Z").unwrap();
        let b = parse_timestamp("2026-10-19 08:13:00").unwrap();
        assert!(a > b);
    }

    #[test]
    fn corrupt_row_is_an_error() {
        let row = RoomRow {
            id: "not-a-uuid".into(),
            room_code: "ABC123".into(),
            is_active: true,
            created_at: timestamp_now(),
        };
        assert!(row.into_model().is_err());
    }
}
