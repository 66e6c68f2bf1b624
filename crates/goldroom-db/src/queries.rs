use crate::Database;
use crate::models::{MessageRow, ParticipantRow, RoomRow, timestamp_now};
use anyhow::Result;
use goldroom_types::api::ParticipantUpdate;
use rusqlite::{Connection, Row};

const ROOM_COLUMNS: &str = "id, room_code, is_active, created_at";

const PARTICIPANT_COLUMNS: &str =
    "id, room_id, display_name, is_muted, is_video_off, is_online, created_at";

impl Database {
    // -- Rooms --

    /// Insert an active room. Returns `None` when the code is already taken.
    pub fn create_room(&self, id: &str, room_code: &str) -> Result<Option<RoomRow>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO rooms (id, room_code, is_active, created_at) VALUES (?1, ?2, 1, ?3)",
                (id, room_code, timestamp_now()),
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            query_room(conn, "id", id)
        })
    }

    pub fn get_room_by_code(&self, room_code: &str) -> Result<Option<RoomRow>> {
        self.with_conn(|conn| query_room(conn, "room_code", room_code))
    }

    pub fn get_room(&self, id: &str) -> Result<Option<RoomRow>> {
        self.with_conn(|conn| query_room(conn, "id", id))
    }

    /// Returns false if no such room exists.
    pub fn set_room_active(&self, id: &str, is_active: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE rooms SET is_active = ?2 WHERE id = ?1",
                rusqlite::params![id, is_active],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Participants --

    pub fn insert_participant(
        &self,
        id: &str,
        room_id: &str,
        display_name: &str,
    ) -> Result<ParticipantRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO participants (id, room_id, display_name, is_muted, is_video_off, is_online, created_at)
                 VALUES (?1, ?2, ?3, 0, 0, 1, ?4)",
                (id, room_id, display_name, timestamp_now()),
            )?;
            query_participant(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("Participant vanished after insert: {}", id))
        })
    }

    pub fn get_participant(&self, id: &str) -> Result<Option<ParticipantRow>> {
        self.with_conn(|conn| query_participant(conn, id))
    }

    /// Apply the set fields of `update`. Returns the updated row, or `None`
    /// for an unknown participant.
    pub fn update_participant(
        &self,
        id: &str,
        update: &ParticipantUpdate,
    ) -> Result<Option<ParticipantRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE participants SET
                    is_muted = COALESCE(?2, is_muted),
                    is_video_off = COALESCE(?3, is_video_off),
                    is_online = COALESCE(?4, is_online)
                 WHERE id = ?1",
                rusqlite::params![id, update.is_muted, update.is_video_off, update.is_online],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_participant(conn, id)
        })
    }

    pub fn get_online_participants(&self, room_id: &str) -> Result<Vec<ParticipantRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM participants
                 WHERE room_id = ?1 AND is_online = 1
                 ORDER BY created_at ASC, rowid ASC",
                PARTICIPANT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([room_id], participant_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        room_id: &str,
        participant_id: &str,
        body: &str,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, room_id, participant_id, message, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, room_id, participant_id, body, timestamp_now()),
            )?;
            query_message(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("Message vanished after insert: {}", id))
        })
    }

    /// All messages of a room, oldest first.
    pub fn get_messages(&self, room_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, room_id))
    }
}

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<RoomRow> {
    Ok(RoomRow {
        id: row.get(0)?,
        room_code: row.get(1)?,
        is_active: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<ParticipantRow> {
    Ok(ParticipantRow {
        id: row.get(0)?,
        room_id: row.get(1)?,
        display_name: row.get(2)?,
        is_muted: row.get(3)?,
        is_video_off: row.get(4)?,
        is_online: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        room_id: row.get(1)?,
        participant_id: row.get(2)?,
        display_name: row.get(3)?,
        message: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// `column` is always one of our own literals, never user input.
fn query_room(conn: &Connection, column: &str, value: &str) -> Result<Option<RoomRow>> {
    let sql = format!("SELECT {} FROM rooms WHERE {} = ?1", ROOM_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], room_from_row).optional()?;
    Ok(row)
}

fn query_participant(conn: &Connection, id: &str) -> Result<Option<ParticipantRow>> {
    let sql = format!("SELECT {} FROM participants WHERE id = ?1", PARTICIPANT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([id], participant_from_row).optional()?;
    Ok(row)
}

fn query_message(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.room_id, m.participant_id, p.display_name, m.message, m.created_at
         FROM messages m
         LEFT JOIN participants p ON m.participant_id = p.id
         WHERE m.id = ?1",
    )?;
    let row = stmt.query_row([id], message_from_row).optional()?;
    Ok(row)
}

fn query_messages(conn: &Connection, room_id: &str) -> Result<Vec<MessageRow>> {
    // JOIN participants to fetch the author name in a single query
    let mut stmt = conn.prepare(
        "SELECT m.id, m.room_id, m.participant_id, p.display_name, m.message, m.created_at
         FROM messages m
         LEFT JOIN participants p ON m.participant_id = p.id
         WHERE m.room_id = ?1
         ORDER BY m.created_at ASC, m.rowid ASC",
    )?;

    let rows = stmt
        .query_map([room_id], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn db_with_room(code: &str) -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let room_id = new_id();
        db.create_room(&room_id, code).unwrap().unwrap();
        (db, room_id)
    }

    #[test]
    fn room_codes_are_unique() {
        let (db, room_id) = db_with_room("ABC123");
        assert!(db.create_room(&new_id(), "ABC123").unwrap().is_none());

        let room = db.get_room_by_code("ABC123").unwrap().unwrap();
        assert_eq!(room.id, room_id);
        assert!(room.is_active);
        assert!(db.get_room_by_code("ZZZ999").unwrap().is_none());
    }

    #[test]
    fn deactivate_room() {
        let (db, room_id) = db_with_room("ROOM01");
        assert!(db.set_room_active(&room_id, false).unwrap());
        assert!(!db.get_room(&room_id).unwrap().unwrap().is_active);
        assert!(!db.set_room_active(&new_id(), false).unwrap());
    }

    #[test]
    fn participant_insert_defaults() {
        let (db, room_id) = db_with_room("ROOM02");
        let id = new_id();
        let row = db.insert_participant(&id, &room_id, "Sara").unwrap();
        assert_eq!(row.display_name, "Sara");
        assert!(!row.is_muted);
        assert!(!row.is_video_off);
        assert!(row.is_online);
    }

    #[test]
    fn participant_requires_existing_room() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert_participant(&new_id(), &new_id(), "Ghost").is_err());
    }

    #[test]
    fn partial_update_leaves_other_flags() {
        let (db, room_id) = db_with_room("ROOM03");
        let id = new_id();
        db.insert_participant(&id, &room_id, "Omar").unwrap();

        let row = db
            .update_participant(&id, &ParticipantUpdate::muted(true))
            .unwrap()
            .unwrap();
        assert!(row.is_muted);
        assert!(!row.is_video_off);
        assert!(row.is_online);

        let row = db
            .update_participant(&id, &ParticipantUpdate::video_off(true))
            .unwrap()
            .unwrap();
        assert!(row.is_muted);
        assert!(row.is_video_off);

        assert!(db
            .update_participant(&new_id(), &ParticipantUpdate::muted(true))
            .unwrap()
            .is_none());
    }

    #[test]
    fn leaving_hides_participant_from_online_list() {
        let (db, room_id) = db_with_room("ROOM04");
        let a = new_id();
        let b = new_id();
        db.insert_participant(&a, &room_id, "A").unwrap();
        db.insert_participant(&b, &room_id, "B").unwrap();

        let online = db.get_online_participants(&room_id).unwrap();
        assert_eq!(online.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), [a.as_str(), b.as_str()]);

        db.update_participant(&a, &ParticipantUpdate::offline()).unwrap();
        let online = db.get_online_participants(&room_id).unwrap();
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].id, b);

        // soft delete: the row is still there
        assert!(db.get_participant(&a).unwrap().is_some());
    }

    #[test]
    fn messages_come_back_oldest_first_with_author() {
        let (db, room_id) = db_with_room("ROOM05");
        let author = new_id();
        db.insert_participant(&author, &room_id, "Huda").unwrap();

        let first = db.insert_message(&new_id(), &room_id, &author, "hello").unwrap();
        assert_eq!(first.display_name.as_deref(), Some("Huda"));
        db.insert_message(&new_id(), &room_id, &author, "again").unwrap();

        let rows = db.get_messages(&room_id).unwrap();
        let bodies: Vec<&str> = rows.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, ["hello", "again"]);

        let other_room = new_id();
        db.create_room(&other_room, "ROOM06").unwrap().unwrap();
        assert!(db.get_messages(&other_room).unwrap().is_empty());
    }
}
