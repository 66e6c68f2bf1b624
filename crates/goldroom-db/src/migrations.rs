use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS rooms (
            id          TEXT PRIMARY KEY,
            room_code   TEXT NOT NULL UNIQUE,
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS participants (
            id              TEXT PRIMARY KEY,
            room_id         TEXT NOT NULL REFERENCES rooms(id),
            display_name    TEXT NOT NULL,
            is_muted        INTEGER NOT NULL DEFAULT 0,
            is_video_off    INTEGER NOT NULL DEFAULT 0,
            is_online       INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_participants_room
            ON participants(room_id, is_online);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            room_id         TEXT NOT NULL REFERENCES rooms(id),
            participant_id  TEXT NOT NULL REFERENCES participants(id),
            message         TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_room
            ON messages(room_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
