use tracing::{error, info};
use uuid::Uuid;

use goldroom_types::room_code::normalize_room_code;

use crate::backend::Backend;
use crate::notice::{Notice, Notices};

/// Resolves a room code to the room id the rest of the session works with.
#[derive(Debug, Default)]
pub struct RoomLookup {
    room_id: Option<Uuid>,
}

impl RoomLookup {
    pub fn room_id(&self) -> Option<Uuid> {
        self.room_id
    }

    pub async fn resolve<B: Backend>(
        &mut self,
        backend: &B,
        room_code: &str,
        notices: &mut Notices,
    ) -> Option<Uuid> {
        let code = normalize_room_code(room_code);
        info!("Getting room id for {}", code);

        match backend.find_room(&code).await {
            Ok(Some(room)) => {
                self.room_id = Some(room.id);
                Some(room.id)
            }
            Ok(None) => {
                error!("Room not found: {}", code);
                notices.push(Notice::RoomNotFound);
                None
            }
            Err(e) => {
                error!("Error getting room {}: {}", code, e);
                notices.push(Notice::RoomLookupFailed);
                None
            }
        }
    }
}
