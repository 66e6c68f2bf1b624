use tracing::{error, info};

use goldroom_types::models::Room;
use goldroom_types::room_code::{ROOM_CODE_LEN, generate_room_code, normalize_room_code};

use crate::backend::Backend;
use crate::notice::{Notice, Notices};

/// A validated request to enter a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTicket {
    pub room_code: String,
    pub user_name: String,
}

/// State of the create/join screen.
#[derive(Debug, Default)]
pub struct WelcomeForm {
    room_code: String,
    user_name: String,
    is_loading: bool,
    created_code: Option<String>,
    pub notices: Notices,
}

impl WelcomeForm {
    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Code of the room this form just created, to show for sharing.
    pub fn created_code(&self) -> Option<&str> {
        self.created_code.as_deref()
    }

    /// Input is upper-cased as typed and capped at the code length.
    pub fn set_room_code(&mut self, input: &str) {
        self.room_code = input.to_uppercase().chars().take(ROOM_CODE_LEN).collect();
    }

    pub fn set_user_name(&mut self, input: &str) {
        self.user_name = input.to_string();
    }

    pub fn can_join(&self) -> bool {
        !self.room_code.trim().is_empty() && !self.user_name.trim().is_empty() && !self.is_loading
    }

    /// Create a room with a fresh random code and put the code in the form.
    pub async fn create_room<B: Backend>(&mut self, backend: &B) -> Option<Room> {
        self.is_loading = true;
        let code = generate_room_code();

        let result = backend.create_room(&code).await;
        self.is_loading = false;

        match result {
            Ok(room) => {
                info!("Room created with code {}", room.room_code);
                self.room_code = room.room_code.clone();
                self.created_code = Some(room.room_code.clone());
                self.notices.push(Notice::RoomCreated {
                    code: room.room_code.clone(),
                });
                Some(room)
            }
            Err(e) => {
                error!("Error creating room: {}", e);
                self.notices.push(Notice::RoomCreateFailed);
                None
            }
        }
    }

    /// Check the inputs and that the room exists and is active.
    pub async fn join<B: Backend>(&mut self, backend: &B) -> Option<JoinTicket> {
        if self.room_code.trim().is_empty() {
            self.notices.push(Notice::MissingRoomCode);
            return None;
        }
        if self.user_name.trim().is_empty() {
            self.notices.push(Notice::MissingName);
            return None;
        }

        self.is_loading = true;
        let code = normalize_room_code(&self.room_code);
        let result = backend.find_room(&code).await;
        self.is_loading = false;

        match result {
            Ok(Some(room)) if room.is_active => Some(JoinTicket {
                room_code: room.room_code,
                user_name: self.user_name.trim().to_string(),
            }),
            Ok(Some(_)) => {
                self.notices.push(Notice::RoomInactive);
                None
            }
            Ok(None) => {
                self.notices.push(Notice::RoomNotFound);
                None
            }
            Err(e) => {
                error!("Error checking room {}: {}", code, e);
                self.notices.push(Notice::RoomLookupFailed);
                None
            }
        }
    }
}
