pub mod error;
pub mod messages;
pub mod participants;
pub mod rooms;
pub mod state;
