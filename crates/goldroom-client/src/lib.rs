//! Client-side room state, kept in sync with a goldroom server through its
//! HTTP API and change feed.
//!
//! The state types mirror what a UI renders: [`welcome::WelcomeForm`] for
//! creating or joining a room, then [`session::VideoRoomSession`] for
//! presence, media toggles and chat. User-facing notifications are queued
//! as [`notice::Notice`]s for the UI to drain.

pub mod backend;
pub mod chat;
pub mod error;
pub mod feed;
pub mod grid;
pub mod media;
pub mod notice;
pub mod participants;
pub mod room;
pub mod session;
pub mod welcome;

#[cfg(test)]
mod testing;

pub use backend::{Backend, HttpBackend};
pub use chat::PendingMessage;
pub use error::ClientError;
pub use feed::{Feed, FeedClient};
pub use media::{MediaKind, PendingToggle};
pub use notice::{Notice, Notices};
pub use session::VideoRoomSession;
pub use welcome::{JoinTicket, WelcomeForm};
