use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MissingRoomCode,
    MissingName,
    RoomNotFound,
    RoomInactive,
    RoomLookupFailed,
    RoomCreated { code: String },
    RoomCreateFailed,
    Joined,
    JoinFailed,
    CameraStarted,
    CameraStopped,
    CameraToggleFailed,
    MicUnmuted,
    MicMuted,
    MicToggleFailed,
    CameraUnavailable,
    ScreenShareStarted,
    ScreenShareStopped,
    ScreenShareFailed,
    RoomCodeCopied,
    LeftRoom,
    SendFailed,
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Self::RoomCreated { .. }
            | Self::Joined
            | Self::CameraStarted
            | Self::CameraStopped
            | Self::MicUnmuted
            | Self::MicMuted
            | Self::ScreenShareStarted
            | Self::RoomCodeCopied
            | Self::LeftRoom => NoticeLevel::Success,
            Self::ScreenShareStopped => NoticeLevel::Info,
            _ => NoticeLevel::Error,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoomCode => f.write_str("Please enter a room code"),
            Self::MissingName => f.write_str("Please enter your name"),
            Self::RoomNotFound => f.write_str("Room not found"),
            Self::RoomInactive => f.write_str("This room is no longer active"),
            Self::RoomLookupFailed => f.write_str("Could not check the room"),
            Self::RoomCreated { code } => write!(f, "Room created with code {}", code),
            Self::RoomCreateFailed => f.write_str("Could not create the room"),
            Self::Joined => f.write_str("Joined the room"),
            Self::JoinFailed => f.write_str("Could not join the room"),
            Self::CameraStarted => f.write_str("Camera turned on"),
            Self::CameraStopped => f.write_str("Camera turned off"),
            Self::CameraToggleFailed => f.write_str("Could not change camera state"),
            Self::MicUnmuted => f.write_str("Microphone unmuted"),
            Self::MicMuted => f.write_str("Microphone muted"),
            Self::MicToggleFailed => f.write_str("Could not change microphone state"),
            Self::CameraUnavailable => f.write_str("Camera is not available"),
            Self::ScreenShareStarted => f.write_str("Screen sharing started"),
            Self::ScreenShareStopped => f.write_str("Screen sharing stopped"),
            Self::ScreenShareFailed => f.write_str("Could not share the screen"),
            Self::RoomCodeCopied => f.write_str("Room code copied"),
            Self::LeftRoom => f.write_str("Left the room"),
            Self::SendFailed => f.write_str("Could not send the message"),
        }
    }
}

/// FIFO queue of notices waiting to be shown.
#[derive(Debug, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub fn push(&mut self, notice: Notice) {
        self.queue.push_back(notice);
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    pub fn contains(&self, notice: &Notice) -> bool {
        self.queue.contains(notice)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_is_fifo_and_empties() {
        let mut notices = Notices::default();
        notices.push(Notice::Joined);
        notices.push(Notice::SendFailed);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices.drain(), vec![Notice::Joined, Notice::SendFailed]);
        assert!(notices.is_empty());
    }

    #[test]
    fn levels_and_text() {
        let created = Notice::RoomCreated { code: "AB12CD".into() };
        assert_eq!(created.level(), NoticeLevel::Success);
        assert_eq!(created.to_string(), "Room created with code AB12CD");
        assert_eq!(Notice::RoomNotFound.level(), NoticeLevel::Error);
        assert_eq!(Notice::MicMuted.level(), NoticeLevel::Success);
        assert_eq!(Notice::ScreenShareStopped.level(), NoticeLevel::Info);
        assert_eq!(Notice::ScreenShareFailed.level(), NoticeLevel::Error);
        assert_eq!(Notice::LeftRoom.to_string(), "Left the room");
    }
}
