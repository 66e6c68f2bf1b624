use std::fmt;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use goldroom_types::api::ParticipantUpdate;
use goldroom_types::models::Participant;

use crate::backend::Backend;
use crate::error::ClientError;
use crate::notice::{Notice, Notices};
use crate::participants::ParticipantsState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

/// A toggle already applied to local state and waiting to be persisted.
///
/// [`commit`](Self::commit) only borrows the backend, so the UI keeps
/// rendering the flipped flag while the request is in flight. Hand the
/// outcome to [`MediaControls::finish_toggle`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingToggle {
    participant_id: Uuid,
    kind: MediaKind,
    enabled: bool,
}

impl PendingToggle {
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// The new local state: camera on, or microphone live.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn update(&self) -> ParticipantUpdate {
        match self.kind {
            MediaKind::Video => ParticipantUpdate::video_off(!self.enabled),
            MediaKind::Audio => ParticipantUpdate::muted(!self.enabled),
        }
    }

    pub async fn commit<B: Backend>(&self, backend: &B) -> Result<Participant, ClientError> {
        backend.update_participant(self.participant_id, self.update()).await
    }
}

/// Local capture state. Toggles are applied optimistically and reverted
/// when the backend rejects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaControls {
    video_on: bool,
    audio_on: bool,
    screen_sharing: bool,
    camera_permitted: bool,
}

impl Default for MediaControls {
    fn default() -> Self {
        Self {
            video_on: true,
            audio_on: true,
            screen_sharing: false,
            camera_permitted: true,
        }
    }
}

impl MediaControls {
    pub fn is_video_on(&self) -> bool {
        self.video_on
    }

    pub fn is_audio_on(&self) -> bool {
        self.audio_on
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen_sharing
    }

    pub fn camera_permitted(&self) -> bool {
        self.camera_permitted
    }

    /// Whether the local tile can show the camera stream.
    pub fn shows_local_video(&self) -> bool {
        self.video_on && self.camera_permitted
    }

    fn flag_mut(&mut self, kind: MediaKind) -> &mut bool {
        match kind {
            MediaKind::Video => &mut self.video_on,
            MediaKind::Audio => &mut self.audio_on,
        }
    }

    /// Flip the flag locally. `None` when there is no current participant
    /// to persist it for, in which case nothing changes.
    pub fn begin_toggle(&mut self, kind: MediaKind, participants: &ParticipantsState) -> Option<PendingToggle> {
        let Some(participant_id) = participants.current_id() else {
            debug!("No current participant for {:?} toggle", kind);
            return None;
        };

        let flag = self.flag_mut(kind);
        *flag = !*flag;
        let enabled = *flag;
        info!("Toggling {:?}: {}", kind, enabled);

        Some(PendingToggle {
            participant_id,
            kind,
            enabled,
        })
    }

    /// Settle a pending toggle. Success merges the flag into the current
    /// participant; failure puts the local flag back.
    pub fn finish_toggle(
        &mut self,
        pending: PendingToggle,
        result: Result<Participant, ClientError>,
        participants: &mut ParticipantsState,
        notices: &mut Notices,
    ) -> bool {
        match result {
            Ok(_) => {
                debug!("{:?} state updated", pending.kind);
                participants.merge(pending.participant_id, &pending.update());
                notices.push(match (pending.kind, pending.enabled) {
                    (MediaKind::Video, true) => Notice::CameraStarted,
                    (MediaKind::Video, false) => Notice::CameraStopped,
                    (MediaKind::Audio, true) => Notice::MicUnmuted,
                    (MediaKind::Audio, false) => Notice::MicMuted,
                });
                true
            }
            Err(e) => {
                error!("Error persisting {:?} toggle: {}", pending.kind, e);
                *self.flag_mut(pending.kind) = !pending.enabled;
                notices.push(match pending.kind {
                    MediaKind::Video => Notice::CameraToggleFailed,
                    MediaKind::Audio => Notice::MicToggleFailed,
                });
                false
            }
        }
    }

    pub async fn toggle<B: Backend>(
        &mut self,
        kind: MediaKind,
        backend: &B,
        participants: &mut ParticipantsState,
        notices: &mut Notices,
    ) -> bool {
        let Some(pending) = self.begin_toggle(kind, participants) else {
            return false;
        };
        let result = pending.commit(backend).await;
        self.finish_toggle(pending, result, participants, notices)
    }

    pub async fn toggle_video<B: Backend>(
        &mut self,
        backend: &B,
        participants: &mut ParticipantsState,
        notices: &mut Notices,
    ) -> bool {
        self.toggle(MediaKind::Video, backend, participants, notices).await
    }

    pub async fn toggle_audio<B: Backend>(
        &mut self,
        backend: &B,
        participants: &mut ParticipantsState,
        notices: &mut Notices,
    ) -> bool {
        self.toggle(MediaKind::Audio, backend, participants, notices).await
    }

    /// Outcome of the embedding application's display-capture request.
    /// Screen sharing never touches the backend.
    pub fn set_screen_share_result<E: fmt::Display>(&mut self, result: Result<(), E>, notices: &mut Notices) {
        match result {
            Ok(()) => {
                info!("Screen sharing started");
                self.screen_sharing = true;
                notices.push(Notice::ScreenShareStarted);
            }
            Err(e) => {
                error!("Screen sharing error: {}", e);
                notices.push(Notice::ScreenShareFailed);
            }
        }
    }

    /// Stop sharing, from the control bar or because the captured track
    /// ended. A no-op when not sharing.
    pub fn stop_screen_share(&mut self, notices: &mut Notices) {
        if !self.screen_sharing {
            return;
        }
        info!("Screen sharing ended");
        self.screen_sharing = false;
        notices.push(Notice::ScreenShareStopped);
    }

    /// Outcome of the embedding application's camera request.
    pub fn set_camera_permission(&mut self, granted: bool, notices: &mut Notices) {
        self.camera_permitted = granted;
        if !granted {
            warn!("Camera access denied or not available");
            notices.push(Notice::CameraUnavailable);
        }
    }
}
