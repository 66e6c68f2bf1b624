use std::fmt;

use tracing::{debug, info};
use uuid::Uuid;

use goldroom_types::events::{GatewayEvent, Table};
use goldroom_types::models::{Message, Participant};

use crate::backend::Backend;
use crate::chat::{ChatState, PendingMessage};
use crate::error::ClientError;
use crate::feed::{Feed, FeedClient};
use crate::grid::{self, Tile};
use crate::media::{MediaControls, MediaKind, PendingToggle};
use crate::notice::{Notice, Notices};
use crate::participants::ParticipantsState;
use crate::room::RoomLookup;
use crate::welcome::JoinTicket;

/// Everything the in-room screen renders: presence, local media state and
/// chat, synchronised with the backend.
pub struct VideoRoomSession<B> {
    backend: B,
    ticket: JoinTicket,
    initialized: bool,
    room: RoomLookup,
    participants: ParticipantsState,
    media: MediaControls,
    chat: ChatState,
    show_chat: bool,
    pub notices: Notices,
}

impl<B: Backend> VideoRoomSession<B> {
    pub fn new(backend: B, ticket: JoinTicket) -> Self {
        Self {
            backend,
            ticket,
            initialized: false,
            room: RoomLookup::default(),
            participants: ParticipantsState::default(),
            media: MediaControls::default(),
            chat: ChatState::default(),
            show_chat: false,
            notices: Notices::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn room_code(&self) -> &str {
        &self.ticket.room_code
    }

    pub fn user_name(&self) -> &str {
        &self.ticket.user_name
    }

    pub fn room_id(&self) -> Option<Uuid> {
        self.room.room_id()
    }

    pub fn participants(&self) -> &ParticipantsState {
        &self.participants
    }

    pub fn media(&self) -> &MediaControls {
        &self.media
    }

    pub fn chat(&self) -> &ChatState {
        &self.chat
    }

    pub fn participant_count(&self) -> usize {
        self.participants.participants().len()
    }

    /// Resolve the room, join it, and load participants and chat history.
    /// Runs once; later calls return the room id only if the join went
    /// through.
    pub async fn initialize(&mut self) -> Option<Uuid> {
        if self.initialized {
            return self.participants.current_id().and(self.room.room_id());
        }
        self.initialized = true;
        info!("Initializing room {}", self.ticket.room_code);

        let room_id = self
            .room
            .resolve(&self.backend, &self.ticket.room_code, &mut self.notices)
            .await?;

        self.participants
            .add(&self.backend, room_id, &self.ticket.user_name, &mut self.notices)
            .await?;

        self.participants.load(&self.backend, room_id).await;
        self.chat.load(&self.backend, room_id).await;
        Some(room_id)
    }

    /// Open the change feed for this session's room. `None` before the
    /// room has been resolved.
    pub async fn subscribe(&self, feed: &FeedClient) -> Option<Result<Feed, ClientError>> {
        let room_id = self.room.room_id()?;
        Some(
            feed.subscribe(room_id, vec![Table::Participants, Table::Messages])
                .await,
        )
    }

    /// Apply one change-feed event. Events for other rooms are ignored.
    pub async fn apply_event(&mut self, event: GatewayEvent) {
        let Some(room_id) = self.room.room_id() else { return };
        if event.scope().is_some_and(|(rid, _)| rid != room_id) {
            debug!("Ignoring event for another room");
            return;
        }

        match event {
            GatewayEvent::ParticipantChanged { change, participant } => {
                debug!("Participant change {:?} for {}", change, participant.id);
                self.participants.on_change(&self.backend, room_id).await;
            }
            GatewayEvent::MessageCreated { message } => {
                self.chat.add(message);
            }
            GatewayEvent::Ready { .. } | GatewayEvent::Subscribed { .. } => {}
        }
    }

    /// Apply every event the feed has already delivered, without waiting.
    pub async fn drain_feed(&mut self, feed: &mut Feed) -> usize {
        let mut applied = 0;
        while let Some(event) = feed.try_next() {
            self.apply_event(event).await;
            applied += 1;
        }
        applied
    }

    pub async fn toggle_video(&mut self) -> bool {
        self.media
            .toggle_video(&self.backend, &mut self.participants, &mut self.notices)
            .await
    }

    pub async fn toggle_audio(&mut self) -> bool {
        self.media
            .toggle_audio(&self.backend, &mut self.participants, &mut self.notices)
            .await
    }

    /// Flip a media flag locally. Persist it with
    /// [`PendingToggle::commit`] against [`backend`](Self::backend) and
    /// settle it with [`finish_toggle`](Self::finish_toggle).
    pub fn begin_toggle(&mut self, kind: MediaKind) -> Option<PendingToggle> {
        self.media.begin_toggle(kind, &self.participants)
    }

    pub fn finish_toggle(&mut self, pending: PendingToggle, result: Result<Participant, ClientError>) -> bool {
        self.media
            .finish_toggle(pending, result, &mut self.participants, &mut self.notices)
    }

    pub fn set_screen_share_result<E: fmt::Display>(&mut self, result: Result<(), E>) {
        self.media.set_screen_share_result(result, &mut self.notices);
    }

    pub fn stop_screen_share(&mut self) {
        self.media.stop_screen_share(&mut self.notices);
    }

    pub fn set_camera_permission(&mut self, granted: bool) {
        self.media.set_camera_permission(granted, &mut self.notices);
    }

    pub fn show_chat(&self) -> bool {
        self.show_chat
    }

    pub fn toggle_chat(&mut self) {
        self.show_chat = !self.show_chat;
    }

    /// Text for the platform share sheet.
    pub fn invite_text(&self) -> String {
        format!(
            "Join me in the video chat room with code: {}",
            self.ticket.room_code
        )
    }

    /// Outcome of the share sheet. When it was unavailable or dismissed the
    /// room code is handed back for the clipboard instead.
    pub fn room_code_shared(&mut self, shared: bool) -> Option<&str> {
        if shared {
            return None;
        }
        self.notices.push(Notice::RoomCodeCopied);
        Some(&self.ticket.room_code)
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.chat.set_draft(text);
    }

    pub async fn send_message(&mut self) -> bool {
        let Some(room_id) = self.room.room_id() else { return false };
        let participant_id = self.participants.current_id();
        self.chat
            .send(&self.backend, room_id, participant_id, &mut self.notices)
            .await
    }

    /// Clear the draft and take its text. Insert it with
    /// [`PendingMessage::commit`] and settle it with
    /// [`finish_send`](Self::finish_send).
    pub fn begin_send(&mut self) -> Option<PendingMessage> {
        let room_id = self.room.room_id()?;
        self.chat.begin_send(room_id, self.participants.current_id())
    }

    pub fn finish_send(&mut self, pending: PendingMessage, result: Result<Message, ClientError>) -> bool {
        self.chat.finish_send(pending, result, &mut self.notices)
    }

    pub async fn leave(&mut self) -> bool {
        let left = self.participants.leave(&self.backend).await;
        if left {
            self.notices.push(Notice::LeftRoom);
        }
        left
    }

    pub fn tiles(&self) -> Vec<Tile> {
        grid::build_tiles(
            self.participants.participants(),
            self.participants.current(),
            &self.ticket.user_name,
            &self.media,
        )
    }

    pub fn grid_columns(&self) -> usize {
        grid::grid_columns(self.participant_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use goldroom_types::events::RowChange;
    use std::sync::atomic::Ordering;

    fn ticket(code: &str) -> JoinTicket {
        JoinTicket {
            room_code: code.into(),
            user_name: "Maya".into(),
        }
    }

    #[tokio::test]
    async fn initialize_joins_and_loads() {
        let (backend, room) = FakeBackend::with_room("AB12CD", true);
        backend.add_remote_participant(room.id, "Adam");
        let mut session = VideoRoomSession::new(backend, ticket("AB12CD"));

        assert_eq!(session.initialize().await, Some(room.id));
        assert_eq!(session.participant_count(), 2);
        assert_eq!(session.grid_columns(), 2);
        assert_eq!(session.notices.drain(), vec![Notice::Joined]);

        let tiles = session.tiles();
        assert!(tiles[0].is_local);
        assert_eq!(tiles[0].display_name, "Maya");
        assert_eq!(tiles[1].display_name, "Adam");
    }

    #[tokio::test]
    async fn initialize_runs_once() {
        let (backend, room) = FakeBackend::with_room("AB12CD", true);
        let mut session = VideoRoomSession::new(backend, ticket("AB12CD"));

        session.initialize().await;
        assert_eq!(session.initialize().await, Some(room.id));
        assert_eq!(session.participant_count(), 1);
        assert_eq!(session.backend().participant_loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_room_stops_initialization() {
        let mut session = VideoRoomSession::new(FakeBackend::default(), ticket("NOPE00"));

        assert!(session.initialize().await.is_none());
        assert!(session.participants().current().is_none());
        assert_eq!(session.notices.drain(), vec![Notice::RoomNotFound]);
        assert!(!session.send_message().await);
    }

    #[tokio::test]
    async fn feed_events_update_state() {
        let (backend, room) = FakeBackend::with_room("AB12CD", true);
        let mut session = VideoRoomSession::new(backend, ticket("AB12CD"));
        session.initialize().await;

        let newcomer = session.backend().add_remote_participant(room.id, "Adam");
        session
            .apply_event(GatewayEvent::ParticipantChanged {
                change: RowChange::Insert,
                participant: newcomer.clone(),
            })
            .await;
        assert_eq!(session.participant_count(), 2);

        let msg = session
            .backend()
            .send_message(room.id, newcomer.id, "salam")
            .await
            .unwrap();
        let event = GatewayEvent::MessageCreated { message: msg };
        session.apply_event(event.clone()).await;
        session.apply_event(event).await;
        assert_eq!(session.chat().len(), 1);
    }

    #[tokio::test]
    async fn events_for_other_rooms_are_ignored() {
        let (backend, _) = FakeBackend::with_room("AB12CD", true);
        let other = backend.add_room("OTHER1", true);
        let stranger = backend.add_remote_participant(other.id, "Zed");
        let mut session = VideoRoomSession::new(backend, ticket("AB12CD"));
        session.initialize().await;
        let loads = session.backend().participant_loads.load(Ordering::SeqCst);

        session
            .apply_event(GatewayEvent::ParticipantChanged {
                change: RowChange::Insert,
                participant: stranger,
            })
            .await;
        assert_eq!(session.backend().participant_loads.load(Ordering::SeqCst), loads);
    }

    #[tokio::test]
    async fn toggles_send_and_leave() {
        let (backend, room) = FakeBackend::with_room("AB12CD", true);
        let mut session = VideoRoomSession::new(backend, ticket("AB12CD"));
        session.initialize().await;
        session.notices.drain();

        session.toggle_audio().await;
        assert!(!session.media().is_audio_on());
        assert!(session.tiles()[0].is_muted);

        FakeBackend::fail(&session.backend().fail_updates);
        session.toggle_video().await;
        assert!(session.media().is_video_on());
        assert_eq!(
            session.notices.drain(),
            vec![Notice::MicMuted, Notice::CameraToggleFailed]
        );
        FakeBackend::recover(&session.backend().fail_updates);

        session.toggle_chat();
        assert!(session.show_chat());
        session.set_draft("hello room");
        assert!(session.send_message().await);
        assert_eq!(session.chat().draft(), "");
        assert_eq!(session.backend().stored_messages()[0].room_id, room.id);

        let me = session.participants().current_id().unwrap();
        assert!(session.leave().await);
        assert!(!session.backend().participant(me).unwrap().is_online);
        assert_eq!(session.notices.drain(), vec![Notice::LeftRoom]);
    }

    #[tokio::test]
    async fn failed_join_is_not_reported_as_joined_later() {
        let (backend, _) = FakeBackend::with_room("AB12CD", true);
        FakeBackend::fail(&backend.fail_joins);
        let mut session = VideoRoomSession::new(backend, ticket("AB12CD"));

        assert!(session.initialize().await.is_none());
        assert!(session.initialize().await.is_none());
        assert_eq!(session.notices.drain(), vec![Notice::JoinFailed]);
    }

    #[tokio::test]
    async fn pending_toggle_and_send_are_visible_in_the_session() {
        let (backend, _) = FakeBackend::with_room("AB12CD", true);
        let mut session = VideoRoomSession::new(backend, ticket("AB12CD"));
        session.initialize().await;
        session.notices.drain();
        session.backend().gate.arm();

        let toggle = session.begin_toggle(MediaKind::Audio).unwrap();
        let (result, ()) = tokio::join!(toggle.commit(session.backend()), async {
            session.backend().gate.entered().await;
            assert!(!session.media().is_audio_on());
            assert!(session.tiles()[0].is_muted);
            session.backend().gate.release();
        });
        assert!(session.finish_toggle(toggle, result));

        session.backend().gate.arm();
        session.set_draft("brb");
        let message = session.begin_send().unwrap();
        let (result, ()) = tokio::join!(message.commit(session.backend()), async {
            session.backend().gate.entered().await;
            assert_eq!(session.chat().draft(), "");
            session.backend().gate.release();
        });
        assert!(session.finish_send(message, result));
        assert_eq!(session.notices.drain(), vec![Notice::MicMuted]);
    }

    #[tokio::test]
    async fn screen_share_and_room_code_sharing() {
        let (backend, _) = FakeBackend::with_room("AB12CD", true);
        let mut session = VideoRoomSession::new(backend, ticket("AB12CD"));

        session.set_screen_share_result(Ok::<(), &str>(()));
        assert!(session.media().is_screen_sharing());
        session.stop_screen_share();
        assert!(!session.media().is_screen_sharing());

        assert!(session.invite_text().ends_with("AB12CD"));
        assert_eq!(session.room_code_shared(true), None);
        assert_eq!(session.room_code_shared(false), Some("AB12CD"));
        assert_eq!(
            session.notices.drain(),
            vec![
                Notice::ScreenShareStarted,
                Notice::ScreenShareStopped,
                Notice::RoomCodeCopied,
            ]
        );
    }
}
