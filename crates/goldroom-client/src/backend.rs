use std::future::Future;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use goldroom_types::api::{
    CreateRoomRequest, JoinRoomRequest, ParticipantUpdate, SendMessageRequest,
};
use goldroom_types::models::{Message, Participant, Room};

use crate::error::ClientError;

/// Table operations the client state needs from a goldroom server.
pub trait Backend: Send + Sync {
    /// Insert an active room with the given code.
    fn create_room(&self, room_code: &str) -> impl Future<Output = Result<Room, ClientError>> + Send;

    /// Look a room up by its normalized code. `Ok(None)` when no room has it.
    fn find_room(
        &self,
        room_code: &str,
    ) -> impl Future<Output = Result<Option<Room>, ClientError>> + Send;

    fn join_room(
        &self,
        room_id: Uuid,
        display_name: &str,
    ) -> impl Future<Output = Result<Participant, ClientError>> + Send;

    fn online_participants(
        &self,
        room_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Participant>, ClientError>> + Send;

    fn update_participant(
        &self,
        participant_id: Uuid,
        update: ParticipantUpdate,
    ) -> impl Future<Output = Result<Participant, ClientError>> + Send;

    /// Full history, oldest first.
    fn messages(&self, room_id: Uuid) -> impl Future<Output = Result<Vec<Message>, ClientError>> + Send;

    fn send_message(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        text: &str,
    ) -> impl Future<Output = Result<Message, ClientError>> + Send;
}

/// [`Backend`] over the server's HTTP JSON API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Backend for HttpBackend {
    async fn create_room(&self, room_code: &str) -> Result<Room, ClientError> {
        let resp = self
            .client
            .post(self.url("/rooms"))
            .json(&CreateRoomRequest {
                room_code: Some(room_code.to_string()),
            })
            .send()
            .await?;
        decode(resp).await
    }

    async fn find_room(&self, room_code: &str) -> Result<Option<Room>, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/rooms/code/{}", room_code)))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(resp).await.map(Some)
    }

    async fn join_room(&self, room_id: Uuid, display_name: &str) -> Result<Participant, ClientError> {
        let resp = self
            .client
            .post(self.url(&format!("/rooms/{}/participants", room_id)))
            .json(&JoinRoomRequest {
                display_name: display_name.to_string(),
            })
            .send()
            .await?;
        decode(resp).await
    }

    async fn online_participants(&self, room_id: Uuid) -> Result<Vec<Participant>, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/rooms/{}/participants", room_id)))
            .send()
            .await?;
        decode(resp).await
    }

    async fn update_participant(
        &self,
        participant_id: Uuid,
        update: ParticipantUpdate,
    ) -> Result<Participant, ClientError> {
        let resp = self
            .client
            .patch(self.url(&format!("/participants/{}", participant_id)))
            .json(&update)
            .send()
            .await?;
        decode(resp).await
    }

    async fn messages(&self, room_id: Uuid) -> Result<Vec<Message>, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/rooms/{}/messages", room_id)))
            .send()
            .await?;
        decode(resp).await
    }

    async fn send_message(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        text: &str,
    ) -> Result<Message, ClientError> {
        let resp = self
            .client
            .post(self.url(&format!("/rooms/{}/messages", room_id)))
            .json(&SendMessageRequest {
                participant_id,
                message: text.to_string(),
            })
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.json().await?)
}
