use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use uuid::Uuid;

use goldroom_types::api::{MAX_MESSAGE_CHARS, SendMessageRequest};
use goldroom_types::events::GatewayEvent;
use goldroom_types::models::Message;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, run_blocking};

pub async fn send_message(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let body = req.message.trim().to_string();
    if body.is_empty() {
        return Err(ApiError::BadRequest("Message is empty".into()));
    }
    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Message is longer than {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    let message_id = Uuid::new_v4();
    let participant_id = req.participant_id;
    let message = run_blocking(&state, move |db| {
        let rid = room_id.to_string();
        db.get_room(&rid)?.ok_or(ApiError::NotFound("Room not found"))?;
        let author = db
            .get_participant(&participant_id.to_string())?
            .ok_or(ApiError::NotFound("Participant not found"))?;
        if author.room_id != rid {
            return Err(ApiError::BadRequest(
                "Participant does not belong to this room".into(),
            ));
        }
        let row = db.insert_message(&message_id.to_string(), &rid, &author.id, &body)?;
        Ok(row.into_model()?)
    })
    .await?;

    debug!("Message {} posted to room {}", message.id, room_id);

    // Fan out to every subscribed gateway client
    state.dispatcher.broadcast(GatewayEvent::MessageCreated {
        message: message.clone(),
    });

    Ok((StatusCode::CREATED, Json(message)))
}

/// Full history of a room, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = run_blocking(&state, move |db| {
        let rid = room_id.to_string();
        db.get_room(&rid)?.ok_or(ApiError::NotFound("Room not found"))?;
        db.get_messages(&rid)?
            .into_iter()
            .map(|row| row.into_model().map_err(ApiError::from))
            .collect()
    })
    .await?;

    Ok(Json(messages))
}
