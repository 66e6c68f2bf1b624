use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use goldroom_types::api::{JoinRoomRequest, MAX_DISPLAY_NAME_CHARS, ParticipantUpdate};
use goldroom_types::events::{GatewayEvent, RowChange};
use goldroom_types::models::Participant;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, run_blocking};

/// Insert a participant, online with audio and video on.
pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<JoinRoomRequest>,
) -> ApiResult<impl IntoResponse> {
    let display_name = req.display_name.trim().to_string();
    if display_name.is_empty() {
        return Err(ApiError::BadRequest("Display name is required".into()));
    }
    if display_name.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Display name is longer than {} characters",
            MAX_DISPLAY_NAME_CHARS
        )));
    }

    let participant_id = Uuid::new_v4();
    let participant = run_blocking(&state, move |db| {
        let room = db
            .get_room(&room_id.to_string())?
            .ok_or(ApiError::NotFound("Room not found"))?;
        if !room.is_active {
            return Err(ApiError::Conflict("Room is not active"));
        }
        let row = db.insert_participant(
            &participant_id.to_string(),
            &room_id.to_string(),
            &display_name,
        )?;
        Ok(row.into_model()?)
    })
    .await?;

    info!(
        "{} ({}) joined room {}",
        participant.display_name, participant.id, room_id
    );
    state.dispatcher.broadcast(GatewayEvent::ParticipantChanged {
        change: RowChange::Insert,
        participant: participant.clone(),
    });

    Ok((StatusCode::CREATED, Json(participant)))
}

/// Online participants of a room, in join order.
pub async fn list_participants(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Participant>>> {
    let participants = run_blocking(&state, move |db| {
        let rid = room_id.to_string();
        db.get_room(&rid)?.ok_or(ApiError::NotFound("Room not found"))?;
        db.get_online_participants(&rid)?
            .into_iter()
            .map(|row| row.into_model().map_err(ApiError::from))
            .collect()
    })
    .await?;

    Ok(Json(participants))
}

pub async fn update_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
    Json(update): Json<ParticipantUpdate>,
) -> ApiResult<Json<Participant>> {
    if update.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".into()));
    }

    let participant = run_blocking(&state, move |db| {
        let row = db
            .update_participant(&participant_id.to_string(), &update)?
            .ok_or(ApiError::NotFound("Participant not found"))?;
        Ok(row.into_model()?)
    })
    .await?;

    if update.is_online == Some(false) {
        info!(
            "{} ({}) left room {}",
            participant.display_name, participant.id, participant.room_id
        );
    }
    state.dispatcher.broadcast(GatewayEvent::ParticipantChanged {
        change: RowChange::Update,
        participant: participant.clone(),
    });

    Ok(Json(participant))
}
