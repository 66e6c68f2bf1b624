use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use goldroom_types::api::CreateRoomRequest;
use goldroom_types::room_code::{generate_room_code, is_valid_room_code, normalize_room_code};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, run_blocking};

/// Create an active room. A taken code is reported as a conflict, the
/// caller picks a new one.
pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> ApiResult<impl IntoResponse> {
    let room_code = match req.room_code {
        Some(code) => normalize_room_code(&code),
        None => generate_room_code(),
    };
    if !is_valid_room_code(&room_code) {
        return Err(ApiError::BadRequest(format!(
            "Room code must be 6 characters from A-Z and 0-9, got '{}'",
            room_code
        )));
    }

    let room_id = Uuid::new_v4();
    let code = room_code.clone();
    let room = run_blocking(&state, move |db| {
        let row = db
            .create_room(&room_id.to_string(), &code)?
            .ok_or(ApiError::Conflict("Room code already taken"))?;
        Ok(row.into_model()?)
    })
    .await?;

    info!("Room {} created with code {}", room.id, room.room_code);
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn get_room_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let room_code = normalize_room_code(&code);
    let room = run_blocking(&state, move |db| {
        let row = db
            .get_room_by_code(&room_code)?
            .ok_or(ApiError::NotFound("Room not found"))?;
        Ok(row.into_model()?)
    })
    .await?;

    Ok(Json(room))
}
