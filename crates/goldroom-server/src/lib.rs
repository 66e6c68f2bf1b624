pub mod config;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use goldroom_api::state::AppState;
use goldroom_api::{messages, participants, rooms};
use goldroom_gateway::connection;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/rooms", post(rooms::create_room))
        .route("/rooms/code/{code}", get(rooms::get_room_by_code))
        .route(
            "/rooms/{room_id}/participants",
            get(participants::list_participants).post(participants::join_room),
        )
        .route(
            "/participants/{participant_id}",
            patch(participants::update_participant),
        )
        .route(
            "/rooms/{room_id}/messages",
            get(messages::get_messages).post(messages::send_message),
        );

    let ws_route = Router::new().route("/gateway", get(ws_upgrade));

    Router::new()
        .merge(api_routes)
        .merge(ws_route)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher))
}
