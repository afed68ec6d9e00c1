use axum::{Json, body::Bytes, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{
    AppState,
    error::StoreError,
    middleware::Session,
    models::{LeaderboardEntry, PlayerUpdate},
};

pub const LEADERBOARD_SIZE: usize = 100;

// Player update endpoint, called periodically by the browser game loop
pub async fn update_player(
    State(state): State<AppState>,
    mut session: Session,
    body: Bytes,
) -> Result<impl IntoResponse, StoreError> {
    let record = PlayerUpdate::from_body(&body).into_record(&session.state);
    let day = record.day;
    let id = state
        .players
        .blocking(move |players| players.upsert(&record))
        .await?;

    session.state.player_id = Some(id.clone());
    session.state.day = Some(day);
    let cookie = session.persist_existing(&state.sessions);

    Ok((cookie, Json(json!({ "ok": true, "id": id }))))
}

// Leaderboard, richest players first
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, StoreError> {
    let entries = state
        .players
        .blocking(|players| players.top_n(LEADERBOARD_SIZE))
        .await?;
    Ok(Json(entries))
}
