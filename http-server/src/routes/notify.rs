use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, middleware::Session, notify::Notification};

// Notification request; the address falls back to the one given at entry
#[derive(Debug, Default, Deserialize)]
pub struct NotifyRequest {
    pub email: Option<String>,
}

// Sends the winnings summary by email, best effort
pub async fn send_summary(
    State(state): State<AppState>,
    mut session: Session,
    body: Bytes,
) -> Response {
    let request: NotifyRequest = serde_json::from_slice(&body).unwrap_or_default();
    let requested = request
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());

    let Some(to) = requested
        .clone()
        .or_else(|| session.state.email.clone())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "message": "No email address available" })),
        )
            .into_response();
    };

    let notification = Notification::winnings_summary(&to, &session.state);
    let sent = state.notifier.send(&notification).await;

    if requested.is_some() {
        session.state.email = requested;
    }
    let cookie = session.persist_existing(&state.sessions);

    (cookie, Json(json!({ "ok": sent }))).into_response()
}
