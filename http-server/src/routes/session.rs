use axum::Json;
use serde_json::Value;

use crate::{middleware::Session, models::SessionState};

// Session introspection for client sync
pub async fn get_session(session: Session) -> Json<Value> {
    Json(session.state.introspection())
}

// Full session dump for debugging
pub async fn debug_session(session: Session) -> Json<SessionState> {
    Json(session.state)
}
