//! Error types for lotto-server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        tracing::error!("Player store failure: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false, "message": "storage unavailable" })),
        )
            .into_response()
    }
}
