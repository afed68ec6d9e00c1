use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use std::io::ErrorKind;

use crate::AppState;

// Catalog endpoint: static item lists keyed by category name
pub async fn get_catalog(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Json<Vec<Value>> {
    Json(read_catalog(&state.catalog_dir, &category).await)
}

/// Reads `<dir>/<category>.json`. Any problem yields an empty list.
pub async fn read_catalog(dir: &std::path::Path, category: &str) -> Vec<Value> {
    if !is_valid_category(category) {
        tracing::warn!("Rejected catalog category {:?}", category);
        return Vec::new();
    }

    let path = dir.join(format!("{category}.json"));
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("No catalog file at {:?}", path);
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Failed to read catalog {:?}: {}", path, e);
            return Vec::new();
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            tracing::warn!("Catalog {:?} is not a JSON array", path);
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Catalog {:?} is not valid JSON: {}", path, e);
            Vec::new()
        }
    }
}

fn is_valid_category(category: &str) -> bool {
    !category.is_empty()
        && category
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
