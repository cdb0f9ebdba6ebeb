use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub const SERVICE_NAME: &str = "MockMate API";

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.app_env,
    });
    (StatusCode::OK, Json(body))
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": format!("Welcome to {}", SERVICE_NAME),
        "docs": "/openapi.json",
        "health": "/health",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
