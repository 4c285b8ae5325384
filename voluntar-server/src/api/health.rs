//! Health Check API Handlers
//!
//! Liveness probe and a small service descriptor.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::{Value, json};

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /
/// Describes the service and where its surfaces live
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "rest": "/api",
        "graphql": "/graphql",
        "subscriptions": "/graphql/ws",
        "websocket": "/ws",
    }))
}
