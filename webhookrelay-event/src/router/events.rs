use crate::server::AppState;
use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use webhookrelay_domain::{Event, RelayError};

pub fn get_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", post(receive_event))
        .route("/settings/reload", post(reload_settings))
}

/// Hands the event to the dispatcher and answers before delivery happens.
pub async fn receive_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<Event>,
) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        dispatcher.handle(event).await;
    });

    (StatusCode::ACCEPTED, Json(json!({ "accepted": true })))
}

pub async fn reload_settings(State(state): State<Arc<AppState>>) -> Result<Json<Value>, RelayError> {
    let config = state.dispatcher.reload().await?;

    Ok(Json(json!({
        "enabled": config.enabled,
        "active": config.is_active(),
        "method": config.method,
    })))
}
