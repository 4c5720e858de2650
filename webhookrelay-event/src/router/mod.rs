pub mod events;

use crate::server::AppState;
use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use webhookrelay_domain::ApplicationError;

pub fn get_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let path = format!("/{}", state.config.api_version);
    Router::new()
        .nest(&path, events::get_router())
        .route("/", get(get_root))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

pub async fn get_root() -> impl IntoResponse {
    Json(json!({ "success": true }))
}

pub async fn not_found_handler() -> impl IntoResponse {
    ApplicationError::not_found("Not found", Some("route"))
}
