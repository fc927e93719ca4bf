//! API route definitions

use std::sync::Arc;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::{handlers, state::AppState, ServerConfig};

/// Slack above the upload cap for multipart framing
const BODY_LIMIT_SLACK: usize = 64 * 1024;

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "kind": "not_found",
            "message": "Not found. GET /health to check API status.",
        })),
    )
}

async fn handle_405() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": true,
            "kind": "method_not_allowed",
            "message": "Method not allowed for this route.",
        })),
    )
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let allow_any = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    match config.cors_origin.as_deref() {
        Some(origin) if origin != "*" => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new()
                .allow_origin(value)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                warn!(origin, "Invalid CORS_ORIGIN, allowing any origin");
                allow_any
            }
        },
        _ => allow_any,
    }
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        // System
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_status))
        // Data
        .route("/upload", post(handlers::upload_data))
        .route("/preview-data", get(handlers::get_data_preview))
        // Target
        .route("/select-target", post(handlers::select_target))
        .route("/target-info", get(handlers::get_target_info))
        // Preprocessing
        .route("/preprocess", post(handlers::run_preprocessing))
        .route("/preview-processed", get(handlers::get_processed_preview))
        .route("/revert-preprocess", post(handlers::revert_preprocessing))
        // Split
        .route("/split", post(handlers::split_data))
        .route("/split-info", get(handlers::get_split_info))
        // Training
        .route("/train", post(handlers::train_model))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405)
        .with_state(state)
        .layer(DefaultBodyLimit::max(
            config.max_upload_size.saturating_add(BODY_LIMIT_SLACK),
        ))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}
