//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::data::{FileFormat, Preview};
use crate::error::PipelineError;
use crate::pipeline::{
    LoadSummary, PreprocessSummary, RevertSummary, SplitInfo, SplitSummary, StatusSummary,
    TargetSummary, TrainSummary,
};

use super::error::{Result, ServerError};
use super::state::AppState;

/// Multipart field carrying the uploaded file
const UPLOAD_FIELD: &str = "file";

// ============================================================================
// System
// ============================================================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.uptime_secs(),
    }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusSummary> {
    Json(state.pipeline.lock().await.status())
}

// ============================================================================
// Data Handlers
// ============================================================================

/// Upload and parse a data file, replacing the current dataset
pub async fn upload_data(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<LoadSummary>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ServerError::BadRequest("Uploaded file has no name".to_string()))?;

        if FileFormat::from_filename(&file_name).is_none() {
            return Err(PipelineError::UnsupportedFormat(file_name).into());
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        let max = state.config.max_upload_size;
        if data.len() > max {
            return Err(ServerError::BadRequest(format!(
                "File too large: {} bytes (limit {} bytes)",
                data.len(),
                max
            )));
        }

        info!(file = %file_name, bytes = data.len(), "Received upload");
        let summary = state
            .run_blocking(move |pipeline| pipeline.load(&data, &file_name))
            .await?;
        return Ok(Json(summary));
    }

    Err(ServerError::BadRequest("No file uploaded".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    limit: Option<usize>,
}

pub async fn get_data_preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Preview>> {
    Ok(Json(state.pipeline.lock().await.preview(query.limit)?))
}

// ============================================================================
// Target
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTargetRequest {
    target_column: String,
}

pub async fn select_target(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SelectTargetRequest>, JsonRejection>,
) -> Result<Json<TargetSummary>> {
    let Json(request) = payload?;
    let summary = state
        .pipeline
        .lock()
        .await
        .select_target(&request.target_column)?;
    Ok(Json(summary))
}

pub async fn get_target_info(State(state): State<Arc<AppState>>) -> Result<Json<TargetSummary>> {
    Ok(Json(state.pipeline.lock().await.target_info()?))
}

// ============================================================================
// Preprocessing
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PreprocessRequest {
    preprocess: String,
}

pub async fn run_preprocessing(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PreprocessRequest>, JsonRejection>,
) -> Result<Json<PreprocessSummary>> {
    let Json(request) = payload?;
    let summary = state
        .run_blocking(move |pipeline| pipeline.preprocess(&request.preprocess))
        .await?;
    Ok(Json(summary))
}

pub async fn get_processed_preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Preview>> {
    Ok(Json(state.pipeline.lock().await.processed_preview(query.limit)?))
}

pub async fn revert_preprocessing(State(state): State<Arc<AppState>>) -> Json<RevertSummary> {
    Json(state.pipeline.lock().await.revert_preprocess())
}

// ============================================================================
// Split
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRequest {
    split_ratio: f64,
}

pub async fn split_data(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SplitRequest>, JsonRejection>,
) -> Result<Json<SplitSummary>> {
    let Json(request) = payload?;
    let summary = state
        .run_blocking(move |pipeline| pipeline.split(request.split_ratio))
        .await?;
    Ok(Json(summary))
}

pub async fn get_split_info(State(state): State<Arc<AppState>>) -> Result<Json<SplitInfo>> {
    Ok(Json(state.pipeline.lock().await.split_info()?))
}

// ============================================================================
// Training
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    model: String,
}

pub async fn train_model(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<TrainRequest>, JsonRejection>,
) -> Result<Json<TrainSummary>> {
    let Json(request) = payload?;
    let summary = state
        .run_blocking(move |pipeline| pipeline.train(&request.model))
        .await?;
    Ok(Json(summary))
}
