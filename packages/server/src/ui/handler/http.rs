//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::{
    domain::GroupName,
    infrastructure::dto::http::{GroupDetailDto, GroupSummaryDto, StreamListDto},
    ui::state::AppState,
    usecase::{GetGroupDetailError, GetStreamFileError},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of groups that currently have members
pub async fn get_groups(State(state): State<Arc<AppState>>) -> Json<Vec<GroupSummaryDto>> {
    let groups = state.get_groups_usecase.list().await;

    // Domain Model から DTO への変換
    Json(groups.iter().map(GroupSummaryDto::from).collect())
}

/// Get group detail by name
pub async fn get_group_detail(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<GroupDetailDto>, StatusCode> {
    let group_name = match GroupName::try_from(name) {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!("Invalid group name: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    match state.get_groups_usecase.detail(&group_name).await {
        Ok(group) => Ok(Json(GroupDetailDto::from(group))),
        Err(GetGroupDetailError::GroupNotFound(_)) => Err(StatusCode::NOT_FOUND),
    }
}

/// Get list of available ECG streams
pub async fn get_streams(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StreamListDto>, StatusCode> {
    match state.get_streams_usecase.list().await {
        Ok(entries) => Ok(Json(StreamListDto::from(entries))),
        Err(e) => {
            tracing::error!("Failed to list streams: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Serve a raw ECG stream file
pub async fn get_stream_file(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    match state.get_streams_usecase.read(&file_name).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes)),
        Err(GetStreamFileError::NotFound(name)) => {
            tracing::debug!("Stream file '{}' not found", name);
            Err(StatusCode::NOT_FOUND)
        }
        Err(GetStreamFileError::Unavailable(e)) => {
            tracing::error!("Failed to read stream file '{}': {}", file_name, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
