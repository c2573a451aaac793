use crate::{AppState, error::ApiError};
use axum::{
    Json,
    extract::{Path, State},
};
use postcraft::{app, schema::ContentRecord};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ContentListResponse {
    pub success: bool,
    pub content: Vec<ContentRecord>,
}

#[derive(Serialize, Debug)]
pub struct ContentItemResponse {
    pub success: bool,
    pub content: ContentRecord,
}

#[derive(Serialize, Debug)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// `GET /api/content/{type}`
pub async fn list_content(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
) -> Result<Json<ContentListResponse>, ApiError> {
    let content = app::list_content(&state.store, &content_type)
        .await
        .map_err(ApiError::context("Failed to fetch content"))?;

    Ok(Json(ContentListResponse {
        success: true,
        content,
    }))
}

pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContentItemResponse>, ApiError> {
    let content = app::find_content(&state.store, &id)
        .await
        .map_err(ApiError::context("Failed to fetch content"))?;

    Ok(Json(ContentItemResponse {
        success: true,
        content,
    }))
}

/// `DELETE /api/content/{id}`
pub async fn delete_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    app::remove_content(&state.store, &id)
        .await
        .map_err(ApiError::context("Failed to delete content"))?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "Content deleted".to_string(),
    }))
}
