use crate::{AppState, error::ApiError};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use postcraft::{
    ai::HashtagSet,
    app,
    schema::{GenerateBioRequest, GenerateCaptionRequest, GenerateHashtagsRequest},
};
use serde::Serialize;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CaptionsResponse {
    pub success: bool,
    pub captions: Vec<String>,
    pub content_id: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BioResponse {
    pub success: bool,
    pub bios: Vec<String>,
    pub content_id: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HashtagsResponse {
    pub success: bool,
    pub hashtags: HashtagSet,
    pub content_id: String,
}

const CAPTIONS_FAILED: &str = "Failed to generate captions";
const BIO_FAILED: &str = "Failed to generate bio";
const HASHTAGS_FAILED: &str = "Failed to generate hashtags";

pub async fn generate_captions(
    State(state): State<AppState>,
    body: Result<Json<GenerateCaptionRequest>, JsonRejection>,
) -> Result<Json<CaptionsResponse>, ApiError> {
    let Json(req) = body.map_err(ApiError::json(CAPTIONS_FAILED))?;

    let generated = app::generate_captions(&state.ai, &state.store, req)
        .await
        .map_err(ApiError::context(CAPTIONS_FAILED))?;

    Ok(Json(CaptionsResponse {
        success: true,
        captions: generated.payload,
        content_id: generated.content_id,
    }))
}

pub async fn generate_bio(
    State(state): State<AppState>,
    body: Result<Json<GenerateBioRequest>, JsonRejection>,
) -> Result<Json<BioResponse>, ApiError> {
    let Json(req) = body.map_err(ApiError::json(BIO_FAILED))?;

    let generated = app::generate_bio(&state.ai, &state.store, req)
        .await
        .map_err(ApiError::context(BIO_FAILED))?;

    Ok(Json(BioResponse {
        success: true,
        bios: generated.payload,
        content_id: generated.content_id,
    }))
}

pub async fn generate_hashtags(
    State(state): State<AppState>,
    body: Result<Json<GenerateHashtagsRequest>, JsonRejection>,
) -> Result<Json<HashtagsResponse>, ApiError> {
    let Json(req) = body.map_err(ApiError::json(HASHTAGS_FAILED))?;

    let generated = app::generate_hashtags(&state.ai, &state.store, req)
        .await
        .map_err(ApiError::context(HASHTAGS_FAILED))?;

    Ok(Json(HashtagsResponse {
        success: true,
        hashtags: generated.payload,
        content_id: generated.content_id,
    }))
}
