//! # Content Assistant Operations
//!
//! This module ties the layers together. Every public function here is one
//! user-facing operation: it validates the request, calls the AI client or
//! the grid splitter, and persists a content record describing what was
//! generated.
//!
//! ## Provided Operations
//!
//! - **generate_captions**, **generate_bio**, **generate_hashtags**: forward a
//!   validated request to the language model and store the result.
//! - **analyze_upload**: checks that an upload is an image and asks the model
//!   to describe it. Nothing is stored.
//! - **convert_grid**: splits a base64 image into grid tiles and stores a
//!   summary of the split.
//! - **list_content**, **find_content**, **remove_content**: history access.
//!
//! ## Error Handling
//!
//! All operations return [`AppError`], which wraps the error of whichever
//! layer failed.

use crate::{
    ai::{AiClient, AiError, HashtagSet},
    grid::{GridError, GridSplit, split_image},
    schema::{
        ContentRecord, ContentType, GenerateBioRequest, GenerateCaptionRequest,
        GenerateHashtagsRequest, GridConvertRequest, NewContent, Validate, ValidationError,
    },
    store::{Store, StoreError},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use serde_json::json;
use tokio::task::JoinError;

/// The output of a generation together with the id of the record that stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<T> {
    pub content_id: String,
    pub payload: T,
}

/// Result of analysing an uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAnalysis {
    pub image_base64: String,
    pub analysis: String,
    pub filename: String,
    pub size: usize,
}

/// Generates three captions for an image and/or prompt and stores them.
pub async fn generate_captions(
    ai: &AiClient,
    store: &Store,
    req: GenerateCaptionRequest,
) -> Result<Generated<Vec<String>>, AppError> {
    req.validate()?;

    let captions = ai.generate_captions(&req).await?;

    let record = store
        .create_content(NewContent {
            content_type: ContentType::Caption,
            image_url: req.image_url,
            image_base64: req.image_base64,
            prompt: req.prompt,
            mood: Some(req.mood.to_string()),
            length: Some(req.length.to_string()),
            generated_content: json!({ "captions": captions }),
        })
        .await?;

    Ok(Generated {
        content_id: record.id,
        payload: captions,
    })
}

/// Generates three bio variations and stores them.
///
/// The stored prompt is `"<occupation> - <interests> - <personality>"`.
pub async fn generate_bio(
    ai: &AiClient,
    store: &Store,
    req: GenerateBioRequest,
) -> Result<Generated<Vec<String>>, AppError> {
    req.validate()?;

    let bios = ai.generate_bio(&req).await?;

    let prompt = format!("{} - {} - {}", req.occupation, req.interests, req.personality);
    let record = store
        .create_content(
            NewContent::new(ContentType::Bio, json!({ "bios": bios })).with_prompt(prompt),
        )
        .await?;

    Ok(Generated {
        content_id: record.id,
        payload: bios,
    })
}

/// Generates hashtags grouped by reach and stores them.
pub async fn generate_hashtags(
    ai: &AiClient,
    store: &Store,
    req: GenerateHashtagsRequest,
) -> Result<Generated<HashtagSet>, AppError> {
    req.validate()?;

    let hashtags = ai.generate_hashtags(&req).await?;

    let generated = serde_json::to_value(&hashtags).unwrap_or_else(|_| json!({}));
    let record = store
        .create_content(NewContent::new(ContentType::Hashtags, generated).with_prompt(req.content))
        .await?;

    Ok(Generated {
        content_id: record.id,
        payload: hashtags,
    })
}

/// Checks that `bytes` is an image and asks the model to describe it.
pub async fn analyze_upload(
    ai: &AiClient,
    bytes: &[u8],
    filename: String,
) -> Result<UploadAnalysis, AppError> {
    if !infer::is_image(bytes) {
        return Err(AppError::NotAnImage);
    }

    let image_base64 = STANDARD.encode(bytes);
    let analysis = ai.analyze_image(&image_base64).await?;

    Ok(UploadAnalysis {
        image_base64,
        analysis,
        filename,
        size: bytes.len(),
    })
}

/// Splits a base64 image into grid tiles and stores a summary of the split.
pub async fn convert_grid(
    store: &Store,
    req: GridConvertRequest,
) -> Result<Generated<GridSplit>, AppError> {
    req.validate()?;

    let bytes = decode_base64_image(&req.image_base64)?;
    let size = req.grid_size;
    let split = tokio::task::spawn_blocking(move || split_image(&bytes, size)).await??;

    let summary = serde_json::to_value(split.summary()).unwrap_or_else(|_| json!({}));
    let record = store
        .create_content(NewContent::new(ContentType::Grid, summary).with_prompt(size.to_string()))
        .await?;

    Ok(Generated {
        content_id: record.id,
        payload: split,
    })
}

/// Lists stored records of the given type name, newest first.
pub async fn list_content(store: &Store, content_type: &str) -> Result<Vec<ContentRecord>, AppError> {
    let content_type: ContentType = content_type.parse()?;

    Ok(store.get_content_by_type(content_type).await?)
}

pub async fn find_content(store: &Store, id: &str) -> Result<ContentRecord, AppError> {
    store
        .get_content(id)
        .await?
        .ok_or_else(|| AppError::NotFound { id: id.to_string() })
}

pub async fn remove_content(store: &Store, id: &str) -> Result<(), AppError> {
    if !store.delete_content(id).await? {
        return Err(AppError::NotFound { id: id.to_string() });
    }

    Ok(())
}

/// Decodes base64 image data, accepting a bare payload or a full data URL.
fn decode_base64_image(data: &str) -> Result<Vec<u8>, ValidationError> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, b64)| b64).unwrap_or_default(),
        None => data,
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|_| ValidationError::InvalidBase64 {
            field: "imageBase64",
        })
}

/// Error types within the application, one variant per failing layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Ai(#[from] AiError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Grid(#[from] GridError),

    #[error("uploaded file is not a recognised image")]
    NotAnImage,

    #[error("content not found: {id}")]
    NotFound { id: String },

    #[error("background task failed: {0}")]
    Task(#[from] JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ai::{
            AiConfig,
            mock::{API_KEY, completion, serve},
        },
        schema::{GridSize, Mood, Personality},
    };
    use axum::http::StatusCode;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn client_for(base_url: &str) -> AiClient {
        AiClient::new(AiConfig {
            api_key: Some(API_KEY.to_string()),
            base_url: base_url.to_string(),
            ..AiConfig::default()
        })
        .unwrap()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([10u8, 200, 120]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_generate_captions_persists_record() {
        let server = serve(
            StatusCode::OK,
            completion(Some(r#"{"captions": ["a", "b", "c"]}"#)),
        )
        .await;
        let ai = client_for(&server.base_url);
        let store = Store::connect(None).await.unwrap();

        let generated = generate_captions(
            &ai,
            &store,
            GenerateCaptionRequest {
                prompt: Some("rooftop dinner".to_string()),
                mood: Mood::Motivational,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(vec!["a", "b", "c"], generated.payload);

        let record = find_content(&store, &generated.content_id).await.unwrap();
        assert_eq!(ContentType::Caption, record.content_type);
        assert_eq!(Some("rooftop dinner".to_string()), record.prompt);
        assert_eq!(Some("motivational".to_string()), record.mood);
        assert_eq!(Some("medium".to_string()), record.length);
        assert_eq!(json!({ "captions": ["a", "b", "c"] }), record.generated_content);
    }

    #[tokio::test]
    async fn test_generate_bio_prompt() {
        let server = serve(StatusCode::OK, completion(Some(r#"{"bios": ["x"]}"#))).await;
        let ai = client_for(&server.base_url);
        let store = Store::connect(None).await.unwrap();

        let generated = generate_bio(
            &ai,
            &store,
            GenerateBioRequest {
                occupation: "nurse".to_string(),
                interests: "running".to_string(),
                personality: Personality::Inspiring,
                include_emojis: true,
            },
        )
        .await
        .unwrap();

        let record = find_content(&store, &generated.content_id).await.unwrap();
        assert_eq!(
            Some("nurse - running - inspiring".to_string()),
            record.prompt
        );
        assert_eq!(json!({ "bios": ["x"] }), record.generated_content);
    }

    #[tokio::test]
    async fn test_generate_hashtags_record_shape() {
        let server = serve(
            StatusCode::OK,
            completion(Some(r##"{"highReach": ["#food"], "niche": ["#ramen"]}"##)),
        )
        .await;
        let ai = client_for(&server.base_url);
        let store = Store::connect(None).await.unwrap();

        let generated = generate_hashtags(
            &ai,
            &store,
            GenerateHashtagsRequest {
                content: "homemade ramen".to_string(),
                niche: None,
                target_audience: Some("students".to_string()),
            },
        )
        .await
        .unwrap();

        let record = find_content(&store, &generated.content_id).await.unwrap();
        assert_eq!(Some("homemade ramen".to_string()), record.prompt);
        assert_eq!(
            json!({ "highReach": ["#food"], "mediumReach": [], "niche": ["#ramen"] }),
            record.generated_content
        );
        assert!(
            server.requests()[0]["messages"][1]["content"]
                .as_str()
                .unwrap()
                .ends_with(", target audience: students")
        );
    }

    #[tokio::test]
    async fn test_invalid_request_skips_ai_and_storage() {
        let server = serve(StatusCode::OK, completion(Some("{}"))).await;
        let ai = client_for(&server.base_url);
        let store = Store::connect(None).await.unwrap();

        let result = generate_hashtags(
            &ai,
            &store,
            GenerateHashtagsRequest {
                content: " ".to_string(),
                niche: None,
                target_audience: None,
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(server.requests().is_empty());
        assert!(list_content(&store, "hashtags").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ai_failure_is_not_persisted() {
        let server = serve(
            StatusCode::TOO_MANY_REQUESTS,
            serde_json::json!({ "error": { "message": "Rate limit reached" } }),
        )
        .await;
        let ai = client_for(&server.base_url);
        let store = Store::connect(None).await.unwrap();

        let err = generate_captions(&ai, &store, GenerateCaptionRequest::default())
            .await
            .unwrap_err();

        assert_eq!("AI API returned 429: Rate limit reached", err.to_string());
        assert!(list_content(&store, "caption").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_upload() {
        let server = serve(StatusCode::OK, completion(Some("A green square."))).await;
        let ai = client_for(&server.base_url);
        let bytes = png(4, 4);

        let analysis = analyze_upload(&ai, &bytes, "square.png".to_string())
            .await
            .unwrap();

        assert_eq!("A green square.", analysis.analysis);
        assert_eq!(bytes.len(), analysis.size);
        assert_eq!(STANDARD.encode(&bytes), analysis.image_base64);
        assert_eq!("square.png", analysis.filename);

        let result = analyze_upload(&ai, b"plain text", "notes.txt".to_string()).await;
        assert!(matches!(result, Err(AppError::NotAnImage)));
        assert_eq!(1, server.requests().len());
    }

    #[tokio::test]
    async fn test_convert_grid() {
        let store = Store::connect(None).await.unwrap();
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(png(90, 60)));

        let generated = convert_grid(
            &store,
            GridConvertRequest {
                image_base64: data_url,
                grid_size: GridSize::OneByThree,
            },
        )
        .await
        .unwrap();

        assert_eq!(3, generated.payload.pieces.len());

        let record = find_content(&store, &generated.content_id).await.unwrap();
        assert_eq!(ContentType::Grid, record.content_type);
        assert_eq!(
            json!({ "gridSize": "1x3", "pieces": 3, "pieceWidth": 90, "pieceHeight": 20 }),
            record.generated_content
        );
    }

    #[tokio::test]
    async fn test_convert_grid_rejects_bad_input() {
        let store = Store::connect(None).await.unwrap();

        let result = convert_grid(
            &store,
            GridConvertRequest {
                image_base64: "%%% not base64 %%%".to_string(),
                grid_size: GridSize::TwoByTwo,
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::InvalidBase64 { .. }))
        ));

        let result = convert_grid(
            &store,
            GridConvertRequest {
                image_base64: STANDARD.encode(png(2, 2)),
                grid_size: GridSize::ThreeByThree,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Grid(GridError::TooSmall { .. }))));
        assert!(list_content(&store, "grid").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_operations() {
        let store = Store::connect(None).await.unwrap();
        let record = store
            .create_content(NewContent::new(ContentType::Bio, json!({ "bios": [] })))
            .await
            .unwrap();

        assert_eq!(1, list_content(&store, "bio").await.unwrap().len());
        assert!(matches!(
            list_content(&store, "reels").await,
            Err(AppError::Validation(ValidationError::UnknownContentType { .. }))
        ));

        remove_content(&store, &record.id).await.unwrap();
        assert!(matches!(
            remove_content(&store, &record.id).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            find_content(&store, &record.id).await,
            Err(AppError::NotFound { .. })
        ));
    }
}
