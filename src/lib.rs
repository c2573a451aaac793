//! # Social Media Content Assistant
//!
//! This crate is the backend of a content assistant for social media. Users
//! upload a photo or describe what they want to post, and the crate asks an
//! external language model for captions, profile bios and hashtags, describes
//! uploaded images, and cuts images into posting grids. Every generation is
//! kept as a content record so it can be listed or deleted later.
//!
//! ## Features
//!
//! - **Generation**: captions (by mood and length), bios (by personality) and
//!   hashtags (grouped by reach) through the OpenAI chat-completions API.
//! - **Image analysis**: a description of an uploaded photo to seed captions.
//! - **Grid split**: 2x2, 3x3, 1x3 and 3x1 tiles for sequential posting.
//! - **History**: records stored in SQLite (default), PostgreSQL (`postgres`
//!   feature) or, without a database, in memory.
//!
//! ## Usage
//!
//! The operations in [`app`] take an [`ai::AiClient`] and a [`store::Store`]:
//!
//! ```no_run
//! use postcraft::prelude::*;
//!
//! async fn caption(ai: &AiClient, store: &Store) -> Result<(), AppError> {
//!     let req = GenerateCaptionRequest {
//!         prompt: Some("sunset at the pier".to_string()),
//!         mood: Mood::Trending,
//!         ..Default::default()
//!     };
//!
//!     let generated = generate_captions(ai, store, req).await?;
//!     println!("{} -> {:?}", generated.content_id, generated.payload);
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod app;
pub mod config;
pub mod database;
pub mod dialect;
pub mod grid;
pub mod parser;
pub mod schema;
pub mod store;

pub mod prelude {
    pub use crate::ai::{AiClient, AiConfig, AiError, HashtagSet};
    pub use crate::app::{
        AppError, Generated, UploadAnalysis, analyze_upload, convert_grid, find_content,
        generate_bio, generate_captions, generate_hashtags, list_content, remove_content,
    };
    pub use crate::config::{AppConfig, ConfigError};
    pub use crate::grid::{GridError, GridPiece, GridSplit, split_image, write_pieces};
    pub use crate::schema::{
        ContentRecord, ContentType, GenerateBioRequest, GenerateCaptionRequest,
        GenerateHashtagsRequest, GridConvertRequest, GridSize, Length, Mood, NewContent,
        Personality, ValidationError,
    };
    pub use crate::store::{MemoryStore, Store, StoreError};
    pub use chrono::{DateTime, Utc};
}
