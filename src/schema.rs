//! # Schema Module
//!
//! Shapes shared by the storage layer and the REST layer: the persisted
//! [`ContentRecord`], the [`NewContent`] insert form, and the request payloads
//! accepted by each generation endpoint together with their enumerations.
//!
//! Deserialization enforces presence of required fields and membership of the
//! enumerations (applying the documented defaults). [`Validate::validate`]
//! covers what serde cannot express, such as blank strings.

use crate::parser::{ParseErrorDetail, ParseErrorKind, parse_grid_size};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// The kind of generation a content record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Caption,
    Bio,
    Hashtags,
    Grid,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Caption => "caption",
            ContentType::Bio => "bio",
            ContentType::Hashtags => "hashtags",
            ContentType::Grid => "grid",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "caption" => Ok(ContentType::Caption),
            "bio" => Ok(ContentType::Bio),
            "hashtags" => Ok(ContentType::Hashtags),
            "grid" => Ok(ContentType::Grid),
            other => Err(ValidationError::UnknownContentType {
                value: other.to_string(),
            }),
        }
    }
}

/// A persisted row capturing one generation request and its output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub image_url: Option<String>,
    pub image_base64: Option<String>,
    pub prompt: Option<String>,
    pub mood: Option<String>,
    pub length: Option<String>,
    pub generated_content: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A content record before the store has assigned its id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContent {
    pub content_type: ContentType,
    pub image_url: Option<String>,
    pub image_base64: Option<String>,
    pub prompt: Option<String>,
    pub mood: Option<String>,
    pub length: Option<String>,
    pub generated_content: serde_json::Value,
}

impl NewContent {
    /// Starts an insert of the given type with only the generated payload set.
    pub fn new(content_type: ContentType, generated_content: serde_json::Value) -> Self {
        Self {
            content_type,
            image_url: None,
            image_base64: None,
            prompt: None,
            mood: None,
            length: None,
            generated_content,
        }
    }

    pub fn with_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Turns the insert into a full record.
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> ContentRecord {
        ContentRecord {
            id,
            content_type: self.content_type,
            image_url: self.image_url,
            image_base64: self.image_base64,
            prompt: self.prompt,
            mood: self.mood,
            length: self.length,
            generated_content: self.generated_content,
            created_at,
        }
    }
}

/// Tone of generated captions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Casual,
    Professional,
    Motivational,
    Trending,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Casual => "casual",
            Mood::Professional => "professional",
            Mood::Motivational => "motivational",
            Mood::Trending => "trending",
        }
    }
}

/// Target length of generated captions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Short,
    #[default]
    Medium,
    Long,
}

impl Length {
    pub fn as_str(&self) -> &'static str {
        match self {
            Length::Short => "short",
            Length::Medium => "medium",
            Length::Long => "long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Fun,
    Professional,
    Minimalist,
    Inspiring,
    Creative,
}

impl Personality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Fun => "fun",
            Personality::Professional => "professional",
            Personality::Minimalist => "minimalist",
            Personality::Inspiring => "inspiring",
            Personality::Creative => "creative",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(Mood, Length, Personality);

/// Layout of a grid split, written `<cols>x<rows>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GridSize {
    TwoByTwo,
    #[default]
    ThreeByThree,
    OneByThree,
    ThreeByOne,
}

impl GridSize {
    /// Number of columns.
    pub fn cols(&self) -> u32 {
        match self {
            GridSize::TwoByTwo => 2,
            GridSize::ThreeByThree => 3,
            GridSize::OneByThree => 1,
            GridSize::ThreeByOne => 3,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        match self {
            GridSize::TwoByTwo => 2,
            GridSize::ThreeByThree => 3,
            GridSize::OneByThree => 3,
            GridSize::ThreeByOne => 1,
        }
    }

    pub fn pieces(&self) -> u32 {
        self.cols() * self.rows()
    }
}

impl Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols(), self.rows())
    }
}

impl FromStr for GridSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = |detail| ValidationError::UnsupportedGridSize {
            value: s.to_string(),
            detail,
        };

        match parse_grid_size(s).map_err(unsupported)? {
            (2, 2) => Ok(GridSize::TwoByTwo),
            (3, 3) => Ok(GridSize::ThreeByThree),
            (1, 3) => Ok(GridSize::OneByThree),
            (3, 1) => Ok(GridSize::ThreeByOne),
            (cols, rows) => Err(unsupported(ParseErrorDetail {
                kind: ParseErrorKind::UnsupportedLayout,
                location: format!("{cols}x{rows}"),
            })),
        }
    }
}

impl TryFrom<String> for GridSize {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GridSize> for String {
    fn from(value: GridSize) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCaptionRequest {
    pub image_base64: Option<String>,
    pub image_url: Option<String>,
    pub prompt: Option<String>,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub length: Length,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBioRequest {
    pub occupation: String,
    pub interests: String,
    pub personality: Personality,
    #[serde(default = "default_true")]
    pub include_emojis: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateHashtagsRequest {
    pub content: String,
    pub niche: Option<String>,
    pub target_audience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConvertRequest {
    pub image_base64: String,
    #[serde(default)]
    pub grid_size: GridSize,
}

/// Checks a deserialized request for constraints serde cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}

impl Validate for GenerateCaptionRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Validate for GenerateBioRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require("occupation", &self.occupation)?;
        require("interests", &self.interests)
    }
}

impl Validate for GenerateHashtagsRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require("content", &self.content)
    }
}

impl Validate for GridConvertRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require("imageBase64", &self.image_base64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Blank { field: &'static str },

    #[error("unknown content type: {value}")]
    UnknownContentType { value: String },

    #[error("unsupported grid size {value:?}: {detail} (expected 2x2, 3x3, 1x3 or 3x1)")]
    UnsupportedGridSize {
        value: String,
        detail: ParseErrorDetail,
    },

    #[error("{field} is not valid base64")]
    InvalidBase64 { field: &'static str },
}
