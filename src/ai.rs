//! # AI Client Module
//!
//! A thin client for the external language-model API. It speaks the OpenAI
//! *chat completions* wire format and exposes the four operations the
//! application needs:
//!
//! - **generate_captions**: three captions for a photo and/or a prompt.
//! - **generate_bio**: three profile bios from occupation, interests and personality.
//! - **generate_hashtags**: hashtags grouped into high, medium and niche reach.
//! - **analyze_image**: a free-text description of an uploaded image.
//!
//! Each structured operation asks for a JSON object response and tolerates
//! missing keys by falling back to empty lists. Transport failures, non-2xx
//! statuses and malformed bodies are reported as [`AiError`].

use crate::schema::{GenerateBioRequest, GenerateCaptionRequest, GenerateHashtagsRequest};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const CAPTION_MAX_TOKENS: u32 = 1000;
const BIO_MAX_TOKENS: u32 = 800;
const HASHTAG_MAX_TOKENS: u32 = 800;
const ANALYSIS_MAX_TOKENS: u32 = 500;

const ANALYSIS_FALLBACK: &str = "Unable to analyze image";

/// Connection settings for the language-model API.
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    config: AiConfig,
}

/// Hashtags grouped by expected reach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HashtagSet {
    /// Popular tags with 1M+ posts.
    #[serde(deserialize_with = "null_as_empty")]
    pub high_reach: Vec<String>,
    /// Tags with 100K-1M posts.
    #[serde(deserialize_with = "null_as_empty")]
    pub medium_reach: Vec<String>,
    /// Specific tags with 10K-100K posts.
    #[serde(deserialize_with = "null_as_empty")]
    pub niche: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CaptionsOutput {
    #[serde(deserialize_with = "null_as_empty")]
    captions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BiosOutput {
    #[serde(deserialize_with = "null_as_empty")]
    bios: Vec<String>,
}

/// Reads a list that the model may also send as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl AiClient {
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub async fn generate_captions(
        &self,
        req: &GenerateCaptionRequest,
    ) -> Result<Vec<String>, AiError> {
        let content = self
            .complete(caption_messages(req), CAPTION_MAX_TOKENS, true)
            .await?;
        let output: CaptionsOutput = parse_json(content)?;

        Ok(output.captions)
    }

    pub async fn generate_bio(&self, req: &GenerateBioRequest) -> Result<Vec<String>, AiError> {
        let content = self
            .complete(bio_messages(req), BIO_MAX_TOKENS, true)
            .await?;
        let output: BiosOutput = parse_json(content)?;

        Ok(output.bios)
    }

    pub async fn generate_hashtags(
        &self,
        req: &GenerateHashtagsRequest,
    ) -> Result<HashtagSet, AiError> {
        let content = self
            .complete(hashtag_messages(req), HASHTAG_MAX_TOKENS, true)
            .await?;

        parse_json(content)
    }

    /// Describes an image given as base64 (or as a complete data URL).
    pub async fn analyze_image(&self, image_base64: &str) -> Result<String, AiError> {
        let content = self
            .complete(analysis_messages(image_base64), ANALYSIS_MAX_TOKENS, false)
            .await?;

        Ok(content
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| ANALYSIS_FALLBACK.to_string()))
    }

    /// Sends one chat completion and returns the first choice's message content.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        json_response: bool,
    ) -> Result<Option<String>, AiError> {
        let api_key = self.config.api_key.as_deref().ok_or(AiError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            response_format: json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
            max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(%url, model = %self.config.model, max_tokens, "requesting chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), %message, "chat completion failed");
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatResponse = serde_json::from_str(&body)?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or(AiError::NoChoices)?;

        Ok(choice.message.content)
    }
}

/// Parses a JSON message content, treating an absent or blank content as empty output.
fn parse_json<T: DeserializeOwned + Default>(content: Option<String>) -> Result<T, AiError> {
    match content {
        Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(&text)?),
        _ => Ok(T::default()),
    }
}

/// Builds a data URL for a base64 image, sniffing the MIME type from its first bytes.
///
/// Input that already is a data URL is passed through unchanged.
pub fn data_url(image_base64: &str) -> String {
    if image_base64.starts_with("data:") {
        return image_base64.to_string();
    }

    let head_len = image_base64.len().min(64) / 4 * 4;
    let mime = image_base64
        .get(..head_len)
        .and_then(|head| STANDARD.decode(head).ok())
        .and_then(|bytes| infer::get(&bytes))
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .map(|kind| kind.mime_type())
        .unwrap_or("image/jpeg");

    format!("data:{mime};base64,{image_base64}")
}

fn caption_messages(req: &GenerateCaptionRequest) -> Vec<ChatMessage> {
    let system = format!(
        r#"You are a Gen Z social media expert. Generate 3 engaging captions based on the mood: {mood} and length: {length}.

Mood guidelines:
- casual: fun, relatable, friendly tone with emojis
- professional: polished but approachable
- motivational: inspiring, uplifting, encouraging
- trending: uses current slang, viral format, trendy phrases

Length guidelines:
- short: 1-2 sentences, under 100 characters
- medium: 2-3 sentences, 100-200 characters
- long: 3-5 sentences, 200-300 characters

Always include relevant emojis and make it engaging for social media.
Respond with JSON in this format: {{ "captions": ["caption1", "caption2", "caption3"] }}"#,
        mood = req.mood,
        length = req.length,
    );

    let image = req
        .image_base64
        .as_deref()
        .filter(|b| !b.is_empty())
        .map(data_url)
        .or_else(|| req.image_url.clone().filter(|u| !u.is_empty()));
    let prompt = req.prompt.as_deref().filter(|p| !p.trim().is_empty());

    let user = match image {
        Some(url) => {
            let text = match prompt {
                Some(p) => format!("Based on this image and prompt: \"{p}\", generate captions."),
                None => "Based on this image, generate captions.".to_string(),
            };
            ChatMessage::user_with_image(text, url)
        }
        None => ChatMessage::user(prompt.unwrap_or("Generate general social media captions")),
    };

    vec![ChatMessage::system(system), user]
}

fn bio_messages(req: &GenerateBioRequest) -> Vec<ChatMessage> {
    let emojis = if req.include_emojis {
        "Include relevant emojis."
    } else {
        "Do not include emojis."
    };

    let system = format!(
        r#"You are a social media bio expert. Create 3 different bio variations for someone who is a {occupation} with interests in {interests} and a {personality} personality. {emojis}

Personality guidelines:
- fun: playful, energetic, casual tone
- professional: polished, business-focused
- minimalist: clean, simple, concise
- inspiring: motivational, uplifting
- creative: artistic, expressive, unique

Keep each bio under 150 characters. Make them engaging and authentic.
Respond with JSON in this format: {{ "bios": ["bio1", "bio2", "bio3"] }}"#,
        occupation = req.occupation,
        interests = req.interests,
        personality = req.personality,
    );

    let user = format!(
        "Generate bios for: {}, interests: {}, personality: {}",
        req.occupation, req.interests, req.personality
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

fn hashtag_messages(req: &GenerateHashtagsRequest) -> Vec<ChatMessage> {
    let system = r#"You are a hashtag expert. Generate relevant hashtags for the given content. Categorize them by reach:
- highReach: popular hashtags with 1M+ posts (5-8 hashtags)
- mediumReach: moderate hashtags with 100K-1M posts (8-12 hashtags)
- niche: specific hashtags with 10K-100K posts (5-10 hashtags)

Focus on current trending hashtags that would help with discovery and engagement.
Respond with JSON in this format: { "highReach": ["tag1", "tag2"], "mediumReach": ["tag1", "tag2"], "niche": ["tag1", "tag2"] }"#;

    let mut user = format!("Generate hashtags for: {}", req.content);
    if let Some(niche) = req.niche.as_deref().filter(|n| !n.is_empty()) {
        user.push_str(&format!(", niche: {niche}"));
    }
    if let Some(audience) = req.target_audience.as_deref().filter(|a| !a.is_empty()) {
        user.push_str(&format!(", target audience: {audience}"));
    }

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

fn analysis_messages(image_base64: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user_with_image(
        "Analyze this image and describe what you see. Focus on the main subject, mood, setting, colors, and any notable elements that would be useful for generating social media content.",
        data_url(image_base64),
    )]
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChatMessage {
    role: Role,
    content: MessageContent,
}

impl ChatMessage {
    fn system<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    fn user_with_image<S: Into<String>>(text: S, url: String) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url },
                },
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("request to AI API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("AI API returned an invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("AI API returned no choices")]
    NoChoices,
}
