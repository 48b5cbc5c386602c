//! Native Google Generative AI client.
//!
//! Two non-streaming `generateContent` calls:
//! - image edits against an image-capable model, returning inline image data
//! - prompt suggestions against a text model in JSON response mode

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use retouch_protocol::DEFAULT_GENERATED_MEDIA_TYPE;
use retouch_protocol::ImagePayload;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use super::ApiError;
use super::ApiResult;
use crate::config::MAX_SUGGESTIONS;
use crate::config::RetouchConfig;
use crate::error::EditError;
use crate::service::RemoteEditService;

/// Google Generative AI API base URL.
pub const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL up to and including `/models`.
    pub base_url: String,
    /// API key sent in `x-goog-api-key`.
    pub api_key: Option<String>,
    /// Image-capable model used for edits.
    pub edit_model: String,
    /// Text model used for suggestions.
    pub suggest_model: String,
    /// Sampling temperature for suggestions.
    pub suggest_temperature: f32,
    /// Upper bound on the number of suggestions returned.
    pub max_suggestions: usize,
    /// Overall timeout for a single request.
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: GOOGLE_API_BASE.to_string(),
            api_key: None,
            edit_model: "gemini-2.5-flash-image".to_string(),
            suggest_model: "gemini-2.5-flash".to_string(),
            suggest_temperature: 0.5,
            max_suggestions: MAX_SUGGESTIONS,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl From<&RetouchConfig> for GeminiConfig {
    fn from(config: &RetouchConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            edit_model: config.edit_model.clone(),
            suggest_model: config.suggest_model.clone(),
            suggest_temperature: config.suggest_temperature,
            max_suggestions: config.max_suggestions.min(MAX_SUGGESTIONS),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Google error response format.
#[derive(Debug, Deserialize)]
struct GoogleError {
    code: Option<u16>,
    message: String,
    status: Option<String>,
}

/// Google error wrapper.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: GoogleError,
}

/// `generateContent` response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

/// Prompt feedback (for blocked prompts).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    fn parts(&self) -> &[Part] {
        self.first_candidate()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let text: String = self
            .parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Native Google Generative AI client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        let client = crate::default_client::create_client(config.request_timeout);
        Self { client, config }
    }

    /// Checks whether an API key is available.
    pub fn is_authenticated(&self) -> bool {
        self.api_key().is_ok()
    }

    /// Apply `instruction` to `payload` using the edit model.
    pub async fn edit_image(
        &self,
        payload: &ImagePayload,
        instruction: &str,
    ) -> Result<ImagePayload, EditError> {
        tracing::info!(
            model = %self.config.edit_model,
            media_type = %payload.media_type,
            bytes = payload.len(),
            "requesting image edit"
        );
        let body = build_edit_body(payload, instruction);
        let response = self.generate(&self.config.edit_model, &body).await?;
        let edited = extract_edited_image(&response)?;
        tracing::info!(
            media_type = %edited.media_type,
            bytes = edited.len(),
            "received edited image"
        );
        Ok(edited)
    }

    /// Ask the suggestion model for editing prompts tailored to `payload`.
    pub async fn fetch_suggestions(&self, payload: &ImagePayload) -> ApiResult<Vec<String>> {
        let body = build_suggestion_body(payload, self.config.suggest_temperature);
        let response = self.generate(&self.config.suggest_model, &body).await?;
        let Some(text) = response.text() else {
            return Ok(Vec::new());
        };
        parse_suggestions(&text, self.config.max_suggestions)
    }

    fn api_key(&self) -> ApiResult<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ApiError::NotAuthenticated)
    }

    async fn generate(&self, model: &str, body: &Value) -> ApiResult<GenerateResponse> {
        let key = self.api_key()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_str(key)
                .map_err(|_| ApiError::InvalidConfig("Invalid API key".to_string()))?,
        );

        let url = format!(
            "{}/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&text) {
                return Err(ApiError::ApiResponse {
                    status: error_response.error.code.unwrap_or(status.as_u16()),
                    message: error_response.error.message,
                    error_type: error_response.error.status,
                });
            }

            return Err(ApiError::ApiResponse {
                status: status.as_u16(),
                message: text,
                error_type: None,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::Parse(format!("invalid generateContent response: {e}")))
    }
}

#[async_trait]
impl RemoteEditService for GeminiClient {
    async fn edit(
        &self,
        payload: &ImagePayload,
        instruction: &str,
    ) -> Result<ImagePayload, EditError> {
        self.edit_image(payload, instruction).await
    }

    async fn suggest(&self, payload: &ImagePayload) -> Vec<String> {
        match self.fetch_suggestions(payload).await {
            Ok(suggestions) => suggestions,
            Err(err) => {
                tracing::warn!("Failed to generate suggestions: {err}");
                Vec::new()
            }
        }
    }
}

fn inline_part(payload: &ImagePayload) -> Value {
    json!({
        "inlineData": {
            "data": payload.to_base64(),
            "mimeType": payload.media_type,
        }
    })
}

fn edit_prompt(instruction: &str) -> String {
    format!(
        "Act as a professional photo editor.\n\
         Instruction: {instruction}\n\n\
         Strictly output the edited image. Do not provide any conversational text, \
         descriptions, or \"Here is your image\" messages. Just the image."
    )
}

const SUGGESTION_PROMPT: &str = "Analyze this image/document and generate 5 professional, \
high-quality image editing prompts relevant to this specific content.

Focus on practical tasks tailored to the image subject (e.g., product photography, portraits, \
landscapes, or documents).
Examples of professional prompts:
- \"Isolate the product on a clean white studio background\"
- \"Retouch skin texture for a professional portrait look\"
- \"Remove people from the background\"
- \"Color grade with a teal and orange cinematic aesthetic\"
- \"Enhance clarity and remove noise from the text\"

Avoid whimsical or cartoonish suggestions unless the image style clearly warrants it.

Return ONLY a JSON array of strings. Do not include markdown formatting like ```json.";

fn build_edit_body(payload: &ImagePayload, instruction: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                inline_part(payload),
                { "text": edit_prompt(instruction) },
            ]
        }]
    })
}

fn build_suggestion_body(payload: &ImagePayload, temperature: f32) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                inline_part(payload),
                { "text": SUGGESTION_PROMPT },
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "temperature": temperature,
        }
    })
}

/// Pull the first inline image out of an edit response, or classify why
/// there is none.
fn extract_edited_image(response: &GenerateResponse) -> Result<ImagePayload, EditError> {
    if let Some(feedback) = &response.prompt_feedback
        && let Some(reason) = &feedback.block_reason
    {
        return Err(EditError::ModelRefusal {
            reason: reason.clone(),
        });
    }

    if let Some(inline) = response.parts().iter().find_map(|p| p.inline_data.as_ref()) {
        let media_type = inline
            .mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_GENERATED_MEDIA_TYPE);
        return ImagePayload::from_base64(media_type, &inline.data).map_err(|e| {
            EditError::Transport(ApiError::Parse(format!("invalid inline image data: {e}")))
        });
    }

    if let Some(reason) = response
        .first_candidate()
        .and_then(|c| c.finish_reason.as_deref())
        && reason != "STOP"
    {
        return Err(EditError::ModelRefusal {
            reason: reason.to_string(),
        });
    }

    Err(EditError::no_image(response.text().as_deref()))
}

/// Parse the JSON array returned in suggestion mode.
fn parse_suggestions(text: &str, limit: usize) -> ApiResult<Vec<String>> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let values: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| ApiError::Parse(format!("suggestions are not a JSON array: {e}")))?;

    let mut suggestions = Vec::with_capacity(values.len().min(limit));
    for value in values {
        let Value::String(s) = value else {
            return Err(ApiError::Parse(
                "suggestions array contains non-string values".to_string(),
            ));
        };
        let s = s.trim();
        if !s.is_empty() {
            suggestions.push(s.to_string());
        }
    }
    suggestions.truncate(limit);
    Ok(suggestions)
}
