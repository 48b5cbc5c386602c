//! HTTP clients for hosted generative model services.
//!
//! Only the Google Generative Language API is wired up; it performs both the
//! image edits and the prompt suggestions.

mod gemini;

pub use gemini::GOOGLE_API_BASE;
pub use gemini::GeminiClient;
pub use gemini::GeminiConfig;

use thiserror::Error;

/// Errors from API client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No API key configured.
    #[error("No API key configured (set GEMINI_API_KEY or `api_key` in config.toml)")]
    NotAuthenticated,

    /// Network request failed.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code.
        status: u16,
        /// Error message from API.
        message: String,
        /// Error status string (if provided), e.g. `INVALID_ARGUMENT`.
        error_type: Option<String>,
    },

    /// Failed to parse API response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;
