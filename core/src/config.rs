//! Retouch configuration loading
//!
//! Loads configuration from `~/.config/retouch/config.toml` (or the path in
//! `RETOUCH_CONFIG`), then applies environment overrides for the API key and
//! endpoint. A missing file means defaults.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::api_clients::GOOGLE_API_BASE;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetouchConfig {
    /// Base URL of the Generative Language API, up to `/models`.
    pub api_base_url: String,

    /// API key; usually supplied through `GEMINI_API_KEY` instead.
    pub api_key: Option<String>,

    /// Image-capable model used for edits.
    pub edit_model: String,

    /// Text model used for prompt suggestions.
    pub suggest_model: String,

    /// Sampling temperature for suggestions (0.0-2.0).
    pub suggest_temperature: f32,

    /// Maximum suggestions kept from a single refresh.
    pub max_suggestions: usize,

    /// Quiet period before suggestions refresh after the current image changes.
    pub suggestion_debounce_ms: u64,

    /// Largest accepted upload.
    pub max_upload_bytes: usize,

    /// Overall timeout for a single model request.
    pub request_timeout_secs: u64,
}

/// 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Upper bound on suggestions kept from one refresh.
pub const MAX_SUGGESTIONS: usize = 8;

impl Default for RetouchConfig {
    fn default() -> Self {
        Self {
            api_base_url: GOOGLE_API_BASE.to_string(),
            api_key: None,
            edit_model: "gemini-2.5-flash-image".to_string(),
            suggest_model: "gemini-2.5-flash".to_string(),
            suggest_temperature: 0.5,
            max_suggestions: MAX_SUGGESTIONS,
            suggestion_debounce_ms: 500,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout_secs: 120,
        }
    }
}

impl RetouchConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "RETOUCH_CONFIG";

    /// Environment variables consulted for the API key, in priority order.
    pub const ENV_API_KEYS: [&'static str; 2] = ["RETOUCH_API_KEY", "GEMINI_API_KEY"];

    /// Environment variable overriding the API base URL.
    pub const ENV_API_BASE: &'static str = "RETOUCH_API_BASE";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "config.toml";

    /// Load configuration from file plus environment.
    ///
    /// Resolution order:
    /// 1. `explicit` path, when given
    /// 2. `RETOUCH_CONFIG` environment variable
    /// 3. `~/.config/retouch/config.toml`
    ///
    /// A missing file at the resolved location yields defaults, except for an
    /// explicit path, which must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let path = Self::resolve_config_path();
                if path.exists() {
                    Self::load_from_path(&path)?
                } else {
                    tracing::debug!(path = %path.display(), "config not found, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: RetouchConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = Self::ENV_API_KEYS.iter().find_map(|name| non_empty(*name)) {
            self.api_key = Some(key);
        }
        if let Some(base) = non_empty(Self::ENV_API_BASE) {
            self.api_base_url = base;
        }
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .map(|h| {
                h.join(".config")
                    .join("retouch")
                    .join(Self::DEFAULT_CONFIG_FILENAME)
            })
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.suggest_temperature) {
            return Err(ConfigError::Invalid(format!(
                "suggest_temperature must be within 0.0..=2.0 (got {})",
                self.suggest_temperature
            )));
        }
        if self.edit_model.trim().is_empty() || self.suggest_model.trim().is_empty() {
            return Err(ConfigError::Invalid("model names must not be empty".to_string()));
        }
        if !(1..=MAX_SUGGESTIONS).contains(&self.max_suggestions) {
            return Err(ConfigError::Invalid(format!(
                "max_suggestions must be within 1..={MAX_SUGGESTIONS} (got {})",
                self.max_suggestions
            )));
        }
        if self.suggestion_debounce_ms == 0 {
            return Err(ConfigError::Invalid(
                "suggestion_debounce_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn suggestion_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.suggestion_debounce_ms)
    }
}
