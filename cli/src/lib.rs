//! Command-line front end for retouch.
//!
//! ## Commands
//!
//! - `retouch edit <FILE> --prompt <TEXT>` - one-shot edit written to disk
//! - `retouch suggest <FILE>` - prompt ideas for an image
//! - `retouch session [<FILE>]` - interactive edit session on stdin

pub mod edit_cmd;
pub mod session_cmd;
pub mod suggest_cmd;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use retouch_core::GeminiClient;
use retouch_core::GeminiConfig;
use retouch_core::RetouchConfig;
use retouch_core::SessionError;
use retouch_core::ValidationError;

/// Exit code for a rejected upload or instruction.
pub const EXIT_INVALID_INPUT: i32 = 2;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Config file (default: $RETOUCH_CONFIG or ~/.config/retouch/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Gemini API key (overrides GEMINI_API_KEY and the config file)
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Image model used for edits
    #[arg(long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Log filter, e.g. `debug` or `retouch_core=trace` (default: $RUST_LOG or info)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,
}

impl GlobalArgs {
    /// Resolve the effective config: file, then environment, then flags.
    pub fn load_config(&self) -> anyhow::Result<RetouchConfig> {
        let mut config =
            RetouchConfig::load(self.config.as_deref()).context("failed to load configuration")?;
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(model) = &self.model {
            config.edit_model = model.clone();
        }
        Ok(config)
    }
}

/// Install the stderr log subscriber.
pub fn init_logging(filter: Option<&str>) {
    let env_filter = match filter {
        Some(directive) => tracing_subscriber::EnvFilter::new(directive),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn gemini_client(config: &RetouchConfig) -> GeminiClient {
    GeminiClient::new(GeminiConfig::from(config))
}

/// Print `err` and map it to a process exit code.
pub fn report_error(err: &anyhow::Error) -> i32 {
    eprintln!("Error: {err:#}");
    let invalid_input = err.chain().any(|cause| {
        cause.is::<ValidationError>()
            || matches!(
                cause.downcast_ref::<SessionError>(),
                Some(SessionError::Validation(_))
            )
    });
    if invalid_input { EXIT_INVALID_INPUT } else { 1 }
}
