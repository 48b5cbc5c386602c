//! `retouch suggest` - ask the model for editing prompts.

use std::path::PathBuf;

use clap::Parser;
use retouch_core::IntakePolicy;
use retouch_core::RemoteEditService;
use retouch_core::RetouchConfig;
use retouch_core::protocol::default_suggestions;

#[derive(Debug, Parser)]
pub struct SuggestArgs {
    /// Image or PDF to analyze
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output as a JSON array for automation
    #[arg(long)]
    pub json: bool,
}

impl SuggestArgs {
    pub async fn run(self, config: RetouchConfig) -> i32 {
        let snapshot = match IntakePolicy::from(&config).load_file(&self.file).await {
            Ok(snapshot) => snapshot,
            Err(err) => return crate::report_error(&anyhow::Error::from(err)),
        };

        let client = crate::gemini_client(&config);
        let mut suggestions = client.suggest(snapshot.payload()).await;
        if suggestions.is_empty() {
            tracing::info!("no tailored suggestions, showing defaults");
            suggestions = default_suggestions();
        }

        if self.json {
            match serde_json::to_string_pretty(&suggestions) {
                Ok(json) => println!("{json}"),
                Err(err) => return crate::report_error(&anyhow::Error::from(err)),
            }
        } else {
            for (i, suggestion) in suggestions.iter().enumerate() {
                println!("{:>2}. {suggestion}", i + 1);
            }
        }
        0
    }
}
