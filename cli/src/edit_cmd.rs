//! `retouch edit` - apply one instruction to one file.

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use retouch_core::EditSession;
use retouch_core::IntakePolicy;
use retouch_core::RemoteEditService;
use retouch_core::RetouchConfig;
use retouch_core::SubmitOutcome;
use retouch_core::intake::extension_for;

#[derive(Debug, Parser)]
pub struct EditArgs {
    /// Image or PDF to edit
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Natural-language editing instruction
    #[arg(long, short, value_name = "TEXT")]
    pub prompt: String,

    /// Output path (default: <FILE stem>-edited.<ext> next to the input)
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl EditArgs {
    pub async fn run(self, config: RetouchConfig) -> i32 {
        match self.execute(&config).await {
            Ok(path) => {
                println!("{}", path.display());
                0
            }
            Err(err) => crate::report_error(&err),
        }
    }

    async fn execute(self, config: &RetouchConfig) -> anyhow::Result<PathBuf> {
        let snapshot = IntakePolicy::from(config).load_file(&self.file).await?;

        let mut session = EditSession::new();
        session.seed(snapshot);
        let Some(ticket) = session.begin_submit(&self.prompt)? else {
            anyhow::bail!("an edit is already in progress");
        };

        let client = crate::gemini_client(config);
        let result = client.edit(&ticket.payload, &ticket.instruction).await;
        match session.complete_submit(&ticket, result) {
            SubmitOutcome::Candidate(_) => {}
            SubmitOutcome::Failed(err) => return Err(err.into()),
            SubmitOutcome::Busy | SubmitOutcome::Stale => anyhow::bail!("edit did not complete"),
        }

        let edited = session
            .candidate()
            .context("no edited image was produced")?
            .shared_payload();
        let output = self
            .output
            .unwrap_or_else(|| default_output_path(&self.file, &edited.media_type));
        tokio::fs::write(&output, &edited.data)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;
        tracing::info!(path = %output.display(), bytes = edited.len(), "wrote edited image");
        Ok(output)
    }
}

/// `photo.jpg` edited into PNG becomes `photo-edited.png`.
pub fn default_output_path(input: &Path, media_type: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "retouch".to_string());
    input.with_file_name(format!("{stem}-edited.{}", extension_for(media_type)))
}
