//! `retouch session` - line-oriented interactive edit session.
//!
//! Reads one command per line from stdin and prints the resulting session
//! state. Suggestions refresh in the background after the current image
//! changes; `suggestions` shows whatever has arrived so far.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use retouch_core::RetouchConfig;
use retouch_core::SessionHandle;
use retouch_core::SubmitOutcome;
use retouch_core::protocol::SessionView;
use retouch_core::protocol::Snapshot;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

#[derive(Debug, Parser)]
pub struct SessionArgs {
    /// Image or PDF to start with
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

const HELP: &str = "\
commands:
  open <file>       start over from an image or PDF
  prompt <text>     set the instruction text
  submit [text]     run the edit (uses the prompt text when omitted)
  accept            keep the generated result and continue editing
  undo | redo       step through history
  jump <n>          make history entry n current
  reset             clear everything
  dismiss           clear the error message
  save <path>       write the result (or current image) to disk
  status            show the session
  suggestions       list prompt suggestions
  use <n>           copy suggestion n into the prompt
  help              show this help
  quit              leave";

/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(PathBuf),
    Prompt(String),
    Submit(Option<String>),
    Accept,
    Undo,
    Redo,
    Jump(usize),
    Reset,
    Dismiss,
    Save(PathBuf),
    Status,
    Suggestions,
    Use(usize),
    Help,
    Quit,
}

impl Command {
    /// Parse a single input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "open" => Command::Open(required(rest, "open <file>")?.into()),
            "prompt" => Command::Prompt(rest.to_string()),
            "submit" => Command::Submit((!rest.is_empty()).then(|| rest.to_string())),
            "accept" => Command::Accept,
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "jump" => Command::Jump(index(rest, "jump <n>")?),
            "reset" => Command::Reset,
            "dismiss" => Command::Dismiss,
            "save" => Command::Save(required(rest, "save <path>")?.into()),
            "status" => Command::Status,
            "suggestions" => Command::Suggestions,
            "use" => Command::Use(index(rest, "use <n>")?),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command `{other}` (try `help`)")),
        };
        Ok(Some(command))
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest)
    }
}

fn index(rest: &str, usage: &str) -> Result<usize, String> {
    required(rest, usage)?
        .parse()
        .map_err(|_| format!("usage: {usage}"))
}

impl SessionArgs {
    pub async fn run(self, config: RetouchConfig) -> i32 {
        match self.execute(config).await {
            Ok(()) => 0,
            Err(err) => crate::report_error(&err),
        }
    }

    async fn execute(self, config: RetouchConfig) -> anyhow::Result<()> {
        let client = Arc::new(crate::gemini_client(&config));
        if !client.is_authenticated() {
            tracing::warn!("no API key configured; edits and suggestions will fail");
        }
        let session = SessionHandle::from_config(client, &config);

        if let Some(file) = &self.file {
            session.open_file(file).await?;
        }
        println!("{}", render(&session.view().await));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    println!("{message}");
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            if let Some(output) = apply(&session, command).await {
                println!("{output}");
            }
        }
        Ok(())
    }
}

/// Execute one command and return what to print.
async fn apply(session: &SessionHandle, command: Command) -> Option<String> {
    let message = match command {
        Command::Open(path) => match session.open_file(&path).await {
            Ok(_) => None,
            Err(err) => Some(err.to_string()),
        },
        Command::Prompt(text) => {
            session.set_prompt(text).await;
            None
        }
        Command::Submit(text) => {
            println!("Editing...");
            match session.submit(text.as_deref()).await {
                Ok(SubmitOutcome::Busy) => Some("An edit is already in progress.".to_string()),
                Ok(SubmitOutcome::Stale) => Some("The result arrived too late and was dropped.".to_string()),
                // Failures and validation errors show up in the rendered view.
                Ok(SubmitOutcome::Candidate(_) | SubmitOutcome::Failed(_)) | Err(_) => None,
            }
        }
        Command::Accept => match session.accept_candidate().await {
            Ok(_) => None,
            Err(err) => Some(err.to_string()),
        },
        Command::Undo => (!session.step_back().await).then(|| "Nothing to undo.".to_string()),
        Command::Redo => (!session.step_forward().await).then(|| "Nothing to redo.".to_string()),
        Command::Jump(index) => (!session.jump_to(index).await)
            .then(|| format!("No other history entry at {index}.")),
        Command::Reset => {
            session.reset().await;
            None
        }
        Command::Dismiss => {
            session.dismiss_error().await;
            None
        }
        Command::Save(path) => return Some(save(session, path).await),
        Command::Status => None,
        Command::Suggestions => return Some(render_suggestions(&session.view().await)),
        Command::Use(n) => {
            let view = session.view().await;
            match n.checked_sub(1).and_then(|i| view.suggestions.get(i)) {
                Some(text) => {
                    session.set_prompt(text.clone()).await;
                    None
                }
                None => return Some(format!("No suggestion {n}.")),
            }
        }
        Command::Help => return Some(HELP.to_string()),
        Command::Quit => return None,
    };

    let view = render(&session.view().await);
    Some(match message {
        Some(message) => format!("{message}\n{view}"),
        None => view,
    })
}

/// Write the pending result if there is one, otherwise the current image.
async fn save(session: &SessionHandle, path: PathBuf) -> String {
    let payload = session
        .inspect(|s| s.candidate().or(s.current()).map(Snapshot::shared_payload))
        .await;
    let Some(payload) = payload else {
        return "Nothing to save yet.".to_string();
    };
    match tokio::fs::write(&path, &payload.data).await {
        Ok(()) => format!(
            "Saved {} ({} bytes) to {}",
            payload.format_tag(),
            payload.len(),
            path.display()
        ),
        Err(err) => format!("Failed to write {}: {err}", path.display()),
    }
}

/// Text rendering of a session view.
pub fn render(view: &SessionView) -> String {
    let mut lines = vec![format!("== {} ({}) ==", view.title(), view.phase)];

    if view.history.is_empty() {
        lines.push("No image loaded. Use `open <file>`.".to_string());
    } else {
        lines.extend(view.history.iter().map(|entry| {
            let marker = if entry.is_current { '*' } else { ' ' };
            format!(
                "{marker} {:>2}  {:<16} {:<16} {} bytes",
                entry.index, entry.label, entry.media_type, entry.size_bytes
            )
        }));
        lines.push(format!(
            "undo: {}  redo: {}",
            yes_no(view.can_undo),
            yes_no(view.can_redo)
        ));
    }

    if let Some(candidate) = &view.candidate {
        lines.push(format!(
            "Result ready: {} ({} bytes). `accept` to keep it or `submit` to try again.",
            candidate.media_type, candidate.size_bytes
        ));
    }
    if !view.prompt.is_empty() {
        lines.push(format!("Prompt: {}", view.prompt));
    }
    if let Some(error) = &view.error {
        lines.push(format!("Error: {error}"));
    }
    lines.join("\n")
}

fn render_suggestions(view: &SessionView) -> String {
    let refreshing = view
        .loading_suggestions
        .then(|| "(refreshing...)".to_string());
    refreshing
        .into_iter()
        .chain(
            view.suggestions
                .iter()
                .enumerate()
                .map(|(i, suggestion)| format!("{:>2}. {suggestion}", i + 1)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
