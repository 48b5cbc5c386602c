//! `retouch` entry point.

use clap::Parser;
use clap::Subcommand;
use retouch_cli::GlobalArgs;
use retouch_cli::edit_cmd::EditArgs;
use retouch_cli::session_cmd::SessionArgs;
use retouch_cli::suggest_cmd::SuggestArgs;

/// Edit images and PDFs with natural-language instructions.
#[derive(Debug, Parser)]
#[command(name = "retouch", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply one instruction to a file and write the result
    Edit(EditArgs),

    /// Print editing prompt suggestions for a file
    Suggest(SuggestArgs),

    /// Interactive session with history, undo and redo (commands on stdin)
    Session(SessionArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    retouch_cli::init_logging(cli.global.log_level.as_deref());
    tracing::debug!("retouch v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match cli.global.load_config() {
        Ok(config) => config,
        Err(err) => std::process::exit(retouch_cli::report_error(&err)),
    };

    let code = match cli.command {
        Command::Edit(args) => args.run(config).await,
        Command::Suggest(args) => args.run(config).await,
        Command::Session(args) => args.run(config).await,
    };
    std::process::exit(code);
}
