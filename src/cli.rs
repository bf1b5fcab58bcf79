//! CLI interface for git-histedit.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::engine::{Engine, EngineEvent, Outcome};
use crate::prompt::MessagePrompt;
use crate::utils::Settings;

mod formatting;
pub mod log;
pub mod prompt;
pub mod rename;
pub mod squash;

use formatting::{format_history, format_outcome};
use prompt::TerminalPrompt;

/// Commits shown after a successful rewrite.
const REFRESH_LIMIT: usize = 10;

/// git-histedit: rename and squash commits without an interactive rebase session.
#[derive(Parser)]
#[command(name = "git-histedit")]
#[command(about = "Rename and squash commits in the current branch", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path inside the repository to operate on.
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Lists recent commits with their decorations.
    Log(log::LogCommand),
    /// Rewrites the message of the tip commit.
    Rename(rename::RenameCommand),
    /// Squashes consecutive commits into one.
    Squash(squash::SquashCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub fn execute(self) -> Result<()> {
        let settings = Settings::load().context("Failed to load settings")?;
        let path = self.repo.unwrap_or_else(|| PathBuf::from("."));
        let engine = Engine::open(&path, settings).with_context(|| {
            format!(
                "Failed to open git repository at {}. Make sure you're in a git repository.",
                path.display()
            )
        })?;

        match self.command {
            Commands::Log(log_cmd) => log_cmd.execute(&engine),
            Commands::Rename(rename_cmd) => rename_cmd.execute(&engine),
            Commands::Squash(squash_cmd) => squash_cmd.execute(&engine),
        }
    }
}

/// Runs a rewrite with a terminal prompt, prints the outcome and the refreshed history.
///
/// A cancelled message is reported as a warning, not a failure.
pub(crate) fn apply_rewrite<F>(engine: &Engine, message: Option<String>, rewrite: F) -> Result<()>
where
    F: FnOnce(&mut dyn MessagePrompt) -> crate::error::Result<Outcome>,
{
    let mut events = engine.subscribe();
    let stdin = io::stdin();
    let mut prompt = TerminalPrompt::new(
        message,
        engine.settings().editor.clone(),
        stdin.is_terminal(),
        stdin.lock(),
    );

    let prompt: &mut dyn MessagePrompt = &mut prompt;
    match rewrite(prompt) {
        Ok(outcome) => println!("{}", format_outcome(&outcome)),
        Err(e) if e.is_abandoned() => {
            eprintln!("warning: {e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    if let Ok(EngineEvent::HistoryChanged { .. }) = events.try_recv() {
        println!();
        println!(
            "{}",
            format_history(&engine.history(Some(REFRESH_LIMIT)), &engine.current_branch())
        );
    }
    Ok(())
}
