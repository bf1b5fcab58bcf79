//! Squash command — folds a contiguous run of commits into one.

use anyhow::Result;
use clap::Parser;

use super::apply_rewrite;
use crate::engine::Engine;

/// Squash command options.
#[derive(Parser)]
pub struct SquashCommand {
    /// Commits to squash, in any order; they must be consecutive in history.
    #[arg(value_name = "HASH", required = true)]
    pub hashes: Vec<String>,

    /// Message for the squashed commit; prompts with a summary of the
    /// squashed subjects when omitted.
    #[arg(short, long)]
    pub message: Option<String>,
}

impl SquashCommand {
    /// Executes the squash command.
    pub fn execute(self, engine: &Engine) -> Result<()> {
        let hashes = self.hashes;
        apply_rewrite(engine, self.message, |prompt| engine.squash(&hashes, prompt))
    }
}
