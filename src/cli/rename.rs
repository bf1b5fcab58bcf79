//! Rename command — rewrites the message of the tip commit.

use anyhow::Result;
use clap::Parser;

use super::apply_rewrite;
use crate::engine::Engine;

/// Rename command options.
#[derive(Parser)]
pub struct RenameCommand {
    /// Commit to rename; must be the current tip.
    #[arg(value_name = "HASH")]
    pub hash: String,

    /// New message; prompts when omitted.
    #[arg(short, long)]
    pub message: Option<String>,
}

impl RenameCommand {
    /// Executes the rename command.
    pub fn execute(self, engine: &Engine) -> Result<()> {
        let hash = self.hash;
        apply_rewrite(engine, self.message, |prompt| engine.rename(&hash, prompt))
    }
}
