//! Commit message renaming for the branch tip.

use std::io::Write;

use tracing::info;

use crate::engine::{Outcome, FORCE_PUSH_WARNING};
use crate::error::{HisteditError, Result};
use crate::git::commit::short_hash;
use crate::git::history::{HistoryReader, UNRESOLVED_TIP};
use crate::git::repository::RepoContext;
use crate::git::runner::CommandRunner;
use crate::git::selection::normalize_hash;
use crate::prompt::{non_blank, MessagePrompt, MessageRequest};
use crate::utils::preflight;

/// Rewrites the message of the tip commit.
///
/// Older commits are rejected with [`HisteditError::ScopeLimit`]; only the tip
/// can be amended directly.
pub struct RenameEngine<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> RenameEngine<'a> {
    /// Creates an engine issuing commands through `runner`.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Renames `hash`, asking `prompt` for the new message.
    pub fn rename(
        &self,
        ctx: &RepoContext,
        hash: &str,
        prompt: &mut dyn MessagePrompt,
    ) -> Result<Outcome> {
        let wanted = normalize_hash(hash)?;
        let reader = HistoryReader::new(self.runner);

        let current = reader.read_message(ctx, &wanted)?;
        let request = MessageRequest {
            title: "Rename commit".to_string(),
            prompt: format!("New message for commit {}", short_hash(&wanted)),
            default: current,
        };
        let message = non_blank(prompt.request(&request)?).ok_or(HisteditError::UserAbandoned)?;

        let tip = reader.current_tip(ctx);
        if tip == UNRESOLVED_TIP {
            return Err(HisteditError::Resolution {
                path: ctx.workdir().display().to_string(),
                reason: "cannot resolve the current tip".to_string(),
            });
        }
        if !tip.starts_with(&wanted) {
            return Err(HisteditError::ScopeLimit(short_hash(&wanted).to_string()));
        }

        preflight::check_no_operation_in_progress(ctx)?;
        preflight::check_nothing_staged(ctx)?;

        let mut message_file = tempfile::NamedTempFile::new()?;
        message_file.write_all(message.as_bytes())?;
        message_file.flush()?;
        let message_path = message_file.path().to_string_lossy().into_owned();

        self.runner.run(
            ctx.workdir(),
            &[
                "commit",
                "--amend",
                "--allow-empty",
                "--cleanup=whitespace",
                "--file",
                &message_path,
            ],
        )?;

        let new_tip = reader.current_tip(ctx);
        info!(old = %short_hash(&tip), new = %short_hash(&new_tip), "Renamed tip commit");

        Ok(Outcome {
            summary: format!(
                "Renamed commit {} -> {}",
                short_hash(&tip),
                short_hash(&new_tip)
            ),
            warnings: vec![FORCE_PUSH_WARNING.to_string()],
            new_tip,
            strategy: None,
        })
    }
}
