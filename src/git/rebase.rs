//! Non-interactive `git rebase -i` driven by generated scripts.
//!
//! The todo list is generated up front and handed to git through
//! `GIT_SEQUENCE_EDITOR`; the message for the folded commit goes through
//! `GIT_EDITOR`. Both "editors" just copy a prepared file over the one git
//! asks them to edit, so the rebase never waits on a human.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CommandError, HisteditError, RebaseRecovery, ValidationError};
use crate::git::commit::{short_hash, Commit};
use crate::git::repository::RepoContext;
use crate::git::runner::CommandRunner;

/// What to do when a scripted rebase fails part way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebaseFailurePolicy {
    /// Run `git rebase --abort` to restore the original branch.
    #[default]
    Abort,
    /// Leave the repository mid-rebase for the user to resolve.
    Leave,
}

impl FromStr for RebaseFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "leave" => Ok(Self::Leave),
            other => Err(format!(
                "unknown rebase failure policy '{other}' (expected 'abort' or 'leave')"
            )),
        }
    }
}

/// Todo-list verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoAction {
    /// Keep the commit as is.
    Pick,
    /// Fold the commit into the one before it.
    Squash,
}

impl fmt::Display for TodoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pick => write!(f, "pick"),
            Self::Squash => write!(f, "squash"),
        }
    }
}

/// One line of the rebase todo list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoEntry {
    /// What git should do with the commit.
    pub action: TodoAction,
    /// Full hash.
    pub hash: String,
    /// Subject, for readability of the todo file only.
    pub subject: String,
}

/// A commit between the rebase base and the tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeCommit {
    /// Full hash.
    pub hash: String,
    /// Number of parents.
    pub parent_count: usize,
    /// Subject line.
    pub subject: String,
}

/// Lists `base..HEAD`, oldest first.
pub fn list_range(
    runner: &dyn CommandRunner,
    ctx: &RepoContext,
    base: &str,
) -> Result<Vec<RangeCommit>, CommandError> {
    let range = format!("{base}..HEAD");
    let output = runner.run(
        ctx.workdir(),
        &["log", "--reverse", "--pretty=format:%H%x09%P%x09%s", &range],
    )?;

    Ok(output
        .stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut fields = line.splitn(3, '\t');
            let hash = fields.next()?.trim().to_string();
            let parent_count = fields.next()?.split_whitespace().count();
            let subject = fields.next().unwrap_or_default().trim().to_string();
            Some(RangeCommit {
                hash,
                parent_count,
                subject,
            })
        })
        .collect())
}

/// Fails unless `range` (oldest first) begins with `selected` (newest first)
/// and contains no merge.
///
/// `git log` lists commits by date, so a run that is contiguous in the listing
/// can still span two parent lines. `range` is what a rewrite from
/// `parent(oldest)` actually replaces.
pub fn check_range(range: &[RangeCommit], selected: &[Commit]) -> Result<(), ValidationError> {
    if let Some(merge) = range.iter().find(|c| c.parent_count > 1) {
        return Err(ValidationError::MergeInRange(
            short_hash(&merge.hash).to_string(),
        ));
    }

    for (offset, wanted) in selected.iter().rev().enumerate() {
        match range.get(offset) {
            Some(commit) if commit.hash == wanted.hash => {}
            _ => {
                return Err(ValidationError::StaleSelection(
                    short_hash(&wanted.hash).to_string(),
                ))
            }
        }
    }
    Ok(())
}

/// Like [`check_range`], for a run that ends at the tip: nothing may sit above it.
///
/// Resetting to `parent(oldest)` discards every commit in `range`, so any
/// commit beyond the selection would be lost.
pub fn check_tip_range(range: &[RangeCommit], selected: &[Commit]) -> Result<(), ValidationError> {
    check_range(range, selected)?;
    match range.last() {
        Some(tip) if range.len() > selected.len() => Err(ValidationError::StaleHistory {
            tip: short_hash(&tip.hash).to_string(),
        }),
        _ => Ok(()),
    }
}

/// Builds the todo list that folds `selected` (newest first) into its oldest commit.
///
/// `range` must be `parent(oldest)..HEAD`, oldest first, so the selection
/// occupies its first `selected.len()` entries. The oldest commit is picked,
/// the rest of the selection is squashed into it, and everything above is
/// picked unchanged.
pub fn build_todo(
    range: &[RangeCommit],
    selected: &[Commit],
) -> Result<Vec<TodoEntry>, ValidationError> {
    check_range(range, selected)?;

    Ok(range
        .iter()
        .enumerate()
        .map(|(i, commit)| TodoEntry {
            action: if i > 0 && i < selected.len() {
                TodoAction::Squash
            } else {
                TodoAction::Pick
            },
            hash: commit.hash.clone(),
            subject: commit.subject.clone(),
        })
        .collect())
}

/// Renders entries in git's todo-file syntax.
pub fn render_todo(entries: &[TodoEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{} {} {}\n", e.action, e.hash, e.subject))
        .collect()
}

/// Runs a rebase whose todo list and fold message are fixed in advance.
pub struct ScriptedRebase<'a> {
    runner: &'a dyn CommandRunner,
    policy: RebaseFailurePolicy,
}

impl<'a> ScriptedRebase<'a> {
    /// Creates a driver that handles failures according to `policy`.
    pub fn new(runner: &'a dyn CommandRunner, policy: RebaseFailurePolicy) -> Self {
        Self { runner, policy }
    }

    /// Rebases onto `base` using `todo`, giving the folded commit `message`.
    pub fn run(
        &self,
        ctx: &RepoContext,
        base: &str,
        todo: &str,
        message: &str,
    ) -> Result<(), HisteditError> {
        let scratch = tempfile::tempdir()?;
        let todo_path = scratch.path().join("git-rebase-todo");
        let message_path = scratch.path().join("SQUASH_MSG");
        fs::write(&todo_path, todo)?;
        fs::write(&message_path, message)?;

        let sequence_editor = copy_over_command(&todo_path);
        let message_editor = copy_over_command(&message_path);
        debug!(base = %base, todo = %todo.trim_end(), "Starting scripted rebase");

        let result = self.runner.run_with_env(
            ctx.workdir(),
            &["-c", "commit.cleanup=whitespace", "rebase", "-i", base],
            &[
                ("GIT_SEQUENCE_EDITOR", sequence_editor.as_str()),
                ("GIT_EDITOR", message_editor.as_str()),
            ],
        );

        match result {
            Ok(_) => {
                info!(base = %short_hash(base), "Scripted rebase completed");
                Ok(())
            }
            Err(source) => {
                let recovery = self.recover(ctx);
                warn!(recovery = %recovery, "Scripted rebase failed");
                Err(HisteditError::RebaseFailed { source, recovery })
            }
        }
    }

    fn recover(&self, ctx: &RepoContext) -> RebaseRecovery {
        // If the state cannot be read, assume the rebase is still there.
        let in_progress = ctx
            .operation_in_progress()
            .map_or(true, |op| op == Some("rebase"));

        if !in_progress {
            return RebaseRecovery::NotStarted;
        }

        match self.policy {
            RebaseFailurePolicy::Leave => RebaseRecovery::LeftInProgress,
            RebaseFailurePolicy::Abort => match self.runner.run(ctx.workdir(), &["rebase", "--abort"]) {
                Ok(_) => RebaseRecovery::Aborted,
                Err(e) => RebaseRecovery::AbortFailed(e.stderr),
            },
        }
    }
}

/// Shell command that overwrites the file git passes as its last argument.
///
/// Git runs editors through `sh -c '<editor> "$@"'`, so the prepared file
/// path needs shell quoting.
fn copy_over_command(source: &Path) -> String {
    let path = source.to_string_lossy();
    format!("cp '{}'", path.replace('\'', r"'\''"))
}
