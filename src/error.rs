//! Error types for history rewriting.

use std::fmt;

use thiserror::Error;

/// Result type used by the rewrite engines.
pub type Result<T, E = HisteditError> = std::result::Result<T, E>;

/// A git command that exited unsuccessfully or could not be spawned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{command}` {}: {}", status_label(.status), .stderr.trim())]
pub struct CommandError {
    /// The command line as issued, for diagnostics.
    pub command: String,
    /// Exit code, or `None` when the process was killed or never started.
    pub status: Option<i32>,
    /// Raw stderr text from the tool.
    pub stderr: String,
}

fn status_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exited with status {code}"),
        None => "did not complete".to_string(),
    }
}

/// Rejections raised before any mutating command runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Fewer commits were selected than the operation needs.
    #[error("Select at least {required} commits to squash (got {count})")]
    InsufficientSelection {
        /// Distinct commits selected.
        count: usize,
        /// Minimum accepted.
        required: usize,
    },

    /// The selected commits do not form a single run in history.
    #[error("Selected commits are not consecutive: gap between {after} and {before}")]
    NonConsecutive {
        /// Short hash of the newer commit at the gap.
        after: String,
        /// Short hash of the older commit at the gap.
        before: String,
    },

    /// A selected hash no longer appears in the history snapshot.
    #[error("Commit {0} is not in the current history; the selection is stale")]
    StaleSelection(String),

    /// A hash prefix matched more than one commit.
    #[error("Commit prefix {0} is ambiguous")]
    AmbiguousHash(String),

    /// The input is not a hexadecimal commit identifier.
    #[error("'{0}' is not a commit hash")]
    InvalidHash(String),

    /// The history changed between the snapshot and the rewrite.
    #[error("History changed since it was read (tip is now {tip}); refresh and retry")]
    StaleHistory {
        /// Short hash of the tip found just before rewriting.
        tip: String,
    },

    /// A merge commit sits between the run and the tip.
    #[error("Commit {0} is a merge; rewriting across merges is not supported")]
    MergeInRange(String),

    /// Staged changes would be folded into the rewritten commit.
    #[error("The index has staged changes; commit or unstage them before rewriting history")]
    StagedChanges,

    /// Tracked files have uncommitted modifications.
    #[error("Working directory is not clean; commit or stash changes before squashing buried commits")]
    DirtyWorkingTree,

    /// Another git operation is already under way.
    #[error("A {0} is already in progress in this repository")]
    OperationInProgress(String),
}

/// What happened to a scripted rebase after it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseRecovery {
    /// `git rebase --abort` restored the branch.
    Aborted,
    /// The abort was attempted and failed too.
    AbortFailed(String),
    /// The rebase was left in progress, as configured.
    LeftInProgress,
    /// Git never entered a rebase state, so nothing needed undoing.
    NotStarted,
}

impl fmt::Display for RebaseRecovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => write!(f, "the rebase was aborted and the branch restored"),
            Self::AbortFailed(stderr) => write!(
                f,
                "`git rebase --abort` also failed ({}); the repository is left mid-rebase",
                stderr.trim()
            ),
            Self::LeftInProgress => write!(
                f,
                "the repository was left mid-rebase; resolve with `git rebase --continue` or `git rebase --abort`"
            ),
            Self::NotStarted => write!(f, "no rebase was started"),
        }
    }
}

/// Errors surfaced by the rename and squash engines.
#[derive(Error, Debug)]
pub enum HisteditError {
    /// The repository or its working directory could not be resolved.
    #[error("Cannot resolve repository at {path}: {reason}")]
    Resolution {
        /// The path that was probed.
        path: String,
        /// Why resolution failed.
        reason: String,
    },

    /// The request was rejected before touching the repository.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The message prompt was cancelled or left empty.
    #[error("Empty commit message, operation cancelled")]
    UserAbandoned,

    /// Only the tip commit can be renamed directly.
    #[error(
        "Commit {0} is not the tip: rewriting non-tip commits requires interactive rebase, unsupported in this path"
    )]
    ScopeLimit(String),

    /// A git command failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The commit after `reset --soft` failed, leaving the branch moved back.
    #[error("{source}; the branch now points at {parent}, restore it with `git reset --soft {original_tip}`")]
    CommitAfterReset {
        /// The failed commit command.
        source: CommandError,
        /// Where the branch was reset to.
        parent: String,
        /// The tip before the reset.
        original_tip: String,
    },

    /// The scripted rebase failed.
    #[error("Squash via rebase failed: {source}; {recovery}")]
    RebaseFailed {
        /// The failed rebase command.
        source: CommandError,
        /// What was done about the interrupted rebase.
        recovery: RebaseRecovery,
    },

    /// Reading or writing a scratch file, or prompting, failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HisteditError {
    /// Whether the error is a cancellation rather than a failure.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::UserAbandoned)
    }
}
