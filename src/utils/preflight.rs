//! Preflight validation checks for early failure detection
//!
//! These run after a rewrite has been validated and before the first command
//! that changes the repository, so a rejected rewrite leaves no trace.

use tracing::debug;

use crate::error::{HisteditError, ValidationError};
use crate::git::RepoContext;

/// Validate no merge, rebase, cherry-pick or similar is under way
pub fn check_no_operation_in_progress(ctx: &RepoContext) -> Result<(), HisteditError> {
    if let Some(operation) = ctx.operation_in_progress()? {
        return Err(ValidationError::OperationInProgress(operation.to_string()).into());
    }
    Ok(())
}

/// Validate the index holds no staged changes
///
/// `commit --amend` and `reset --soft` followed by `commit` both record the
/// index, so anything staged would silently end up in the rewritten commit.
pub fn check_nothing_staged(ctx: &RepoContext) -> Result<(), HisteditError> {
    let status = ctx.working_directory_status()?;
    if !status.staged.is_empty() {
        for change in &status.staged {
            debug!(status = %change.status, file = %change.file, "Staged change blocks rewrite");
        }
        return Err(ValidationError::StagedChanges.into());
    }
    Ok(())
}

/// Validate working directory is clean (no uncommitted changes to tracked files)
///
/// Untracked files are allowed; git rebases around them.
pub fn check_working_directory_clean(ctx: &RepoContext) -> Result<(), HisteditError> {
    let status = ctx.working_directory_status()?;
    if !status.is_clean() {
        for change in status.staged.iter().chain(&status.unstaged) {
            debug!(status = %change.status, file = %change.file, "Uncommitted change blocks rebase");
        }
        return Err(ValidationError::DirtyWorkingTree.into());
    }
    Ok(())
}
