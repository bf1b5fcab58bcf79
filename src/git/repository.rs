//! Explicit repository context and working-tree status.

use std::path::{Path, PathBuf};

use git2::{Repository, RepositoryState, Status, StatusOptions};

use crate::error::HisteditError;

/// The repository every engine call operates on.
///
/// Passed explicitly into each operation instead of being read from ambient
/// process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    workdir: PathBuf,
}

/// Working directory status
#[derive(Debug, Default)]
pub struct WorkingDirectoryStatus {
    /// Files with changes in the index.
    pub staged: Vec<FileStatus>,
    /// Tracked files modified in the working tree but not staged.
    pub unstaged: Vec<FileStatus>,
}

impl WorkingDirectoryStatus {
    /// Whether neither the index nor tracked files have changes.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }
}

/// File status information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Git status flags (e.g., "AM", "M ", " D")
    pub status: String,
    /// Path to the file relative to repository root
    pub file: String,
}

impl RepoContext {
    /// Finds the repository containing `path` and uses its working directory.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self, HisteditError> {
        let path = path.as_ref();
        let resolution_error = |reason: String| HisteditError::Resolution {
            path: path.display().to_string(),
            reason,
        };

        let repo = Repository::discover(path).map_err(|e| resolution_error(e.message().to_string()))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| resolution_error("bare repositories have no working directory".to_string()))?;

        Ok(Self {
            workdir: workdir.to_path_buf(),
        })
    }

    /// Uses `workdir` as-is, without checking that it is a repository.
    pub fn from_workdir(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Directory every command runs in.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Opens the repository with libgit2 for read-only inspection.
    pub fn open(&self) -> Result<Repository, HisteditError> {
        Repository::open(&self.workdir).map_err(|e| HisteditError::Resolution {
            path: self.workdir.display().to_string(),
            reason: e.message().to_string(),
        })
    }

    /// Staged and unstaged changes to tracked files. Untracked files are ignored.
    pub fn working_directory_status(&self) -> Result<WorkingDirectoryStatus, HisteditError> {
        let repo = self.open()?;
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = repo
            .statuses(Some(&mut options))
            .map_err(|e| HisteditError::Resolution {
                path: self.workdir.display().to_string(),
                reason: format!("failed to read status: {}", e.message()),
            })?;

        let mut result = WorkingDirectoryStatus::default();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else { continue };
            let flags = entry.status();
            let file_status = FileStatus {
                status: format_status_flags(flags),
                file: path.to_string(),
            };
            if flags.intersects(INDEX_CHANGES) {
                result.staged.push(file_status.clone());
            }
            if flags.intersects(WORKTREE_CHANGES) {
                result.unstaged.push(file_status);
            }
        }

        Ok(result)
    }

    /// Name of the multi-step operation in progress, if any.
    pub fn operation_in_progress(&self) -> Result<Option<&'static str>, HisteditError> {
        let state = self.open()?.state();
        Ok(describe_state(state))
    }
}

const INDEX_CHANGES: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

const WORKTREE_CHANGES: Status = Status::WT_MODIFIED
    .union(Status::WT_DELETED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE);

fn describe_state(state: RepositoryState) -> Option<&'static str> {
    match state {
        RepositoryState::Clean => None,
        RepositoryState::Merge => Some("merge"),
        RepositoryState::Revert | RepositoryState::RevertSequence => Some("revert"),
        RepositoryState::CherryPick | RepositoryState::CherryPickSequence => Some("cherry-pick"),
        RepositoryState::Bisect => Some("bisect"),
        RepositoryState::Rebase
        | RepositoryState::RebaseInteractive
        | RepositoryState::RebaseMerge => Some("rebase"),
        RepositoryState::ApplyMailbox | RepositoryState::ApplyMailboxOrRebase => Some("am"),
    }
}

/// Format git status flags into string representation
fn format_status_flags(flags: Status) -> String {
    let mut status = String::new();

    if flags.contains(Status::INDEX_NEW) {
        status.push('A');
    } else if flags.contains(Status::INDEX_MODIFIED) {
        status.push('M');
    } else if flags.contains(Status::INDEX_DELETED) {
        status.push('D');
    } else if flags.contains(Status::INDEX_RENAMED) {
        status.push('R');
    } else if flags.contains(Status::INDEX_TYPECHANGE) {
        status.push('T');
    } else {
        status.push(' ');
    }

    if flags.contains(Status::WT_MODIFIED) {
        status.push('M');
    } else if flags.contains(Status::WT_DELETED) {
        status.push('D');
    } else if flags.contains(Status::WT_TYPECHANGE) {
        status.push('T');
    } else if flags.contains(Status::WT_RENAMED) {
        status.push('R');
    } else {
        status.push(' ');
    }

    status
}
