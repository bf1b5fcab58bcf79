//! Git operations and repository management.

pub mod commit;
pub mod history;
pub mod rebase;
pub mod rename;
pub mod repository;
pub mod runner;
pub mod selection;
pub mod squash;

#[cfg(test)]
pub(crate) mod test_utils;

pub use commit::{Commit, CommitHistory};
pub use history::{HistoryReader, DEFAULT_HISTORY_LIMIT, UNRESOLVED_TIP};
pub use rebase::RebaseFailurePolicy;
pub use rename::RenameEngine;
pub use repository::{RepoContext, WorkingDirectoryStatus};
pub use runner::{CommandOutput, CommandRunner, GitCli};
pub use selection::{validate_selection, ContiguousRun};
pub use squash::{aggregate_message, RewritePlan, RewriteStrategy, SquashEngine, SquashPhase};

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;

/// Length of a full SHA-1 commit hash in hex characters.
pub const FULL_HASH_LEN: usize = 40;
