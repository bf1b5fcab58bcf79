//! Read-only queries against repository history.

use tracing::warn;

use crate::error::CommandError;
use crate::git::commit::{CommitHistory, LOG_FORMAT};
use crate::git::repository::RepoContext;
use crate::git::runner::CommandRunner;

/// Sentinel returned by [`HistoryReader::current_tip`] when the tip cannot be resolved.
pub const UNRESOLVED_TIP: &str = "HEAD";

/// Default number of commits listed.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Reads history through a [`CommandRunner`].
pub struct HistoryReader<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> HistoryReader<'a> {
    /// Creates a reader issuing commands through `runner`.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Lists up to `limit` most recent commits, newest first.
    ///
    /// Fails soft: any error yields an empty history, which callers must treat
    /// as "unavailable".
    pub fn list_commits(&self, ctx: &RepoContext, limit: usize) -> CommitHistory {
        let limit_arg = limit.to_string();
        match self
            .runner
            .run(ctx.workdir(), &["log", LOG_FORMAT, "-n", &limit_arg])
        {
            Ok(output) => CommitHistory::parse(&output.stdout),
            Err(e) => {
                warn!(error = %e, "Could not list commits");
                CommitHistory::default()
            }
        }
    }

    /// Full hash of the current tip, or [`UNRESOLVED_TIP`].
    pub fn current_tip(&self, ctx: &RepoContext) -> String {
        self.resolve_soft(ctx, &["rev-parse", "HEAD"])
    }

    /// Abbreviated name of the checked-out branch, or [`UNRESOLVED_TIP`] when detached.
    pub fn current_branch(&self, ctx: &RepoContext) -> String {
        self.resolve_soft(ctx, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Full message of `hash`, trimmed.
    pub fn read_message(&self, ctx: &RepoContext, hash: &str) -> Result<String, CommandError> {
        let output = self
            .runner
            .run(ctx.workdir(), &["log", "-n", "1", "--pretty=format:%B", hash])?;
        Ok(output.stdout.trim().to_string())
    }

    /// Full hash of the first parent of `hash`.
    pub fn parent_of(&self, ctx: &RepoContext, hash: &str) -> Result<String, CommandError> {
        let rev = format!("{hash}^");
        let output = self
            .runner
            .run(ctx.workdir(), &["rev-parse", "--verify", "--quiet", &rev])
            .map_err(|mut e| {
                // --quiet leaves stderr empty when the commit has no parent
                if e.stderr.trim().is_empty() {
                    e.stderr = format!("{hash} has no parent commit");
                }
                e
            })?;
        Ok(output.stdout.trim().to_string())
    }

    fn resolve_soft(&self, ctx: &RepoContext, args: &[&str]) -> String {
        match self.runner.run(ctx.workdir(), args) {
            Ok(output) if !output.stdout.trim().is_empty() => output.stdout.trim().to_string(),
            Ok(_) => UNRESOLVED_TIP.to_string(),
            Err(e) => {
                warn!(error = %e, "Could not resolve HEAD");
                UNRESOLVED_TIP.to_string()
            }
        }
    }
}
