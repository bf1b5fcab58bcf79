//! Squashing a contiguous run of commits.
//!
//! A run that includes the tip collapses with `reset --soft` plus a single
//! commit. A buried run goes through a scripted rebase that folds the run
//! into its oldest commit and replays everything above it unchanged.

use std::fmt;
use std::io::Write;

use tracing::{debug, info};

use crate::engine::{Outcome, FORCE_PUSH_WARNING};
use crate::error::{HisteditError, Result, ValidationError};
use crate::git::commit::{short_hash, Commit};
use crate::git::history::HistoryReader;
use crate::git::rebase::{self, RebaseFailurePolicy, ScriptedRebase};
use crate::git::repository::RepoContext;
use crate::git::runner::CommandRunner;
use crate::git::selection::{normalize_hash, validate_selection};
use crate::prompt::{non_blank, MessagePrompt, MessageRequest};
use crate::utils::preflight;
use crate::utils::settings::DEFAULT_SCAN_LIMIT;

/// Fewest commits a squash accepts.
pub const MIN_SQUASH: usize = 2;

/// How a plan rewrites history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteStrategy {
    /// `reset --soft` to the parent, then one new commit.
    TipReset,
    /// Interactive rebase with a generated todo list.
    ScriptedRebase,
}

impl fmt::Display for RewriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TipReset => write!(f, "tip reset"),
            Self::ScriptedRebase => write!(f, "scripted rebase"),
        }
    }
}

/// A validated squash, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    /// The run, newest first.
    pub commits: Vec<Commit>,
    /// First parent of the oldest commit in the run.
    pub parent: String,
    /// Tip of the history snapshot the plan was built from.
    pub tip: String,
}

impl RewritePlan {
    /// Newest commit of the run.
    pub fn newest(&self) -> &Commit {
        &self.commits[0]
    }

    /// Oldest commit of the run.
    pub fn oldest(&self) -> &Commit {
        &self.commits[self.commits.len() - 1]
    }

    /// Whether the run contains the tip.
    pub fn includes_tip(&self) -> bool {
        self.commits.iter().any(|c| c.hash == self.tip)
    }

    /// Strategy implied by the run's position.
    pub fn strategy(&self) -> RewriteStrategy {
        if self.includes_tip() {
            RewriteStrategy::TipReset
        } else {
            RewriteStrategy::ScriptedRebase
        }
    }

    /// Message offered to the user before squashing.
    pub fn default_message(&self) -> String {
        aggregate_message(&self.commits)
    }
}

/// One `- subject` line per commit, oldest first.
///
/// `commits` is expected newest first, as history lists them.
pub fn aggregate_message(commits: &[Commit]) -> String {
    commits
        .iter()
        .rev()
        .map(|c| format!("- {}", c.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Where a squash invocation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquashPhase {
    /// Nothing done yet.
    Idle,
    /// Reading history and checking the selection.
    Validating,
    /// The selection or repository state was refused.
    Rejected,
    /// A plan exists; nothing has changed yet.
    PlanBuilt,
    /// Waiting for the message.
    MessageEditing,
    /// The message was cancelled.
    Aborted,
    /// Mutating commands are running.
    CommandsIssued,
    /// History was rewritten.
    Succeeded,
    /// A mutating command failed.
    Failed,
}

impl SquashPhase {
    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Aborted | Self::Succeeded | Self::Failed
        )
    }
}

struct PhaseTracker {
    phase: SquashPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: SquashPhase::Idle,
        }
    }

    fn advance(&mut self, next: SquashPhase) {
        debug!(from = ?self.phase, to = ?next, "Squash phase");
        self.phase = next;
    }

    /// Moves to the terminal phase matching `result`.
    fn finish<T>(&mut self, result: Result<T>, on_error: SquashPhase) -> Result<T> {
        match &result {
            Ok(_) => self.advance(SquashPhase::Succeeded),
            Err(HisteditError::UserAbandoned) => self.advance(SquashPhase::Aborted),
            Err(_) => self.advance(on_error),
        }
        result
    }

    fn finish_rejected<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.advance(SquashPhase::Rejected);
        }
        result
    }
}

/// Squashes contiguous runs of commits.
pub struct SquashEngine<'a> {
    runner: &'a dyn CommandRunner,
    scan_limit: usize,
    policy: RebaseFailurePolicy,
}

impl<'a> SquashEngine<'a> {
    /// Creates an engine with the default scan limit and failure policy.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            scan_limit: DEFAULT_SCAN_LIMIT,
            policy: RebaseFailurePolicy::default(),
        }
    }

    /// Sets how many commits are read to validate a selection.
    pub fn with_scan_limit(mut self, scan_limit: usize) -> Self {
        self.scan_limit = scan_limit;
        self
    }

    /// Sets what happens to a failed scripted rebase.
    pub fn with_policy(mut self, policy: RebaseFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validates `hashes` and builds the plan without changing anything.
    pub fn plan<S: AsRef<str>>(&self, ctx: &RepoContext, hashes: &[S]) -> Result<RewritePlan> {
        let mut wanted = Vec::with_capacity(hashes.len());
        for raw in hashes {
            let hash = normalize_hash(raw.as_ref())?;
            if !wanted.contains(&hash) {
                wanted.push(hash);
            }
        }
        if wanted.len() < MIN_SQUASH {
            return Err(ValidationError::InsufficientSelection {
                count: wanted.len(),
                required: MIN_SQUASH,
            }
            .into());
        }

        let reader = HistoryReader::new(self.runner);
        let history = reader.list_commits(ctx, self.scan_limit);
        let tip = match history.tip() {
            Some(tip) => tip.hash.clone(),
            None => {
                return Err(HisteditError::Resolution {
                    path: ctx.workdir().display().to_string(),
                    reason: "commit history is unavailable".to_string(),
                })
            }
        };

        let run = validate_selection(&history, &wanted)?;
        // Distinct prefixes can still name the same commit.
        if run.len() < MIN_SQUASH {
            return Err(ValidationError::InsufficientSelection {
                count: run.len(),
                required: MIN_SQUASH,
            }
            .into());
        }

        let parent = reader.parent_of(ctx, &run.oldest().hash)?;
        debug!(
            newest = %run.newest().short_hash(),
            oldest = %run.oldest().short_hash(),
            parent = %short_hash(&parent),
            "Built squash plan"
        );

        Ok(RewritePlan {
            commits: run.commits().to_vec(),
            parent,
            tip,
        })
    }

    /// Squashes `hashes` into one commit whose message comes from `prompt`.
    pub fn squash<S: AsRef<str>>(
        &self,
        ctx: &RepoContext,
        hashes: &[S],
        prompt: &mut dyn MessagePrompt,
    ) -> Result<Outcome> {
        let mut tracker = PhaseTracker::new();

        tracker.advance(SquashPhase::Validating);
        let prepared = self.prepare(ctx, hashes);
        let (plan, todo) = tracker.finish_rejected(prepared)?;
        tracker.advance(SquashPhase::PlanBuilt);

        tracker.advance(SquashPhase::MessageEditing);
        let edited = self.edit_message(ctx, &plan, prompt);
        let message = match edited {
            Ok(message) => message,
            Err(e) => return tracker.finish(Err(e), SquashPhase::Rejected),
        };

        tracker.advance(SquashPhase::CommandsIssued);
        let executed = self.execute(ctx, &plan, todo.as_deref(), &message);
        tracker.finish(executed, SquashPhase::Failed)
    }

    fn prepare<S: AsRef<str>>(
        &self,
        ctx: &RepoContext,
        hashes: &[S],
    ) -> Result<(RewritePlan, Option<String>)> {
        let plan = self.plan(ctx, hashes)?;
        self.ensure_tip_unchanged(ctx, &plan)?;

        // Merges and a changed range are rejected before asking for a message.
        let range = rebase::list_range(self.runner, ctx, &plan.parent)?;
        let todo = match plan.strategy() {
            RewriteStrategy::TipReset => {
                rebase::check_tip_range(&range, &plan.commits)?;
                None
            }
            RewriteStrategy::ScriptedRebase => {
                let entries = rebase::build_todo(&range, &plan.commits)?;
                Some(rebase::render_todo(&entries))
            }
        };
        Ok((plan, todo))
    }

    fn edit_message(
        &self,
        ctx: &RepoContext,
        plan: &RewritePlan,
        prompt: &mut dyn MessagePrompt,
    ) -> Result<String> {
        let request = MessageRequest {
            title: format!("Squash {} commits", plan.commits.len()),
            prompt: format!(
                "Message for the squash of {}..{}",
                plan.oldest().short_hash(),
                plan.newest().short_hash()
            ),
            default: plan.default_message(),
        };
        let message = non_blank(prompt.request(&request)?).ok_or(HisteditError::UserAbandoned)?;

        // The prompt may have been open for a while.
        self.ensure_tip_unchanged(ctx, plan)?;

        preflight::check_no_operation_in_progress(ctx)?;
        match plan.strategy() {
            RewriteStrategy::TipReset => preflight::check_nothing_staged(ctx)?,
            RewriteStrategy::ScriptedRebase => preflight::check_working_directory_clean(ctx)?,
        }
        Ok(message)
    }

    fn ensure_tip_unchanged(&self, ctx: &RepoContext, plan: &RewritePlan) -> Result<()> {
        let tip = HistoryReader::new(self.runner).current_tip(ctx);
        if tip != plan.tip {
            return Err(ValidationError::StaleHistory {
                tip: short_hash(&tip).to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &RepoContext,
        plan: &RewritePlan,
        todo: Option<&str>,
        message: &str,
    ) -> Result<Outcome> {
        let strategy = plan.strategy();
        match todo {
            None => self.reset_and_commit(ctx, plan, message)?,
            Some(todo) => {
                ScriptedRebase::new(self.runner, self.policy).run(ctx, &plan.parent, todo, message)?
            }
        }

        let new_tip = HistoryReader::new(self.runner).current_tip(ctx);
        info!(
            count = plan.commits.len(),
            strategy = %strategy,
            tip = %short_hash(&new_tip),
            "Squashed commits"
        );

        Ok(Outcome {
            summary: format!(
                "Squashed {} commits ({}..{}) via {strategy}; tip is now {}",
                plan.commits.len(),
                plan.oldest().short_hash(),
                plan.newest().short_hash(),
                short_hash(&new_tip)
            ),
            warnings: vec![FORCE_PUSH_WARNING.to_string()],
            new_tip,
            strategy: Some(strategy),
        })
    }

    fn reset_and_commit(&self, ctx: &RepoContext, plan: &RewritePlan, message: &str) -> Result<()> {
        let mut message_file = tempfile::NamedTempFile::new()?;
        message_file.write_all(message.as_bytes())?;
        message_file.flush()?;
        let message_path = message_file.path().to_string_lossy().into_owned();

        self.runner
            .run(ctx.workdir(), &["reset", "--soft", &plan.parent])?;

        self.runner
            .run(
                ctx.workdir(),
                &[
                    "commit",
                    "--allow-empty",
                    "--cleanup=whitespace",
                    "--file",
                    &message_path,
                ],
            )
            .map_err(|source| HisteditError::CommitAfterReset {
                source,
                parent: short_hash(&plan.parent).to_string(),
                original_tip: plan.tip.clone(),
            })?;
        Ok(())
    }
}
