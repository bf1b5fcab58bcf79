//! Entry point tying history reads and rewrites to one repository.
//!
//! Callers send a [`Request`] and get a [`Response`]; successful rewrites
//! also publish [`EngineEvent::HistoryChanged`] to every subscriber so views
//! can refresh without the engine knowing about them.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::Result;
use crate::git::{
    CommandRunner, CommitHistory, GitCli, HistoryReader, RenameEngine, RepoContext,
    RewriteStrategy, SquashEngine,
};
use crate::prompt::MessagePrompt;
use crate::utils::Settings;

/// Appended to every successful rewrite.
pub const FORCE_PUSH_WARNING: &str = "History was rewritten: it now diverges from any remote or shared copy of this branch, and publishing it requires a force push";

const EVENT_CAPACITY: usize = 16;

/// Result of a successful rewrite, as text for the caller to present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// One-line description of what changed.
    pub summary: String,
    /// Warnings to show alongside the summary.
    pub warnings: Vec<String>,
    /// Tip after the rewrite.
    pub new_tip: String,
    /// How a squash was carried out; `None` for renames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<RewriteStrategy>,
}

/// Something the caller wants done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// List recent commits.
    ListHistory {
        /// Commits to list; `None` uses the configured limit.
        limit: Option<usize>,
    },
    /// Rename the tip commit.
    Rename {
        /// Hash or unique prefix of the tip.
        hash: String,
    },
    /// Squash a contiguous run.
    Squash {
        /// Hashes or unique prefixes, in any order.
        hashes: Vec<String>,
    },
}

/// Reply to a [`Request`].
#[derive(Debug, Clone)]
pub enum Response {
    /// Commits, newest first.
    History(CommitHistory),
    /// A rename or squash succeeded.
    Rewritten(Outcome),
}

/// Published after history changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Commits were rewritten; previously read history is stale.
    HistoryChanged {
        /// Tip after the rewrite.
        new_tip: String,
    },
}

/// History operations bound to one repository.
pub struct Engine {
    ctx: RepoContext,
    runner: Arc<dyn CommandRunner>,
    settings: Settings,
    events: broadcast::Sender<EngineEvent>,
}

impl Engine {
    /// Creates an engine over an already resolved repository.
    pub fn new(ctx: RepoContext, runner: Arc<dyn CommandRunner>, settings: Settings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            ctx,
            runner,
            settings,
            events,
        }
    }

    /// Discovers the repository containing `path` and drives it with the configured git.
    pub fn open(path: &Path, settings: Settings) -> Result<Self> {
        let ctx = RepoContext::discover(path)?;
        let runner = Arc::new(GitCli::with_program(settings.git_program.clone()));
        Ok(Self::new(ctx, runner, settings))
    }

    /// The repository this engine works on.
    pub fn context(&self) -> &RepoContext {
        &self.ctx
    }

    /// Effective settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Receives an event after each successful rewrite.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Recent commits, newest first; empty when history is unavailable.
    pub fn history(&self, limit: Option<usize>) -> CommitHistory {
        let limit = limit.unwrap_or(self.settings.history_limit);
        HistoryReader::new(&*self.runner).list_commits(&self.ctx, limit)
    }

    /// Checked-out branch, or `HEAD` when detached.
    pub fn current_branch(&self) -> String {
        HistoryReader::new(&*self.runner).current_branch(&self.ctx)
    }

    /// Renames the tip commit.
    pub fn rename(&self, hash: &str, prompt: &mut dyn MessagePrompt) -> Result<Outcome> {
        let outcome = RenameEngine::new(&*self.runner).rename(&self.ctx, hash, prompt)?;
        self.publish(&outcome);
        Ok(outcome)
    }

    /// Squashes a contiguous run.
    pub fn squash<S: AsRef<str>>(
        &self,
        hashes: &[S],
        prompt: &mut dyn MessagePrompt,
    ) -> Result<Outcome> {
        let outcome = SquashEngine::new(&*self.runner)
            .with_scan_limit(self.settings.scan_limit)
            .with_policy(self.settings.on_rebase_failure)
            .squash(&self.ctx, hashes, prompt)?;
        self.publish(&outcome);
        Ok(outcome)
    }

    /// Dispatches `request`.
    pub fn handle(&self, request: Request, prompt: &mut dyn MessagePrompt) -> Result<Response> {
        debug!(?request, "Handling request");
        match request {
            Request::ListHistory { limit } => Ok(Response::History(self.history(limit))),
            Request::Rename { hash } => self.rename(&hash, prompt).map(Response::Rewritten),
            Request::Squash { hashes } => self.squash(&hashes, prompt).map(Response::Rewritten),
        }
    }

    fn publish(&self, outcome: &Outcome) {
        // No subscribers is fine.
        let _ = self.events.send(EngineEvent::HistoryChanged {
            new_tip: outcome.new_tip.clone(),
        });
    }
}
