//! Shared test utilities for the `git` module.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;

use crate::error::CommandError;
use crate::git::repository::RepoContext;
use crate::git::runner::{CommandOutput, CommandRunner};

/// A command as received by [`ScriptedRunner`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedCommand {
    pub(crate) workdir: PathBuf,
    pub(crate) args: Vec<String>,
    pub(crate) env: Vec<(String, String)>,
}

impl RecordedCommand {
    /// Arguments joined by single spaces.
    pub(crate) fn line(&self) -> String {
        self.args.join(" ")
    }

    /// Value of an environment variable passed with the command.
    pub(crate) fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// One programmed reply.
pub(crate) type Scripted =
    Box<dyn FnOnce(&RecordedCommand) -> Result<CommandOutput, CommandError> + Send>;

/// Replies with `stdout`.
pub(crate) fn ok(stdout: &str) -> Scripted {
    let stdout = stdout.to_string();
    Box::new(move |_| {
        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
        })
    })
}

/// Fails with exit status 1 and `stderr`.
pub(crate) fn fail(stderr: &str) -> Scripted {
    let stderr = stderr.to_string();
    Box::new(move |cmd| {
        Err(CommandError {
            command: format!("git {}", cmd.line()),
            status: Some(1),
            stderr,
        })
    })
}

/// Replies by running `f`, for responses that inspect the command or touch disk.
pub(crate) fn respond<F>(f: F) -> Scripted
where
    F: FnOnce(&RecordedCommand) -> Result<CommandOutput, CommandError> + Send + 'static,
{
    Box::new(f)
}

/// Mock runner with a pre-programmed queue of replies.
///
/// Replies are consumed in FIFO order. When the queue is exhausted further
/// commands fail with "no more scripted responses". Every command is recorded
/// so tests can assert on exactly what was issued.
pub(crate) struct ScriptedRunner {
    responses: Mutex<VecDeque<Scripted>>,
    recorded: Mutex<Vec<RecordedCommand>>,
}

impl ScriptedRunner {
    pub(crate) fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Every command issued so far.
    pub(crate) fn recorded(&self) -> Vec<RecordedCommand> {
        self.recorded.lock().unwrap().clone()
    }

    /// Issued commands as space-joined argument lines.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.recorded().iter().map(RecordedCommand::line).collect()
    }

    /// Number of replies not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run_with_env(
        &self,
        workdir: &Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput, CommandError> {
        let cmd = RecordedCommand {
            workdir: workdir.to_path_buf(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            env: env
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        };
        self.recorded.lock().unwrap().push(cmd.clone());

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply(&cmd),
            None => Err(CommandError {
                command: format!("git {}", cmd.line()),
                status: None,
                stderr: "no more scripted responses".to_string(),
            }),
        }
    }
}

/// A 40-character hash made of `c`.
pub(crate) fn hash(c: char) -> String {
    c.to_string().repeat(crate::git::FULL_HASH_LEN)
}

/// `git log` output for `(hash char, decoration, subject)` rows, newest first.
pub(crate) fn log_output(rows: &[(char, &str, &str)]) -> String {
    rows.iter()
        .map(|(c, refs, subject)| {
            let decoration = if refs.is_empty() {
                String::new()
            } else {
                format!(" ({refs})")
            };
            format!(
                "{}\t{decoration}\tTest User\t2 days ago\t2024-05-01T10:00:00+00:00\t{subject}",
                hash(*c)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes `name` into the work tree of `ctx` and adds it to the index.
pub(crate) fn stage_file(ctx: &RepoContext, name: &str) {
    std::fs::write(ctx.workdir().join(name), "staged\n").unwrap();
    let repo = ctx.open().unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
}

/// An empty repository in a temporary directory.
pub(crate) fn init_repo() -> (TempDir, RepoContext) {
    let dir = tempfile::tempdir().unwrap();
    git2::Repository::init(dir.path()).unwrap();
    let ctx = RepoContext::from_workdir(dir.path());
    (dir, ctx)
}
