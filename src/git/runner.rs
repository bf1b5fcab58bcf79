//! Execution of git commands against a working directory.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::CommandError;

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded. Git reports progress here even on success.
    pub stderr: String,
}

/// Runs version-control commands.
///
/// Implementations run each command to completion before returning and never
/// retry; a failed rewrite command repeated blindly can corrupt history.
pub trait CommandRunner: Send + Sync {
    /// Runs `args` in `workdir` with extra environment variables.
    fn run_with_env(
        &self,
        workdir: &Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput, CommandError>;

    /// Runs `args` in `workdir`.
    fn run(&self, workdir: &Path, args: &[&str]) -> Result<CommandOutput, CommandError> {
        self.run_with_env(workdir, args, &[])
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run_with_env(
        &self,
        workdir: &Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput, CommandError> {
        (**self).run_with_env(workdir, args, env)
    }
}

/// Runs the `git` executable as a child process.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Uses `git` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Uses a specific git executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the executable this runner invokes.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl CommandRunner for GitCli {
    fn run_with_env(
        &self,
        workdir: &Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput, CommandError> {
        let command_line = format_command_line(&self.program, args);
        debug!(command = %command_line, workdir = %workdir.display(), "Running git command");

        let output = Command::new(&self.program)
            .args(args)
            .envs(env.iter().copied())
            .current_dir(workdir)
            .output()
            .map_err(|e| CommandError {
                command: command_line.clone(),
                status: None,
                stderr: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            warn!(command = %command_line, stderr = %stderr.trim(), "Git command failed");
            return Err(CommandError {
                command: command_line,
                status: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Joins a program and its arguments for logs and error messages.
pub(crate) fn format_command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.contains(char::is_whitespace) {
            line.push_str(&format!("{arg:?}"));
        } else {
            line.push_str(arg);
        }
    }
    line
}
