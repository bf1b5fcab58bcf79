//! Shared display formatting for CLI commands.

use crate::engine::Outcome;
use crate::git::{Commit, CommitHistory};

/// One history row: short hash, decorations, subject, author and relative date.
pub(crate) fn format_commit_line(commit: &Commit) -> String {
    let refs = if commit.refs.is_empty() {
        String::new()
    } else {
        format!("({}) ", commit.refs.join(", "))
    };
    format!(
        "{} {refs}{} ({}, {})",
        commit.short_hash(),
        commit.message,
        commit.author,
        commit.date
    )
}

/// Renders a history listing, or a notice when there is nothing to show.
pub(crate) fn format_history(history: &CommitHistory, branch: &str) -> String {
    if history.is_empty() {
        return "No commits available (not a repository, or no history yet)".to_string();
    }

    let mut lines = vec![format!("On {branch}:")];
    lines.extend(
        history
            .iter()
            .map(|commit| format!("  {}", format_commit_line(commit))),
    );
    lines.join("\n")
}

/// Success line followed by one line per warning.
pub(crate) fn format_outcome(outcome: &Outcome) -> String {
    let mut lines = vec![format!("\u{2705} {}", outcome.summary)];
    lines.extend(
        outcome
            .warnings
            .iter()
            .map(|w| format!("\u{26a0}\u{fe0f}  {w}")),
    );
    lines.join("\n")
}

/// Splits an editor command string into the executable and its arguments.
///
/// Handles editors specified with arguments, e.g. `"code --wait"` becomes
/// `("code", vec!["--wait"])`.
pub(crate) fn parse_editor_command(editor: &str) -> (&str, Vec<&str>) {
    let mut parts = editor.split_whitespace();
    let cmd = parts.next().unwrap_or(editor);
    let args: Vec<&str> = parts.collect();
    (cmd, args)
}
