//! Settings and configuration utilities.
//!
//! Settings are read from $HOME/.git-histedit/settings.json. Environment
//! variables take precedence over the file, and a missing file means defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::git::history::DEFAULT_HISTORY_LIMIT;
use crate::git::rebase::RebaseFailurePolicy;

/// Default number of commits scanned to validate a squash selection.
pub const DEFAULT_SCAN_LIMIT: usize = 200;

/// Settings loaded from $HOME/.git-histedit/settings.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Commits listed by default.
    pub history_limit: usize,
    /// Commits scanned when validating a squash selection.
    pub scan_limit: usize,
    /// What to do with an interrupted squash rebase.
    pub on_rebase_failure: RebaseFailurePolicy,
    /// Git executable.
    pub git_program: String,
    /// Editor for commit messages; stdin prompting when unset.
    pub editor: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            scan_limit: DEFAULT_SCAN_LIMIT,
            on_rebase_failure: RebaseFailurePolicy::default(),
            git_program: "git".to_string(),
            editor: None,
        }
    }
}

impl Settings {
    /// Loads settings from the default location, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let settings = match Self::get_settings_path() {
            Ok(path) => Self::load_from_path(&path)?,
            Err(_) => Self::default(),
        };
        settings.with_overrides(|key| env::var(key).ok())
    }

    /// Loads settings from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist, return default settings
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".git-histedit").join("settings.json"))
    }

    /// Applies overrides from `lookup`, normally the process environment.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("HISTEDIT_HISTORY_LIMIT") {
            self.history_limit = parse_limit("HISTEDIT_HISTORY_LIMIT", &value)?;
        }
        if let Some(value) = lookup("HISTEDIT_SCAN_LIMIT") {
            self.scan_limit = parse_limit("HISTEDIT_SCAN_LIMIT", &value)?;
        }
        if let Some(value) = lookup("HISTEDIT_ON_REBASE_FAILURE") {
            self.on_rebase_failure = value
                .parse()
                .map_err(|e: String| anyhow::anyhow!("HISTEDIT_ON_REBASE_FAILURE: {e}"))?;
        }
        if let Some(value) = lookup("HISTEDIT_GIT") {
            self.git_program = value;
        }
        if let Some(editor) = lookup("HISTEDIT_EDITOR").or_else(|| lookup("EDITOR")) {
            if !editor.trim().is_empty() {
                self.editor = Some(editor);
            }
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.history_limit == 0 || self.scan_limit == 0 {
            bail!("historyLimit and scanLimit must be positive");
        }
        if self.git_program.trim().is_empty() {
            bail!("gitProgram cannot be empty");
        }
        Ok(())
    }
}

fn parse_limit(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .with_context(|| format!("{key} must be a positive integer, got '{value}'"))
}
