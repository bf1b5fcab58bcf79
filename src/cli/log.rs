//! Log command — prints recent history.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use super::formatting::format_history;
use crate::engine::Engine;

/// Output formats for `log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per commit.
    Text,
    /// YAML sequence of commits.
    Yaml,
    /// JSON array of commits.
    Json,
}

/// Log command options.
#[derive(Parser)]
pub struct LogCommand {
    /// Number of commits to list (defaults to the configured history limit).
    #[arg(short = 'n', long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl LogCommand {
    /// Executes the log command.
    pub fn execute(self, engine: &Engine) -> Result<()> {
        let history = engine.history(self.limit);

        let output = match self.format {
            OutputFormat::Text => format_history(&history, &engine.current_branch()),
            OutputFormat::Yaml => {
                serde_yaml::to_string(&history).context("Failed to serialize history as YAML")?
            }
            OutputFormat::Json => serde_json::to_string_pretty(&history)
                .context("Failed to serialize history as JSON")?,
        };
        println!("{}", output.trim_end());

        Ok(())
    }
}
