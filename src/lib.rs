//! # git-histedit
//!
//! Rewrites recent commit history through the `git` command line: rename the
//! tip commit, or squash a contiguous run of commits whether or not it
//! includes the tip.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use git_histedit::engine::Engine;
//! use git_histedit::prompt::AcceptDefault;
//! use git_histedit::utils::Settings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::open(Path::new("."), Settings::default())?;
//! let history = engine.history(Some(3));
//! let hashes: Vec<&str> = history.iter().map(|c| c.hash.as_str()).take(2).collect();
//! let outcome = engine.squash(&hashes, &mut AcceptDefault)?;
//! println!("{}", outcome.summary);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod engine;
pub mod error;
pub mod git;
pub mod prompt;
pub mod utils;

pub use crate::cli::Cli;
pub use crate::engine::{Engine, EngineEvent, Outcome, Request, Response};
pub use crate::error::{HisteditError, ValidationError};

/// The current version of git-histedit.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
