//! Maps selected hashes onto history and enforces adjacency.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::git::commit::{short_hash, Commit, CommitHistory};

static HASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{4,40}$").unwrap());

/// A validated selection: consecutive commits of one history snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContiguousRun<'a> {
    start: usize,
    commits: &'a [Commit],
}

impl<'a> ContiguousRun<'a> {
    /// History index of the newest selected commit.
    pub fn start(&self) -> usize {
        self.start
    }

    /// History index of the oldest selected commit.
    pub fn end(&self) -> usize {
        self.start + self.commits.len() - 1
    }

    /// Selected commits, newest first.
    pub fn commits(&self) -> &'a [Commit] {
        self.commits
    }

    /// Number of selected commits.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Always false; a run holds at least one commit.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// The most recent selected commit.
    pub fn newest(&self) -> &'a Commit {
        &self.commits[0]
    }

    /// The oldest selected commit.
    pub fn oldest(&self) -> &'a Commit {
        &self.commits[self.commits.len() - 1]
    }

    /// Whether `hash` is one of the selected commits.
    pub fn contains(&self, hash: &str) -> bool {
        self.commits.iter().any(|c| c.hash == hash)
    }
}

/// Trims and lowercases a user-supplied hash or hash prefix.
pub(crate) fn normalize_hash(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if !HASH_PATTERN.is_match(trimmed) {
        return Err(ValidationError::InvalidHash(trimmed.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Validates `selection` against `history`.
///
/// Input order is ignored and duplicates collapse; the result is ordered by
/// history position. Hashes may be unambiguous prefixes of at least four hex
/// digits. Anything missing from the snapshot is treated as a stale selection.
pub fn validate_selection<'a, S: AsRef<str>>(
    history: &'a CommitHistory,
    selection: &[S],
) -> Result<ContiguousRun<'a>, ValidationError> {
    let mut positions = BTreeSet::new();

    for raw in selection {
        let wanted = normalize_hash(raw.as_ref())?;

        let mut matches = history
            .iter()
            .enumerate()
            .filter(|(_, c)| c.matches(&wanted))
            .map(|(i, _)| i);

        let index = matches
            .next()
            .ok_or_else(|| ValidationError::StaleSelection(wanted.clone()))?;
        if matches.next().is_some() {
            return Err(ValidationError::AmbiguousHash(wanted));
        }
        positions.insert(index);
    }

    let (Some(&first), Some(&last)) = (positions.first(), positions.last()) else {
        return Err(ValidationError::InsufficientSelection {
            count: 0,
            required: 1,
        });
    };

    let commits = history.commits();
    let ordered: Vec<usize> = positions.into_iter().collect();
    for pair in ordered.windows(2) {
        if pair[1] != pair[0] + 1 {
            return Err(ValidationError::NonConsecutive {
                after: short_hash(&commits[pair[0]].hash).to_string(),
                before: short_hash(&commits[pair[1]].hash).to_string(),
            });
        }
    }

    Ok(ContiguousRun {
        start: first,
        commits: &commits[first..=last],
    })
}
