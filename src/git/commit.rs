//! Commit snapshots as read from `git log`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// `git log` format producing one tab-separated record per commit.
///
/// The subject comes last so a stray tab inside it cannot shift the other
/// fields.
pub(crate) const LOG_FORMAT: &str = "--pretty=format:%H%x09%d%x09%an%x09%ar%x09%aI%x09%s";

/// A commit as it appeared when the history was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash.
    pub hash: String,
    /// Decorations attached at read time (`HEAD -> main`, `origin/main`, `tag: v1`).
    pub refs: Vec<String>,
    /// Subject line.
    pub message: String,
    /// Author name.
    pub author: String,
    /// Author date relative to now, as git renders it.
    pub date: String,
    /// Author date.
    pub timestamp: DateTime<FixedOffset>,
}

impl Commit {
    /// Parses one record produced with [`LOG_FORMAT`].
    pub(crate) fn parse_log_line(line: &str) -> Option<Self> {
        let mut fields = line.splitn(6, '\t');
        let hash = fields.next()?.trim();
        let decoration = fields.next()?;
        let author = fields.next()?.trim();
        let date = fields.next()?.trim();
        let timestamp = DateTime::parse_from_rfc3339(fields.next()?.trim()).ok()?;
        let message = fields.next()?.trim();

        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        Some(Self {
            hash: hash.to_string(),
            refs: parse_decoration(decoration),
            message: message.to_string(),
            author: author.to_string(),
            date: date.to_string(),
            timestamp,
        })
    }

    /// Abbreviated hash for display.
    pub fn short_hash(&self) -> &str {
        short_hash(&self.hash)
    }

    /// Whether `prefix` identifies this commit.
    pub fn matches(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.hash.starts_with(&prefix.to_ascii_lowercase())
    }
}

/// Truncates a hash to [`SHORT_HASH_LEN`](crate::git::SHORT_HASH_LEN) characters.
pub fn short_hash(hash: &str) -> &str {
    let len = crate::git::SHORT_HASH_LEN;
    if hash.len() > len && hash.is_char_boundary(len) {
        &hash[..len]
    } else {
        hash
    }
}

/// Splits git's `%d` output, e.g. ` (HEAD -> main, origin/main)`.
fn parse_decoration(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed);

    inner
        .split(", ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Commits in reverse-chronological order; index 0 is the tip.
///
/// A snapshot: after any rewrite it is read again rather than patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitHistory {
    commits: Vec<Commit>,
}

impl CommitHistory {
    /// Wraps commits already in reverse-chronological order.
    pub fn new(commits: Vec<Commit>) -> Self {
        Self { commits }
    }

    /// Parses the full stdout of `git log` run with [`LOG_FORMAT`].
    pub(crate) fn parse(stdout: &str) -> Self {
        let commits = stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let parsed = Commit::parse_log_line(line);
                if parsed.is_none() {
                    tracing::debug!(line, "Skipping unparseable log line");
                }
                parsed
            })
            .collect();
        Self { commits }
    }

    /// The commit at the head of the branch, if any.
    pub fn tip(&self) -> Option<&Commit> {
        self.commits.first()
    }

    /// Position of the commit identified by `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.commits.iter().position(|c| c.matches(prefix))
    }

    /// All commits, newest first.
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Number of commits in the snapshot.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the snapshot holds no commits.
    ///
    /// An empty history means "unavailable", not "repository has no commits".
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Iterates newest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Commit> {
        self.commits.iter()
    }
}

impl<'a> IntoIterator for &'a CommitHistory {
    type Item = &'a Commit;
    type IntoIter = std::slice::Iter<'a, Commit>;

    fn into_iter(self) -> Self::IntoIter {
        self.commits.iter()
    }
}
