//! Message input collaborator.
//!
//! The engines never talk to a terminal or an editor themselves; they ask a
//! [`MessagePrompt`] for text and treat `None` as the user walking away.

use std::io;

/// What the engine is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    /// Short title, e.g. "Squash 3 commits".
    pub title: String,
    /// One-line description of what the message is for.
    pub prompt: String,
    /// Pre-filled message.
    pub default: String,
}

/// Supplies commit messages.
pub trait MessagePrompt {
    /// Returns the edited message, or `None` when the user cancelled.
    fn request(&mut self, request: &MessageRequest) -> io::Result<Option<String>>;
}

impl<F> MessagePrompt for F
where
    F: FnMut(&MessageRequest) -> io::Result<Option<String>>,
{
    fn request(&mut self, request: &MessageRequest) -> io::Result<Option<String>> {
        self(request)
    }
}

/// Answers every request with the same message.
#[derive(Debug, Clone)]
pub struct FixedMessage(pub String);

impl MessagePrompt for FixedMessage {
    fn request(&mut self, _request: &MessageRequest) -> io::Result<Option<String>> {
        Ok(Some(self.0.clone()))
    }
}

/// Accepts whatever default the engine proposes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefault;

impl MessagePrompt for AcceptDefault {
    fn request(&mut self, request: &MessageRequest) -> io::Result<Option<String>> {
        Ok(Some(request.default.clone()))
    }
}

/// Normalizes a prompt answer: trims it and maps blank text to `None`.
pub(crate) fn non_blank(answer: Option<String>) -> Option<String> {
    answer
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}
